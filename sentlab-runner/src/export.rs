//! Artifact export — CSV and JSON files for the reporting side.
//!
//! `save_artifacts` writes one directory per run, named by its run ID:
//! - `equity.csv`: date, equity, return (blank on the first row)
//! - `events.json`: the full broker event log
//! - `trades.csv`: one row per closed trade
//! - `summary.json`: config, performance summary and end-of-run flags
//!
//! `summary.json` carries a `schema_version`; unknown versions are rejected
//! on load.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use sentlab_core::domain::{Order, Position, Trade};
use sentlab_core::engine::ReturnSample;

use crate::config::{RunConfig, RunId};
use crate::metrics::PerformanceSummary;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

/// Paths written by `save_artifacts`.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub equity_csv: PathBuf,
    pub events_json: PathBuf,
    pub trades_csv: PathBuf,
    pub summary_json: PathBuf,
}

/// Contents of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummaryFile {
    pub schema_version: u32,
    pub run_id: RunId,
    pub strategy: String,
    pub config: RunConfig,
    pub summary: PerformanceSummary,
    pub bar_count: usize,
    pub final_cash: f64,
    pub final_position: Position,
    pub pending_order_at_end: Option<Order>,
    pub open_position_at_end: bool,
}

impl RunSummaryFile {
    pub fn from_result(result: &BacktestResult) -> Self {
        let outcome = &result.outcome;
        Self {
            schema_version: SCHEMA_VERSION,
            run_id: result.run_id.clone(),
            strategy: outcome.strategy_name.clone(),
            config: result.config.clone(),
            summary: result.summary.clone(),
            bar_count: outcome.bar_count,
            final_cash: outcome.final_cash,
            final_position: outcome.final_position,
            pending_order_at_end: outcome.pending_order_at_end.clone(),
            open_position_at_end: outcome.open_position_at_end,
        }
    }
}

pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<ArtifactPaths> {
    let run_dir = output_dir.join(&result.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let paths = ArtifactPaths {
        equity_csv: run_dir.join("equity.csv"),
        events_json: run_dir.join("events.json"),
        trades_csv: run_dir.join("trades.csv"),
        summary_json: run_dir.join("summary.json"),
        run_dir,
    };

    write_file(&paths.equity_csv, &export_equity_csv(&result.outcome.returns)?)?;
    let events = serde_json::to_string_pretty(&result.outcome.events)
        .context("failed to serialize event log")?;
    write_file(&paths.events_json, &events)?;
    write_file(&paths.trades_csv, &export_trades_csv(&result.outcome.trades)?)?;
    let summary = serde_json::to_string_pretty(&RunSummaryFile::from_result(result))
        .context("failed to serialize run summary")?;
    write_file(&paths.summary_json, &summary)?;

    info!(dir = %paths.run_dir.display(), "saved run artifacts");
    Ok(paths)
}

/// Read back a `summary.json`, rejecting newer schema versions.
pub fn load_summary(path: &Path) -> Result<RunSummaryFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: RunSummaryFile =
        serde_json::from_str(&text).context("failed to deserialize run summary")?;
    if file.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            file.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(file)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: date, equity, return. The return cell is blank where undefined.
pub fn export_equity_csv(returns: &[ReturnSample]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "return"])?;
    for row in returns {
        wtr.write_record([
            row.date.to_string(),
            format!("{:.4}", row.equity),
            row.ret.map(|r| format!("{r:.8}")).unwrap_or_default(),
        ])?;
    }
    into_string(wtr)
}

/// Columns: entry_bar, entry_date, entry_price, exit_bar, exit_date,
/// exit_price, size, gross_pnl, commission, net_pnl, return_pct, bars_held
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_bar",
        "entry_date",
        "entry_price",
        "exit_bar",
        "exit_date",
        "exit_price",
        "size",
        "gross_pnl",
        "commission",
        "net_pnl",
        "return_pct",
        "bars_held",
    ])?;
    for t in trades {
        wtr.write_record([
            t.opened_at_bar.to_string(),
            t.entry_date.to_string(),
            format!("{:.6}", t.entry_price),
            t.closed_at_bar.to_string(),
            t.exit_date.to_string(),
            format!("{:.6}", t.exit_price),
            t.size.to_string(),
            format!("{:.6}", t.gross_pnl),
            format!("{:.6}", t.commission),
            format!("{:.6}", t.net_pnl),
            format!("{:.6}", t.return_pct()),
            t.bars_held().to_string(),
        ])?;
    }
    into_string(wtr)
}

fn into_string(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
