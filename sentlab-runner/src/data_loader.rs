//! CSV loading — turns already-downloaded files into `RawBar` input.
//!
//! Two inputs are supported:
//! - a daily price file (`Date,Open,High,Low,Close,Adj Close,Volume`, with an
//!   optional sentiment column),
//! - a scored-headline file (`date,score`, one row per headline, any number
//!   of rows per day).
//!
//! Headline scores are averaged per calendar day and left-joined onto the
//! price rows; days without news get a score of 0.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info};

use sentlab_core::data::MalformedInputError;
use sentlab_core::domain::RawBar;

/// Column names accepted for the per-bar sentiment value.
const SENTIMENT_COLUMNS: [&str; 3] = ["sentiment", "finbert_sentiment_score", "score"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("malformed input: {0}")]
    Malformed(#[from] MalformedInputError),
}

/// One scored headline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentObservation {
    pub date: NaiveDate,
    pub score: f64,
}

// ─── Price file ─────────────────────────────────────────────────────

pub fn load_price_csv(path: &Path) -> Result<Vec<RawBar>, LoadError> {
    let bars = read_price_csv(open(path)?)?;
    info!(path = %path.display(), bars = bars.len(), "loaded price file");
    Ok(bars)
}

/// Parse a price CSV. Empty cells become `None` and are reported later by
/// the bar feed; cells that are present but unparseable fail here.
pub fn read_price_csv<R: Read>(reader: R) -> Result<Vec<RawBar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_col = require_column(&headers, "date")?;
    let open_col = require_column(&headers, "open")?;
    let high_col = require_column(&headers, "high")?;
    let low_col = require_column(&headers, "low")?;
    let close_col = require_column(&headers, "close")?;
    let volume_col = find_column(&headers, "volume");
    let sentiment_col = SENTIMENT_COLUMNS
        .iter()
        .find_map(|name| find_column(&headers, name));

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let cell = |col: usize| record.get(col).unwrap_or("");
        let number = |col: Option<usize>, field: &str| match col {
            Some(col) => parse_number(cell(col), row, field),
            None => Ok(None),
        };

        bars.push(RawBar {
            date: parse_date(cell(date_col), row)?,
            open: number(Some(open_col), "open")?,
            high: number(Some(high_col), "high")?,
            low: number(Some(low_col), "low")?,
            close: number(Some(close_col), "close")?,
            volume: number(volume_col, "volume")?,
            sentiment: number(sentiment_col, "sentiment")?,
        });
    }
    Ok(bars)
}

// ─── Headline file ──────────────────────────────────────────────────

pub fn load_sentiment_csv(path: &Path) -> Result<Vec<SentimentObservation>, LoadError> {
    let observations = read_sentiment_csv(open(path)?)?;
    info!(
        path = %path.display(),
        observations = observations.len(),
        "loaded sentiment file"
    );
    Ok(observations)
}

pub fn read_sentiment_csv<R: Read>(reader: R) -> Result<Vec<SentimentObservation>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let date_col = require_column(&headers, "date")?;
    let score_col = SENTIMENT_COLUMNS
        .iter()
        .find_map(|name| find_column(&headers, name))
        .ok_or(LoadError::MissingColumn("score"))?;

    let mut observations = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        let date = parse_date(record.get(date_col).unwrap_or(""), row)?;
        let raw = record.get(score_col).unwrap_or("");
        // Headlines the scorer skipped carry no information.
        let Some(score) = parse_number(raw, row, "score")? else {
            debug!(row, "skipping headline without a score");
            continue;
        };
        observations.push(SentimentObservation { date, score });
    }
    Ok(observations)
}

/// Mean score per calendar day.
pub fn daily_mean_sentiment(observations: &[SentimentObservation]) -> BTreeMap<NaiveDate, f64> {
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for obs in observations {
        let entry = sums.entry(obs.date).or_insert((0.0, 0));
        entry.0 += obs.score;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(date, (sum, count))| (date, sum / count as f64))
        .collect()
}

/// Left-join daily sentiment onto price bars. Bars on days without news get
/// 0; any sentiment already on the bar is replaced.
pub fn attach_sentiment(bars: Vec<RawBar>, daily: &BTreeMap<NaiveDate, f64>) -> Vec<RawBar> {
    let mut matched = 0usize;
    let joined: Vec<RawBar> = bars
        .into_iter()
        .map(|mut bar| {
            let score = daily.get(&bar.date).copied();
            matched += usize::from(score.is_some());
            bar.sentiment = Some(score.unwrap_or(0.0));
            bar
        })
        .collect();
    info!(
        bars = joined.len(),
        news_days = daily.len(),
        matched,
        "attached daily sentiment"
    );
    joined
}

// ─── Helpers ────────────────────────────────────────────────────────

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn require_column(headers: &csv::StringRecord, name: &'static str) -> Result<usize, LoadError> {
    find_column(headers, name).ok_or(LoadError::MissingColumn(name))
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time (`2021-03-04 15:30:00`
/// or `2021-03-04T15:30:00Z`); the time part is dropped.
fn parse_date(value: &str, row: usize) -> Result<NaiveDate, MalformedInputError> {
    let day = value
        .split(|c: char| c.is_whitespace() || c == 'T')
        .next()
        .unwrap_or("");
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|_| MalformedInputError::InvalidDate {
        row,
        value: value.to_string(),
    })
}

fn parse_number(value: &str, row: usize, field: &str) -> Result<Option<f64>, MalformedInputError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| MalformedInputError::NonNumeric {
            row,
            field: field.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const PRICES: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2021-01-04,100.0,101.0,99.0,100.5,100.5,1000
2021-01-05,101.0,102.0,100.0,101.5,101.5,1200
2021-01-06,102.0,103.0,101.0,102.5,102.5,
";

    #[test]
    fn reads_downloader_layout() {
        let bars = read_price_csv(PRICES.as_bytes()).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, d(2021, 1, 4));
        assert_eq!(bars[0].open, Some(100.0));
        assert_eq!(bars[1].close, Some(101.5));
        assert_eq!(bars[0].volume, Some(1000.0));
        assert_eq!(bars[2].volume, None);
        assert!(bars.iter().all(|b| b.sentiment.is_none()));
    }

    #[test]
    fn reads_sentiment_column() {
        let text = "Date,Open,High,Low,Close,Volume,finbert_sentiment_score\n\
                    2021-01-04,1,1,1,1,5,0.75\n";
        let bars = read_price_csv(text.as_bytes()).unwrap();
        assert_eq!(bars[0].sentiment, Some(0.75));
    }

    #[test]
    fn non_numeric_cell_reports_row() {
        let text = "Date,Open,High,Low,Close\n2021-01-04,1,1,1,1\n2021-01-05,abc,1,1,1\n";
        let err = read_price_csv(text.as_bytes()).unwrap_err();
        match err {
            LoadError::Malformed(MalformedInputError::NonNumeric { row, field, value }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "open");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_close_column() {
        let text = "Date,Open,High,Low\n2021-01-04,1,1,1\n";
        assert!(matches!(
            read_price_csv(text.as_bytes()),
            Err(LoadError::MissingColumn("close"))
        ));
    }

    #[test]
    fn datetime_cells_are_truncated_to_day() {
        assert_eq!(parse_date("2021-03-04 15:30:00", 1).unwrap(), d(2021, 3, 4));
        assert_eq!(parse_date("2021-03-04T15:30:00Z", 1).unwrap(), d(2021, 3, 4));
        assert!(parse_date("03/04/2021", 7).is_err());
    }

    #[test]
    fn daily_mean_groups_by_date() {
        let text = "date,score\n\
                    2021-01-04 09:00:00,0.9\n\
                    2021-01-04 15:00:00,0.5\n\
                    2021-01-06,-0.4\n\
                    2021-01-06,\n";
        let observations = read_sentiment_csv(text.as_bytes()).unwrap();
        assert_eq!(observations.len(), 3);

        let daily = daily_mean_sentiment(&observations);
        assert_eq!(daily.len(), 2);
        assert!((daily[&d(2021, 1, 4)] - 0.7).abs() < 1e-12);
        assert_eq!(daily[&d(2021, 1, 6)], -0.4);
    }

    #[test]
    fn attach_fills_missing_days_with_zero() {
        let bars = read_price_csv(PRICES.as_bytes()).unwrap();
        let mut daily = BTreeMap::new();
        daily.insert(d(2021, 1, 5), 0.8);
        daily.insert(d(2021, 1, 9), -0.3);

        let joined = attach_sentiment(bars, &daily);
        let scores: Vec<_> = joined.iter().map(|b| b.sentiment).collect();
        assert_eq!(scores, vec![Some(0.0), Some(0.8), Some(0.0)]);
    }
}
