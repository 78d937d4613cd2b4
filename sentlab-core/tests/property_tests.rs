//! Property tests for engine invariants.
//!
//! Uses proptest to verify, over random bar sequences and parameters:
//! 1. Equity identity — final equity is cash plus position at the last close
//! 2. Single active order — the event log never shows two live orders
//! 3. Solvency — cash never goes negative after any fill
//! 4. Fill timing — every market-on-open fill lands one bar after submission
//! 5. Replay — re-applying the fills reproduces the final account
//! 6. Determinism — the same inputs produce the same event log

use chrono::NaiveDate;
use proptest::prelude::*;
use sentlab_core::data::BarFeed;
use sentlab_core::domain::{BrokerEvent, OrderKind, RawBar};
use sentlab_core::engine::{replay, CommissionModel, EndOfRunPolicy, Engine, RunOutcome};
use sentlab_core::strategy::{SentimentParams, SentimentStrategy};

#[derive(Debug, Clone)]
struct Scenario {
    bars: Vec<(f64, f64, f64)>,
    initial_cash: f64,
    params: SentimentParams,
    commission: CommissionModel,
    policy: EndOfRunPolicy,
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_bar() -> impl Strategy<Value = (f64, f64, f64)> {
    (10.0..200.0_f64, -0.05..0.05_f64, -1.0..=1.0_f64).prop_map(|(open, drift, sentiment)| {
        let open = (open * 100.0).round() / 100.0;
        let close = (open * (1.0 + drift) * 100.0).round() / 100.0;
        (open, close, sentiment)
    })
}

fn arb_commission() -> impl Strategy<Value = CommissionModel> {
    prop_oneof![
        Just(CommissionModel::None),
        (0.0..0.05_f64).prop_map(CommissionModel::percentage),
        // Up to far more than a cheap bar's sale value.
        (0.0..500.0_f64).prop_map(CommissionModel::per_trade),
    ]
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    (
        prop::collection::vec(arb_bar(), 1..60),
        1_000.0..200_000.0_f64,
        -0.5..0.9_f64,
        1usize..6,
        1u64..500,
        arb_commission(),
        prop::bool::ANY,
    )
        .prop_map(
            |(bars, initial_cash, buy_threshold, exit_bars, trade_size, commission, liquidate)| Scenario {
                bars,
                initial_cash,
                params: SentimentParams {
                    buy_threshold,
                    exit_bars,
                    trade_size,
                },
                commission,
                policy: if liquidate {
                    EndOfRunPolicy::Liquidate
                } else {
                    EndOfRunPolicy::Hold
                },
            },
        )
}

fn feed(bars: &[(f64, f64, f64)]) -> BarFeed {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let raw = bars
        .iter()
        .enumerate()
        .map(|(i, &(open, close, sentiment))| {
            RawBar::ohlc(
                start + chrono::Duration::days(i as i64),
                open,
                open.max(close),
                open.min(close),
                close,
            )
            .with_sentiment(sentiment)
        })
        .collect();
    BarFeed::from_raw(raw).unwrap()
}

fn run(scenario: &Scenario) -> RunOutcome {
    let strategy = SentimentStrategy::new(scenario.params);
    Engine::new(
        feed(&scenario.bars),
        scenario.initial_cash,
        scenario.commission,
        &strategy,
    )
    .with_end_of_run(scenario.policy)
    .run()
    .unwrap()
}

proptest! {
    #[test]
    fn equity_identity_holds(scenario in arb_scenario()) {
        let outcome = run(&scenario);
        let last_close = outcome.last_close.unwrap();
        let expected = outcome.final_cash + outcome.final_position.size as f64 * last_close;
        prop_assert_eq!(outcome.final_equity, expected);
        prop_assert_eq!(outcome.equity_curve.last().unwrap().equity, expected);
        prop_assert_eq!(outcome.equity_curve.len(), scenario.bars.len());
    }

    #[test]
    fn at_most_one_active_order(scenario in arb_scenario()) {
        let outcome = run(&scenario);
        let mut active = 0usize;
        for event in &outcome.events {
            match event {
                BrokerEvent::OrderSubmitted { .. } => active += 1,
                BrokerEvent::OrderFilled { .. }
                | BrokerEvent::OrderRejected { .. }
                | BrokerEvent::OrderCanceled { .. } => {
                    prop_assert!(active > 0, "terminal event without a live order");
                    active -= 1;
                }
                BrokerEvent::TradeClosed { .. } => {}
            }
            prop_assert!(active <= 1);
        }
    }

    #[test]
    fn cash_never_negative(scenario in arb_scenario()) {
        let outcome = run(&scenario);
        for k in 0..outcome.events.len() {
            if outcome.events[k].is_fill() {
                let account = replay(scenario.initial_cash, &outcome.events[..=k]);
                prop_assert!(account.cash() >= 0.0, "cash went negative: {}", account.cash());
            }
        }
        prop_assert!(outcome.final_cash >= 0.0);
    }

    #[test]
    fn moo_fills_one_bar_after_submission(scenario in arb_scenario()) {
        let outcome = run(&scenario);
        for event in &outcome.events {
            if let BrokerEvent::OrderFilled { order, .. } = event {
                if order.kind == OrderKind::MarketOnOpen {
                    prop_assert_eq!(order.resolved_at_bar, Some(order.submitted_at_bar + 1));
                }
            }
        }
    }

    #[test]
    fn replay_reproduces_final_account(scenario in arb_scenario()) {
        let outcome = run(&scenario);
        let account = replay(scenario.initial_cash, &outcome.events);
        prop_assert_eq!(account.cash(), outcome.final_cash);
        prop_assert_eq!(*account.position(), outcome.final_position);
        prop_assert_eq!(account.equity(outcome.last_close.unwrap()), outcome.final_equity);
    }

    #[test]
    fn runs_are_deterministic(scenario in arb_scenario()) {
        let first = run(&scenario);
        let second = run(&scenario);
        prop_assert_eq!(first.events, second.events);
        prop_assert_eq!(first.equity_curve, second.equity_curve);
    }

    #[test]
    fn position_is_zero_or_trade_size(scenario in arb_scenario()) {
        let outcome = run(&scenario);
        let size = outcome.final_position.size;
        prop_assert!(size == 0 || size == scenario.params.trade_size);
    }
}
