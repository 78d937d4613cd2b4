//! Rebuild the final account from a recorded event log.
//!
//! Replaying the `OrderFilled` events of a run against a fresh account must
//! reproduce the run's final cash and position exactly.

use crate::domain::{Account, BrokerEvent, Fill};

pub fn replay(initial_cash: f64, events: &[BrokerEvent]) -> Account {
    let mut account = Account::new(initial_cash);
    for event in events {
        if let BrokerEvent::OrderFilled {
            order,
            date,
            price,
            commission,
        } = event
        {
            let fill = Fill {
                order_id: order.id,
                bar_index: order.resolved_at_bar.unwrap_or(order.submitted_at_bar),
                date: *date,
                side: order.side,
                size: order.size,
                price: *price,
                commission: *commission,
            };
            account.apply_fill(&fill);
        }
    }
    account
}
