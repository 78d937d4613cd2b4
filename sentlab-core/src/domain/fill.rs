use crate::domain::ids::OrderId;
use crate::domain::order::OrderSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Execution record for a completed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub bar_index: usize,
    pub date: NaiveDate,
    pub side: OrderSide,
    pub size: u64,
    pub price: f64,
    pub commission: f64,
}

impl Fill {
    /// Price × size, before commission.
    pub fn gross_amount(&self) -> f64 {
        self.price * self.size as f64
    }

    /// Signed cash impact: buys pay gross + commission, sells receive gross − commission.
    pub fn cash_delta(&self) -> f64 {
        match self.side {
            OrderSide::Buy => -(self.gross_amount() + self.commission),
            OrderSide::Sell => self.gross_amount() - self.commission,
        }
    }
}
