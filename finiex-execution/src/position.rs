use crate::order::Direction;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// How a [`Position`] was closed, for bookkeeping in §4.8.3/§8.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum CloseReason {
    Signal,
    ForceClosed,
}

/// An open or closed position (§3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub position_id: u64,
    pub symbol: SmolStr,
    pub direction: Direction,
    pub lots: Decimal,
    pub open_price: Decimal,
    pub open_time: DateTime<Utc>,
    pub current_price: Decimal,
    pub unrealized_pnl: Decimal,
    pub swap: Decimal,
    pub commission: Decimal,
    pub close_price: Option<Decimal>,
    pub close_time: Option<DateTime<Utc>>,
    pub close_reason: Option<CloseReason>,
    pub realized_pnl: Option<Decimal>,
}

impl Position {
    pub fn is_closed(&self) -> bool {
        self.close_time.is_some()
    }

    /// Recompute `unrealized_pnl` from the latest mid-equivalent price,
    /// `pip_value` per lot, and accrued swap/commission (§4.8 step 1).
    pub fn mark_to_market(&mut self, current_price: Decimal, pip_value: Decimal) {
        self.current_price = current_price;
        self.unrealized_pnl = (current_price - self.open_price)
            * self.lots
            * pip_value
            * self.direction.sign()
            - self.swap
            - self.commission;
    }
}
