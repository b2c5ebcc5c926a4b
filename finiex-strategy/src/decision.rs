use crate::worker::WorkerResult;
use chrono::{DateTime, Utc};
use finiex_execution::{Direction, OrderResult, OrderType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum Action {
    Buy,
    Sell,
    Flat,
}

/// Pure output of a decision logic's per-tick evaluation (§3): an intent,
/// not yet an order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Decision {
    pub action: Action,
    pub confidence: f64,
    pub reason: SmolStr,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// The narrow API a [`DecisionLogic`] uses to submit orders (§4.9's
/// `DecisionTradingAPI`). Implemented by the scenario process runner on
/// top of a [`finiex_execution::BrokerSimulator`]; kept as a trait here so
/// `finiex-strategy` never depends on the concurrency/runner crate.
pub trait TradingApi {
    fn open_order(
        &mut self,
        symbol: &str,
        order_type: OrderType,
        direction: Direction,
        lots: Decimal,
        requested_price: Option<Decimal>,
        comment: &str,
    ) -> OrderResult;

    fn has_pending_order(&self, symbol: &str, direction: Direction) -> bool;

    fn has_open_position(&self, symbol: &str) -> Option<Direction>;

    /// Close the open position on `symbol` immediately, at the current
    /// book price, bypassing `open_order`'s PENDING/latency/margin-
    /// reservation pipeline entirely (§4.8.2: "close orders produce one
    /// EXECUTED record", no independent PENDING). Returns `None` if
    /// `symbol` has no open position.
    fn close_position(&mut self, symbol: &str, comment: &str) -> Option<OrderResult>;

    fn free_margin(&self) -> Decimal;
}

/// Strategy contract mapping worker results to an action intent and
/// submitting orders through a [`TradingApi`] (§4.7, Glossary).
pub trait DecisionLogic: Send {
    /// Order types this decision logic may ask the broker to execute; the
    /// process runner rejects scenarios whose broker doesn't support
    /// them all (§4.9).
    fn required_order_types(&self) -> HashSet<OrderType>;

    fn compute(
        &mut self,
        symbol: &str,
        price: Decimal,
        timestamp: DateTime<Utc>,
        worker_results: &HashMap<SmolStr, WorkerResult>,
    ) -> Decision;

    /// Act on `decision`, optionally submitting orders through `api`.
    fn execute(&mut self, decision: &Decision, symbol: &str, api: &mut dyn TradingApi) -> Option<OrderResult>;
}
