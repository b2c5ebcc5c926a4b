use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }

    /// Sign used in P&L formulas: `+1` for BUY, `-1` for SELL (§4.8).
    pub fn sign(self) -> Decimal {
        match self {
            Direction::Buy => Decimal::ONE,
            Direction::Sell => -Decimal::ONE,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum OrderStatus {
    Pending,
    Executed,
    Rejected,
    Cancelled,
}

/// Why an order was rejected or cancelled, carried as data rather than as
/// an error (§7.1): a rejection is an expected broker-simulator outcome.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum RejectionReason {
    InvalidLots,
    InsufficientMargin,
    InvalidPrice,
    StressTestReject,
    TimedOut,
    UnfilledAtEnd,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectionReason::InvalidLots => "INVALID_LOTS",
            RejectionReason::InsufficientMargin => "INSUFFICIENT_MARGIN",
            RejectionReason::InvalidPrice => "INVALID_PRICE",
            RejectionReason::StressTestReject => "STRESS_TEST_REJECT",
            RejectionReason::TimedOut => "TIMED_OUT",
            RejectionReason::UnfilledAtEnd => "UNFILLED_AT_END",
        };
        write!(f, "{s}")
    }
}

/// An order as tracked by the broker simulator (§3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Order {
    pub order_id: u64,
    pub symbol: SmolStr,
    pub order_type: OrderType,
    pub direction: Direction,
    pub lots: Decimal,
    pub requested_price: Option<Decimal>,
    pub status: OrderStatus,
    pub executed_price: Option<Decimal>,
    pub rejection_reason: Option<RejectionReason>,
    pub comment: SmolStr,
    pub created_at: DateTime<Utc>,
    pub filled_at: Option<DateTime<Utc>>,
    /// Tick count since submission; used by the FIFO latency fill model
    /// (§4.8.2). Not part of the public wire contract beyond bookkeeping.
    pub(crate) ticks_since_submission: u64,
    /// Latency (in ticks) drawn at submission time from the broker's
    /// latency distribution; MARKET orders fill once this many ticks have
    /// elapsed.
    pub(crate) latency_ticks: u64,
}

impl Order {
    pub fn is_executed(&self) -> bool {
        self.status == OrderStatus::Executed
    }

    pub fn is_rejected(&self) -> bool {
        self.status == OrderStatus::Rejected
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// Outcome of [`crate::broker::BrokerSimulator::open_order`]: PENDING on
/// acceptance, or an immediate REJECTED with a reason (§4.8.1).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OrderResult {
    pub order_id: u64,
    pub status: OrderStatus,
    pub rejection_reason: Option<RejectionReason>,
}
