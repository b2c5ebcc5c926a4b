use smol_str::SmolStr;
use thiserror::Error;

/// Errors raised when constructing or mutating core data model types.
///
/// These represent malformed tick/bar invariants (§3 Data Model) — never
/// transport, parsing, or strategy failures, which belong to the crates
/// built on top of this one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("tick for {symbol}: bid must be > 0, got {bid}")]
    NonPositiveBid { symbol: SmolStr, bid: String },

    #[error("tick for {symbol}: ask ({ask}) must be >= bid ({bid})")]
    AskBelowBid {
        symbol: SmolStr,
        bid: String,
        ask: String,
    },

    #[error("tick for {symbol} at {timestamp} is out of order (previous: {previous})")]
    NonMonotonicTick {
        symbol: SmolStr,
        timestamp: String,
        previous: String,
    },

    #[error("unknown timeframe: {0}")]
    UnknownTimeframe(SmolStr),
}
