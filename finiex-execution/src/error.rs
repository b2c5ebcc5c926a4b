use thiserror::Error;

/// Order/broker invariant violations.
///
/// Rejections (insufficient margin, invalid price/lots, stress-test
/// injection) are *not* represented here: a rejection is an expected,
/// data-modeled outcome (`Order::rejection_reason`), not a failure of the
/// call, so [`ExecutionError`] is reserved for genuine invariant breaches
/// (malformed broker spec, double-fill of a position, unknown order id).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("unknown order id: {0}")]
    UnknownOrder(u64),

    #[error("unknown position id: {0}")]
    UnknownPosition(u64),

    #[error("position {0} already closed")]
    PositionAlreadyClosed(u64),

    #[error("invalid broker spec: {0}")]
    InvalidBrokerSpec(String),

    #[error("one-position-per-symbol violated for {0}")]
    DuplicateOpenPosition(smol_str::SmolStr),
}
