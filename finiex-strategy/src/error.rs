use smol_str::SmolStr;
use thiserror::Error;

/// Worker/decision failures — the *Runtime* category of §7 for this
/// stage. The worker coordinator treats any of these as fatal to the
/// scenario; they are never swallowed (§4.6).
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("worker {worker} failed: {message}")]
    WorkerFailed { worker: SmolStr, message: String },

    #[error("decision logic requires order type {0:?}, unsupported by broker")]
    UnsupportedOrderType(finiex_execution::OrderType),

    #[error("unknown worker type: {0}")]
    UnknownWorkerType(SmolStr),

    #[error("unknown decision logic type: {0}")]
    UnknownDecisionLogicType(SmolStr),
}
