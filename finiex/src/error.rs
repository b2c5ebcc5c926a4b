use finiex_core::CoreError;
use finiex_data::DataError;
use finiex_execution::ExecutionError;
use finiex_strategy::StrategyError;
use thiserror::Error;

/// Top-level aggregating error (§7.1). Every lower-level crate error
/// folds in via `#[from]`; `Cancelled`/`Timeout` cover the *Cancellation*
/// taxonomy entry that no lower crate owns.
#[derive(Debug, Error)]
pub enum FiniexError {
    #[error("core: {0}")]
    Core(#[from] CoreError),

    #[error("data: {0}")]
    Data(#[from] DataError),

    #[error("execution: {0}")]
    Execution(#[from] ExecutionError),

    #[error("strategy: {0}")]
    Strategy(#[from] StrategyError),

    #[error("scenario cancelled: {0}")]
    Cancelled(String),

    #[error("scenario timed out after {0}ms")]
    Timeout(u64),

    #[error("worker panicked: {0}")]
    WorkerPanic(String),
}

impl FiniexError {
    /// A short machine-readable tag for `ProcessResult::error_type` (§6).
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Core(_) => "core",
            Self::Data(_) => "data",
            Self::Execution(_) => "execution",
            Self::Strategy(_) => "strategy",
            Self::Cancelled(_) => "cancelled",
            Self::Timeout(_) => "timeout",
            Self::WorkerPanic(_) => "worker_panic",
        }
    }
}
