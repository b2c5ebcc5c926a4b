use smol_str::SmolStr;
use thiserror::Error;

/// Index/file/config parsing failures — the *Data* and *Validation*
/// categories of §7.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no tick files found for symbol {0}")]
    NoTickFiles(SmolStr),

    #[error("no bar file found for symbol {symbol} timeframe {timeframe}")]
    NoBarFile { symbol: SmolStr, timeframe: SmolStr },

    #[error("insufficient warmup for {symbol} {timeframe}: requested {requested}, found {found}")]
    InsufficientWarmup {
        symbol: SmolStr,
        timeframe: SmolStr,
        requested: usize,
        found: usize,
    },

    #[error("malformed config at {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed config: {0}")]
    Validation(String),

    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Execution(#[from] finiex_execution::ExecutionError),
}
