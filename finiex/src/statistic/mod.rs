/// Statistical algorithms for analysing datasets.
pub mod algorithm;

/// Shared error type for incomplete statistic builders.
pub mod error;

/// Financial metrics and the means to calculate them over different
/// [`TimeIntervals`](time::TimeInterval).
pub mod metric;

/// Statistical summaries for financial datasets: `PnLReturnSummary`,
/// `DrawdownSummary`, `PortfolioStats`.
pub mod summary;

/// TimeInterval definitions used for financial calculations.
///
/// For example, `Annual365`, `Annual252`, `Daily`, etc.
pub mod time;
