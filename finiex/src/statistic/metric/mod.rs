/// Drawdown, max drawdown and mean drawdown generators (§4.8.5).
pub mod drawdown;

/// Gross-profit-over-gross-loss performance metric.
pub mod profit_factor;

/// Percentage-change-over-time performance metric.
pub mod rate_of_return;

/// Per-trade Sharpe/Sortino/Calmar ratios, scaled to daily/annual via `trades_per_day`.
pub mod ratio;

/// Fraction of closed positions that were profitable.
pub mod win_rate;
