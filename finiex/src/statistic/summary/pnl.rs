use crate::statistic::algorithm::welford_online;
use finiex_execution::Position;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Running variance/std-dev of a stream of per-trade returns, updated via
/// Welford's recurrence relation (mirrors [`welford_online`], f64-native
/// since ratios are never re-serialized to Decimal).
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct ReturnDispersion {
    pub recurrence_relation_m: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl ReturnDispersion {
    fn update(&mut self, prev_mean: f64, new_mean: f64, next_value: f64, count: u64) {
        self.recurrence_relation_m += (next_value - prev_mean) * (next_value - new_mean);
        self.variance = match count {
            0 | 1 => 0.0,
            _ => self.recurrence_relation_m / (count - 1) as f64,
        };
        self.std_dev = self.variance.sqrt();
    }
}

/// One-pass count/mean/dispersion over a stream of per-trade returns.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct ReturnSummary {
    pub count: u64,
    pub mean: f64,
    pub dispersion: ReturnDispersion,
}

impl ReturnSummary {
    pub fn update(&mut self, next_value: f64) {
        self.count += 1;
        let prev_mean = self.mean;
        self.mean = welford_online::calculate_mean(self.mean, next_value, self.count as f64);
        self.dispersion.update(prev_mean, self.mean, next_value, self.count);
    }
}

/// Per-trade PnL return summary fed by closed [`Position`]s, consumed by
/// [`crate::statistic::metric::ratio`]'s Sharpe/Sortino/Calmar calculators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct PnLReturnSummary {
    pub trades_per_day: f64,
    pub total: ReturnSummary,
    pub losses: ReturnSummary,
}

impl PnLReturnSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one closed position's return into the summary. No-op for
    /// positions that are still open or carry no realized PnL.
    pub fn update(&mut self, position: &Position) {
        let Some(realized_pnl) = position.realized_pnl else {
            return;
        };

        let pnl_return = calculate_pnl_return(realized_pnl, position.open_price, position.lots);

        self.total.update(pnl_return);
        if pnl_return.is_sign_negative() {
            self.losses.update(pnl_return);
        }
    }

    /// Recomputes `trades_per_day` from a closed-position count and the
    /// scenario's elapsed wall-clock days.
    pub fn set_trades_per_day(&mut self, closed_trades: u64, elapsed_days: f64) {
        self.trades_per_day = match elapsed_days {
            d if d <= 0.0 => 0.0,
            d => closed_trades as f64 / d,
        };
    }
}

/// Return on the capital committed to a trade: realized PnL over the
/// notional at entry (`open_price * lots`).
fn calculate_pnl_return(
    realized_pnl: rust_decimal::Decimal,
    open_price: rust_decimal::Decimal,
    lots: rust_decimal::Decimal,
) -> f64 {
    let notional = open_price * lots;
    if notional.is_zero() {
        return 0.0;
    }
    (realized_pnl / notional).to_f64().unwrap_or(0.0)
}
