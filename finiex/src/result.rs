use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// Per-decision tallies across the whole tick loop (§6 `decision_statistics`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct DecisionStatistics {
    pub buy_signals: u64,
    pub sell_signals: u64,
    pub flat_signals: u64,
    pub orders_submitted: u64,
}

/// Per-worker aggregate timing/staleness, keyed by worker name (§6
/// `worker_statistics`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct WorkerStatistics {
    pub invocations: u64,
    pub total_time_ms: f64,
    pub stale_invocations: u64,
}

/// Tick-loop-wide dispatch telemetry (§6 `coordination_statistics`,
/// §4.6's "aggregate timing stats").
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct CoordinationStatistics {
    pub ticks_processed: u64,
    pub parallel_ticks: u64,
    pub serial_ticks: u64,
    pub avg_worker_wall_time_ms: f64,
}

impl CoordinationStatistics {
    pub fn record(&mut self, sample: crate::coordinator::CoordinationSample) {
        self.ticks_processed += 1;
        if sample.used_parallel {
            self.parallel_ticks += 1;
        } else {
            self.serial_ticks += 1;
        }
        self.avg_worker_wall_time_ms +=
            (sample.worker_wall_time_ms - self.avg_worker_wall_time_ms) / self.ticks_processed as f64;
    }
}

/// Final portfolio snapshot plus derived performance ratios (§6
/// `portfolio_stats`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PortfolioStats {
    pub final_balance: Decimal,
    pub final_equity: Decimal,
    pub max_drawdown: Decimal,
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub long_trades: u64,
    pub short_trades: u64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub rate_of_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
}

/// Order-execution counters (§6 `execution_stats`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct ExecutionStats {
    pub orders_submitted: u64,
    pub orders_executed: u64,
    pub orders_rejected: u64,
}

/// Commission/swap totals paid across closed positions (§6
/// `cost_breakdown`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct CostBreakdown {
    pub total_commission: Decimal,
    pub total_swap: Decimal,
}

/// Wall-clock breakdown of where a scenario's `execution_time_ms` went
/// (§6 `profiling_data`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct ProfilingData {
    pub warmup_time_ms: f64,
    pub tick_loop_time_ms: f64,
    pub flush_time_ms: f64,
}

/// First/last tick timestamps and the total tick count processed (§6
/// `tick_range_stats`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct TickRangeStats {
    pub first_tick: Option<chrono::DateTime<chrono::Utc>>,
    pub last_tick: Option<chrono::DateTime<chrono::Utc>>,
    pub ticks_processed: u64,
}

/// Everything measured over the tick loop itself (§6).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TickLoopResults {
    pub decision_statistics: DecisionStatistics,
    pub worker_statistics: HashMap<SmolStr, WorkerStatistics>,
    pub coordination_statistics: CoordinationStatistics,
    pub portfolio_stats: PortfolioStats,
    pub execution_stats: ExecutionStats,
    pub cost_breakdown: CostBreakdown,
    pub profiling_data: ProfilingData,
    pub tick_range_stats: TickRangeStats,
    pub tick_loop_error: Option<String>,
}

/// Everything one scenario process emits (§6): `ProcessResult`. Crosses the
/// scenario-process boundary as JSON, so every field here is serializable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    pub scenario_name: SmolStr,
    pub symbol: SmolStr,
    pub scenario_index: usize,
    pub execution_time_ms: f64,
    pub tick_loop_results: TickLoopResults,
    pub scenario_logger_buffer: String,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub traceback: Option<String>,
}
