use finiex_core::{Bar, Tick, Timeframe};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// Opaque (to the coordinator) output of one indicator worker for one
/// tick (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    pub worker_name: SmolStr,
    pub value: f64,
    pub confidence: f64,
    pub computation_time_ms: f64,
    pub is_stale: bool,
}

/// Read-only view of the bar history a worker may consult: the bar
/// currently forming for a timeframe, plus the completed-bar history
/// (warmup bars included) preceding it. Lent to workers by the bar
/// rendering controller (§4.5); never owned by them.
#[derive(Debug, Clone, Copy)]
pub struct BarView<'a> {
    pub current: Option<&'a Bar>,
    pub history: &'a [Bar],
}

/// A pure indicator computation over bars/ticks (§4.6, Glossary).
///
/// Implementations must be deterministic: the same `(tick, bars)` input
/// must always produce the same [`WorkerResult`], since the coordinator
/// may run workers serially or in parallel depending on measured timing
/// (§4.6) and the result must not depend on which mode was used.
pub trait Worker: Send + Sync {
    fn name(&self) -> &str;

    /// Timeframes this worker needs bar history for.
    fn required_timeframes(&self) -> Vec<Timeframe>;

    /// Minimum completed bars needed on `timeframe` before this worker
    /// can produce a non-stale result.
    fn warmup_bars(&self, timeframe: Timeframe) -> usize;

    /// Called once at scenario start with the injected warmup history so
    /// the worker can precompute any running state (§4.6).
    fn on_warmup(&mut self, bars_by_timeframe: &HashMap<Timeframe, Vec<Bar>>);

    /// Compute this worker's result for the current tick.
    fn compute(&mut self, tick: &Tick, bars_by_timeframe: &HashMap<Timeframe, BarView<'_>>) -> WorkerResult;
}
