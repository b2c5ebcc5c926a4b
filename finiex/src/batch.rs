//! Batch execution coordinator (§4.10): runs a set of scenarios
//! concurrently, each as its own blocking task, bounded by
//! `max_parallel_scenarios`, and reports results back in the scenarios'
//! original input order regardless of completion order.

use crate::result::ProcessResult;
use crate::runner::run_scenario;
use finiex_data::{ProcessDataPackage, Scenario};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// One scenario plus the pre-built data package it replays against.
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub scenario: Scenario,
    pub package: Arc<ProcessDataPackage>,
}

/// Run every item in `items` concurrently, at most `max_parallel_scenarios`
/// at a time, and return their `ProcessResult`s in `items`' original
/// order. Each scenario runs on its own blocking OS thread via
/// `spawn_blocking`, since the tick loop itself is synchronous and
/// CPU-bound (§5). A scenario's own failure is captured as an error
/// `ProcessResult` and never prevents sibling scenarios from completing
/// (§7 failure isolation).
///
/// Forces `max_parallel_scenarios` down to 1 when `parallel_scenarios` is
/// `false` or a debugger is attached to this process (§4.10, §9): a
/// debugger stepping through one scenario must not be racing sibling
/// scenarios on other threads underneath it.
pub async fn run_batch(items: Vec<BatchItem>, max_parallel_scenarios: usize, parallel_scenarios: bool) -> Vec<ProcessResult> {
    let effective_max = if parallel_scenarios && !crate::app_config::debugger_attached() {
        max_parallel_scenarios.max(1)
    } else {
        1
    };
    let semaphore = Arc::new(Semaphore::new(effective_max));

    let tasks = items.into_iter().enumerate().map(|(scenario_index, item)| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("batch semaphore is never closed while scenarios are in flight");

            let scenario_name = item.scenario.name.clone();
            let symbol = item.scenario.symbol.clone();

            tokio::task::spawn_blocking(move || run_scenario(&item.scenario, scenario_index, &item.package))
                .await
                .unwrap_or_else(|join_error| join_panic_result(scenario_index, scenario_name, symbol, &join_error))
        }
    });

    futures::future::join_all(tasks).await
}

/// Build a failure `ProcessResult` for a scenario whose blocking task
/// itself was lost (panicked past `run_scenario`'s own `catch_unwind`, or
/// was cancelled) rather than returning a value.
fn join_panic_result(scenario_index: usize, scenario_name: smol_str::SmolStr, symbol: smol_str::SmolStr, join_error: &tokio::task::JoinError) -> ProcessResult {
    tracing::error!(scenario = %scenario_name, %join_error, "scenario task lost");
    ProcessResult {
        success: false,
        scenario_name,
        symbol,
        scenario_index,
        execution_time_ms: 0.0,
        tick_loop_results: crate::result::TickLoopResults::default(),
        scenario_logger_buffer: String::new(),
        error_type: Some("worker_panic".to_string()),
        error_message: Some(join_error.to_string()),
        traceback: None,
    }
}
