use finiex_core::{Bar, Tick, Timeframe};
use finiex_strategy::{BarView, Decision, DecisionLogic, TradingApi, Worker, WorkerResult};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::thread;
use std::time::Instant;

/// Per-tick telemetry the runner folds into `coordination_statistics` (§6).
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinationSample {
    pub used_parallel: bool,
    pub worker_wall_time_ms: f64,
}

/// Result of dispatching one tick to every worker and then to the decision
/// logic (§4.6).
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub decision: Decision,
    pub worker_results: HashMap<SmolStr, WorkerResult>,
    pub coordination: CoordinationSample,
}

/// Adaptive serial/parallel dispatcher over a fixed worker set plus the
/// scenario's decision logic (§4.6-4.7).
///
/// The serial/parallel choice is revisited at most once per
/// `reconsider_every` ticks so it never flips mid-tick, and is driven by a
/// running average of total worker wall-time rather than a single sample,
/// matching "the parallel/serial choice may be revisited periodically
/// (adaptive), but never within a single tick".
pub struct WorkerCoordinator {
    workers: Vec<Box<dyn Worker>>,
    decision_logic: Box<dyn DecisionLogic>,
    parallel_workers: bool,
    parallel_threshold_ms: f64,
    ticks_seen: u64,
    avg_wall_time_ms: f64,
    currently_parallel: bool,
}

impl WorkerCoordinator {
    pub fn new(workers: Vec<Box<dyn Worker>>, decision_logic: Box<dyn DecisionLogic>, parallel_workers: bool, parallel_threshold_ms: f64) -> Self {
        Self {
            workers,
            decision_logic,
            parallel_workers,
            parallel_threshold_ms,
            ticks_seen: 0,
            avg_wall_time_ms: 0.0,
            currently_parallel: false,
        }
    }

    /// Timeframes required across every worker, deduplicated, for the bar
    /// controller to register (§4.5/§4.6).
    pub fn required_timeframes(&self) -> Vec<Timeframe> {
        let mut timeframes = Vec::new();
        for worker in &self.workers {
            for tf in worker.required_timeframes() {
                if !timeframes.contains(&tf) {
                    timeframes.push(tf);
                }
            }
        }
        timeframes
    }

    pub fn required_order_types(&self) -> std::collections::HashSet<finiex_execution::OrderType> {
        self.decision_logic.required_order_types()
    }

    /// Dispatch injected warmup history to every worker (§4.6: "Init calls
    /// `worker.on_warmup(bar_history)`").
    pub fn on_warmup(&mut self, bars_by_timeframe: &HashMap<Timeframe, Vec<Bar>>) {
        for worker in &mut self.workers {
            worker.on_warmup(bars_by_timeframe);
        }
    }

    /// Run one tick: compute every worker's result (serially or in
    /// parallel, per the adaptive policy), then invoke the decision logic.
    pub fn on_tick(&mut self, tick: &Tick, bars: &HashMap<Timeframe, BarView<'_>>, symbol: &str, api: &mut dyn TradingApi) -> TickOutcome {
        let started = Instant::now();
        let use_parallel = self.parallel_workers && self.currently_parallel;

        let worker_results = if use_parallel {
            compute_parallel(&mut self.workers, tick, bars)
        } else {
            compute_serial(&mut self.workers, tick, bars)
        };

        let wall_time_ms = started.elapsed().as_secs_f64() * 1_000.0;
        self.record_timing(wall_time_ms);

        let by_name: HashMap<SmolStr, WorkerResult> = worker_results
            .into_iter()
            .map(|result| (result.worker_name.clone(), result))
            .collect();

        let decision = self
            .decision_logic
            .compute(symbol, tick.mid(), tick.timestamp, &by_name);
        self.decision_logic.execute(&decision, symbol, api);

        TickOutcome {
            decision,
            worker_results: by_name,
            coordination: CoordinationSample {
                used_parallel: use_parallel,
                worker_wall_time_ms: wall_time_ms,
            },
        }
    }

    fn record_timing(&mut self, wall_time_ms: f64) {
        self.ticks_seen += 1;
        self.avg_wall_time_ms += (wall_time_ms - self.avg_wall_time_ms) / self.ticks_seen as f64;
        self.currently_parallel = self.avg_wall_time_ms >= self.parallel_threshold_ms;
    }
}

fn compute_serial(workers: &mut [Box<dyn Worker>], tick: &Tick, bars: &HashMap<Timeframe, BarView<'_>>) -> Vec<WorkerResult> {
    workers.iter_mut().map(|worker| worker.compute(tick, bars)).collect()
}

fn compute_parallel(workers: &mut [Box<dyn Worker>], tick: &Tick, bars: &HashMap<Timeframe, BarView<'_>>) -> Vec<WorkerResult> {
    thread::scope(|scope| {
        let handles: Vec<_> = workers
            .iter_mut()
            .map(|worker| scope.spawn(|| worker.compute(tick, bars)))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use finiex_execution::{Direction, OrderResult, OrderType};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    struct StubWorker {
        name: SmolStr,
        timeframe: Timeframe,
    }

    impl Worker for StubWorker {
        fn name(&self) -> &str {
            &self.name
        }

        fn required_timeframes(&self) -> Vec<Timeframe> {
            vec![self.timeframe]
        }

        fn warmup_bars(&self, _timeframe: Timeframe) -> usize {
            0
        }

        fn on_warmup(&mut self, _bars_by_timeframe: &HashMap<Timeframe, Vec<Bar>>) {}

        fn compute(&mut self, _tick: &Tick, _bars_by_timeframe: &HashMap<Timeframe, BarView<'_>>) -> WorkerResult {
            WorkerResult {
                worker_name: self.name.clone(),
                value: 1.0,
                confidence: 1.0,
                computation_time_ms: 0.0,
                is_stale: false,
            }
        }
    }

    struct StubDecisionLogic;

    impl DecisionLogic for StubDecisionLogic {
        fn required_order_types(&self) -> HashSet<OrderType> {
            HashSet::from([OrderType::Market])
        }

        fn compute(&mut self, _symbol: &str, price: Decimal, timestamp: chrono::DateTime<Utc>, _worker_results: &HashMap<SmolStr, WorkerResult>) -> Decision {
            Decision {
                action: finiex_strategy::Action::Flat,
                confidence: 1.0,
                reason: SmolStr::new("stub"),
                price,
                timestamp,
            }
        }

        fn execute(&mut self, _decision: &Decision, _symbol: &str, _api: &mut dyn TradingApi) -> Option<OrderResult> {
            None
        }
    }

    struct StubApi;

    impl TradingApi for StubApi {
        fn open_order(&mut self, _symbol: &str, _order_type: OrderType, _direction: Direction, _lots: Decimal, _requested_price: Option<Decimal>, _comment: &str) -> OrderResult {
            unreachable!("stub decision logic never submits orders")
        }

        fn has_pending_order(&self, _symbol: &str, _direction: Direction) -> bool {
            false
        }

        fn has_open_position(&self, _symbol: &str) -> Option<Direction> {
            None
        }

        fn close_position(&mut self, _symbol: &str, _comment: &str) -> Option<OrderResult> {
            unreachable!("stub decision logic never submits orders")
        }

        fn free_margin(&self) -> Decimal {
            dec!(10000)
        }
    }

    fn tick() -> Tick {
        Tick::new(Utc::now(), "EURUSD", dec!(1.1000), dec!(1.1002), None).unwrap()
    }

    #[test]
    fn required_timeframes_are_deduplicated_across_workers() {
        let workers: Vec<Box<dyn Worker>> = vec![
            Box::new(StubWorker { name: SmolStr::new("a"), timeframe: Timeframe::M5 }),
            Box::new(StubWorker { name: SmolStr::new("b"), timeframe: Timeframe::M5 }),
            Box::new(StubWorker { name: SmolStr::new("c"), timeframe: Timeframe::H1 }),
        ];
        let coordinator = WorkerCoordinator::new(workers, Box::new(StubDecisionLogic), false, 5.0);

        assert_eq!(coordinator.required_timeframes(), vec![Timeframe::M5, Timeframe::H1]);
    }

    #[test]
    fn on_tick_collects_every_worker_result_and_runs_decision_logic() {
        let workers: Vec<Box<dyn Worker>> = vec![
            Box::new(StubWorker { name: SmolStr::new("a"), timeframe: Timeframe::M5 }),
            Box::new(StubWorker { name: SmolStr::new("b"), timeframe: Timeframe::M5 }),
        ];
        let mut coordinator = WorkerCoordinator::new(workers, Box::new(StubDecisionLogic), false, 5.0);
        let bars = HashMap::new();
        let mut api = StubApi;

        let outcome = coordinator.on_tick(&tick(), &bars, "EURUSD", &mut api);

        assert_eq!(outcome.worker_results.len(), 2);
        assert_eq!(outcome.decision.action, finiex_strategy::Action::Flat);
        assert!(!outcome.coordination.used_parallel);
    }

    #[test]
    fn slow_workers_flip_the_coordinator_into_parallel_mode() {
        struct SlowWorker;
        impl Worker for SlowWorker {
            fn name(&self) -> &str {
                "slow"
            }
            fn required_timeframes(&self) -> Vec<Timeframe> {
                vec![Timeframe::M5]
            }
            fn warmup_bars(&self, _timeframe: Timeframe) -> usize {
                0
            }
            fn on_warmup(&mut self, _bars_by_timeframe: &HashMap<Timeframe, Vec<Bar>>) {}
            fn compute(&mut self, _tick: &Tick, _bars_by_timeframe: &HashMap<Timeframe, BarView<'_>>) -> WorkerResult {
                std::thread::sleep(std::time::Duration::from_millis(2));
                WorkerResult {
                    worker_name: SmolStr::new("slow"),
                    value: 0.0,
                    confidence: 0.0,
                    computation_time_ms: 0.0,
                    is_stale: false,
                }
            }
        }

        let workers: Vec<Box<dyn Worker>> = vec![Box::new(SlowWorker)];
        let mut coordinator = WorkerCoordinator::new(workers, Box::new(StubDecisionLogic), true, 1.0);
        let bars = HashMap::new();
        let mut api = StubApi;

        let first = coordinator.on_tick(&tick(), &bars, "EURUSD", &mut api);
        assert!(!first.coordination.used_parallel);

        let second = coordinator.on_tick(&tick(), &bars, "EURUSD", &mut api);
        assert!(second.coordination.used_parallel);
    }
}
