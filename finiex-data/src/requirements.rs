use crate::error::DataError;
use crate::scenario::Scenario;
use chrono::{DateTime, Utc};
use finiex_core::Timeframe;
use finiex_strategy::build_worker;
use smol_str::SmolStr;
use std::collections::HashMap;

/// One scenario's need for raw ticks: a symbol and time range (or
/// `max_ticks` cap), fed to the preparator (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct TickRequirement {
    pub symbol: SmolStr,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub max_ticks: Option<u64>,
}

/// One scenario's need for warmup bar history on a given timeframe,
/// ending strictly before `before` (the scenario's start time).
#[derive(Debug, Clone, PartialEq)]
pub struct BarRequirement {
    pub symbol: SmolStr,
    pub timeframe: Timeframe,
    pub warmup_bars: usize,
    pub before: DateTime<Utc>,
}

/// Output of the requirements collector (§3, §4.3).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementsMap {
    pub tick_requirements: Vec<TickRequirement>,
    pub bar_requirements: Vec<BarRequirement>,
}

/// Instantiates every worker in `scenario.strategy_config.workers`
/// *temporarily*, with no data, solely to ask `required_timeframes()` and
/// `warmup_bars(tf)`, then takes the per-timeframe maximum across workers
/// (§4.3). Never deduplicates across scenarios — each scenario's data is
/// scenario-scoped (§4.4).
pub fn collect_requirements(scenario: &Scenario) -> Result<RequirementsMap, DataError> {
    let mut max_warmup: HashMap<Timeframe, usize> = HashMap::new();

    for worker_config in scenario.strategy_config.workers.values() {
        let worker = build_worker(worker_config).map_err(|error| DataError::Validation(error.to_string()))?;

        for timeframe in worker.required_timeframes() {
            let needed = worker.warmup_bars(timeframe);
            max_warmup
                .entry(timeframe)
                .and_modify(|existing| *existing = (*existing).max(needed))
                .or_insert(needed);
        }
    }

    let tick_requirements = vec![TickRequirement {
        symbol: scenario.symbol.clone(),
        start_time: scenario.start_date,
        end_time: scenario.end_date,
        max_ticks: scenario.max_ticks,
    }];

    let mut bar_requirements: Vec<BarRequirement> = max_warmup
        .into_iter()
        .map(|(timeframe, warmup_bars)| BarRequirement {
            symbol: scenario.symbol.clone(),
            timeframe,
            warmup_bars,
            before: scenario.start_date,
        })
        .collect();
    bar_requirements.sort_by_key(|req| req.timeframe.sort_index());

    Ok(RequirementsMap {
        tick_requirements,
        bar_requirements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{DataMode, ExecutionConfig, StrategyConfig};
    use finiex_execution::StressTestConfig;
    use finiex_strategy::{DecisionLogicConfig, WorkerConfig};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn scenario_with_workers(workers: HashMap<SmolStr, WorkerConfig>) -> Scenario {
        Scenario {
            name: SmolStr::new("s1"),
            symbol: SmolStr::new("EURUSD"),
            start_date: Utc::now(),
            end_date: None,
            max_ticks: Some(100),
            data_mode: DataMode::Clean,
            strategy_config: StrategyConfig {
                workers,
                decision_logic: DecisionLogicConfig {
                    decision_logic_type: SmolStr::new("simple_consensus"),
                    rsi_worker: SmolStr::new("rsi_1"),
                    envelope_worker: SmolStr::new("envelope_1"),
                    params: HashMap::new(),
                },
            },
            execution_config: ExecutionConfig {
                broker_type: SmolStr::new("demo"),
                initial_balance: dec!(10000),
                account_currency: SmolStr::new("auto"),
                stress_test_config: StressTestConfig::default(),
                seeds: HashMap::new(),
            },
        }
    }

    #[test]
    fn test_collect_requirements_takes_max_warmup_across_workers() {
        let mut workers = HashMap::new();
        workers.insert(
            SmolStr::new("rsi_1"),
            WorkerConfig {
                worker_type: SmolStr::new("rsi"),
                name: SmolStr::new("rsi_1"),
                timeframe: Timeframe::M5,
                params: HashMap::from([("period".to_string(), 14.0)]),
            },
        );
        workers.insert(
            SmolStr::new("envelope_1"),
            WorkerConfig {
                worker_type: SmolStr::new("envelope"),
                name: SmolStr::new("envelope_1"),
                timeframe: Timeframe::M5,
                params: HashMap::from([("period".to_string(), 20.0)]),
            },
        );

        let requirements = collect_requirements(&scenario_with_workers(workers)).unwrap();
        assert_eq!(requirements.bar_requirements.len(), 1);
        assert_eq!(requirements.bar_requirements[0].timeframe, Timeframe::M5);
        // rsi warmup = period+1 = 15, envelope = 20: max is 20.
        assert_eq!(requirements.bar_requirements[0].warmup_bars, 20);
    }

    #[test]
    fn test_collect_requirements_unknown_worker_type_errors() {
        let mut workers = HashMap::new();
        workers.insert(
            SmolStr::new("bad"),
            WorkerConfig {
                worker_type: SmolStr::new("macd"),
                name: SmolStr::new("bad"),
                timeframe: Timeframe::M5,
                params: HashMap::new(),
            },
        );

        let err = collect_requirements(&scenario_with_workers(workers)).unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }
}
