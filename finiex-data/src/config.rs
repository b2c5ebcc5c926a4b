use crate::error::DataError;
use crate::scenario::{DataMode, ExecutionConfig, Scenario, StrategyConfig};
use chrono::{DateTime, Utc};
use finiex_execution::{BrokerSpec, StressTestConfig};
use finiex_strategy::{DecisionLogicConfig, WorkerConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;
use std::path::Path;

/// Parses a broker-config JSON file (§6) into a [`BrokerSpec`]. Malformed
/// JSON or a missing file produce a [`DataError`] rather than a panic
/// (§4.13).
pub fn load_broker_spec(path: impl AsRef<Path>) -> Result<BrokerSpec, DataError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DataError::ConfigParse {
        path: path.display().to_string(),
        source,
    })
}

/// Sparse override of a single worker's config (§4.13): only the fields
/// present in a scenario's JSON are `Some`. A worker not already present
/// in `global` must supply `worker_type` and `timeframe` to be valid.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WorkerConfigOverride {
    pub worker_type: Option<SmolStr>,
    pub timeframe: Option<finiex_core::Timeframe>,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DecisionLogicConfigOverride {
    pub decision_logic_type: Option<SmolStr>,
    pub rsi_worker: Option<SmolStr>,
    pub envelope_worker: Option<SmolStr>,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StrategyConfigOverride {
    #[serde(default)]
    pub workers: HashMap<SmolStr, WorkerConfigOverride>,
    #[serde(default)]
    pub decision_logic: Option<DecisionLogicConfigOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ExecutionConfigOverride {
    pub broker_type: Option<SmolStr>,
    pub initial_balance: Option<Decimal>,
    pub account_currency: Option<SmolStr>,
    pub stress_test_config: Option<StressTestConfig>,
    #[serde(default)]
    pub seeds: HashMap<String, u64>,
}

/// One entry of the scenario-set JSON's `scenarios` array (§6): identity
/// fields plus sparse overrides of the `global` block.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScenarioOverride {
    pub name: SmolStr,
    pub symbol: SmolStr,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_ticks: Option<u64>,
    #[serde(default)]
    pub data_mode: DataMode,
    #[serde(default)]
    pub strategy_config: StrategyConfigOverride,
    #[serde(default)]
    pub execution_config: ExecutionConfigOverride,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlobalConfig {
    pub strategy_config: StrategyConfig,
    pub execution_config: ExecutionConfig,
}

/// Scenario-set config (§6): `{version, scenario_set_name, created, global,
/// scenarios[]}`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScenarioSetConfig {
    pub version: SmolStr,
    pub scenario_set_name: SmolStr,
    pub created: DateTime<Utc>,
    pub global: GlobalConfig,
    pub scenarios: Vec<ScenarioOverride>,
}

impl ScenarioSetConfig {
    /// Deep-merges every scenario override into `global`, producing fully
    /// resolved [`Scenario`]s in file order. `global` is never mutated:
    /// each scenario gets its own cloned-then-merged copy (§4.13).
    pub fn resolve_scenarios(&self) -> Result<Vec<Scenario>, DataError> {
        self.scenarios.iter().map(|ov| self.resolve_one(ov)).collect()
    }

    fn resolve_one(&self, ov: &ScenarioOverride) -> Result<Scenario, DataError> {
        let strategy_config = merge_strategy_config(&self.global.strategy_config, &ov.strategy_config, &ov.name)?;
        let execution_config = merge_execution_config(&self.global.execution_config, &ov.execution_config);

        let scenario = Scenario {
            name: ov.name.clone(),
            symbol: ov.symbol.clone(),
            start_date: ov.start_date,
            end_date: ov.end_date,
            max_ticks: ov.max_ticks,
            data_mode: ov.data_mode,
            strategy_config,
            execution_config,
        };
        scenario.validate()?;
        Ok(scenario)
    }
}

fn merge_strategy_config(
    global: &StrategyConfig,
    ov: &StrategyConfigOverride,
    scenario_name: &str,
) -> Result<StrategyConfig, DataError> {
    let mut workers = global.workers.clone();

    for (name, worker_ov) in &ov.workers {
        match workers.get(name).cloned() {
            Some(mut existing) => {
                if let Some(worker_type) = &worker_ov.worker_type {
                    existing.worker_type = worker_type.clone();
                }
                if let Some(timeframe) = worker_ov.timeframe {
                    existing.timeframe = timeframe;
                }
                existing.params.extend(worker_ov.params.clone());
                workers.insert(name.clone(), existing);
            }
            None => {
                let (Some(worker_type), Some(timeframe)) = (worker_ov.worker_type.clone(), worker_ov.timeframe) else {
                    return Err(DataError::Validation(format!(
                        "scenario '{scenario_name}' introduces worker '{name}' without worker_type+timeframe"
                    )));
                };
                workers.insert(
                    name.clone(),
                    WorkerConfig {
                        worker_type,
                        name: name.clone(),
                        timeframe,
                        params: worker_ov.params.clone(),
                    },
                );
            }
        }
    }

    let mut decision_logic = global.decision_logic.clone();
    if let Some(dl_ov) = &ov.decision_logic {
        if let Some(decision_logic_type) = &dl_ov.decision_logic_type {
            decision_logic.decision_logic_type = decision_logic_type.clone();
        }
        if let Some(rsi_worker) = &dl_ov.rsi_worker {
            decision_logic.rsi_worker = rsi_worker.clone();
        }
        if let Some(envelope_worker) = &dl_ov.envelope_worker {
            decision_logic.envelope_worker = envelope_worker.clone();
        }
        decision_logic.params.extend(dl_ov.params.clone());
    }

    Ok(StrategyConfig { workers, decision_logic })
}

fn merge_execution_config(global: &ExecutionConfig, ov: &ExecutionConfigOverride) -> ExecutionConfig {
    let mut seeds = global.seeds.clone();
    seeds.extend(ov.seeds.clone());

    ExecutionConfig {
        broker_type: ov.broker_type.clone().unwrap_or_else(|| global.broker_type.clone()),
        initial_balance: ov.initial_balance.unwrap_or(global.initial_balance),
        account_currency: ov.account_currency.clone().unwrap_or_else(|| global.account_currency.clone()),
        stress_test_config: ov.stress_test_config.clone().unwrap_or_else(|| global.stress_test_config.clone()),
        seeds,
    }
}

/// Parses a scenario-set JSON file (§6) and resolves it into concrete
/// [`Scenario`]s.
pub fn load_scenario_set(path: impl AsRef<Path>) -> Result<Vec<Scenario>, DataError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: ScenarioSetConfig = serde_json::from_slice(&bytes).map_err(|source| DataError::ConfigParse {
        path: path.display().to_string(),
        source,
    })?;
    config.resolve_scenarios()
}
