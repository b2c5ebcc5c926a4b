use chrono::{DateTime, Utc};
use finiex_execution::StressTestConfig;
use finiex_strategy::{DecisionLogicConfig, WorkerConfig};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

use crate::error::DataError;

/// How raw the requested tick slice should be (§6's `data_mode`). Consumed
/// by the preparator only to pick which collector sub-directory to read
/// from; this crate doesn't interpret the cleaning itself.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataMode {
    Raw,
    Realistic,
    #[default]
    Clean,
}

/// Strategy configuration shared by a scenario: the worker set, keyed by
/// worker name so scenario overrides can target individual workers
/// (§4.13's "merged per-worker-type"), and the decision logic.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StrategyConfig {
    pub workers: HashMap<SmolStr, WorkerConfig>,
    pub decision_logic: DecisionLogicConfig,
}

/// Broker/account configuration for a scenario.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExecutionConfig {
    pub broker_type: SmolStr,
    pub initial_balance: Decimal,
    /// Either an explicit ISO currency code or the literal `"auto"`,
    /// meaning "derive from the broker spec" (§3).
    pub account_currency: SmolStr,
    #[serde(default)]
    pub stress_test_config: StressTestConfig,
    #[serde(default)]
    pub seeds: HashMap<String, u64>,
}

impl ExecutionConfig {
    pub fn is_auto_currency(&self) -> bool {
        self.account_currency.eq_ignore_ascii_case("auto")
    }

    pub fn seed(&self, key: &str) -> u64 {
        self.seeds.get(key).copied().unwrap_or(0)
    }
}

/// A fully-resolved scenario (global config already merged with its
/// overrides, §4.13): `{name, symbol, start_time, end_time | max_ticks,
/// strategy_config, broker_type, initial_balance, account_currency,
/// stress_test_config, seeds}` (§3).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Scenario {
    pub name: SmolStr,
    pub symbol: SmolStr,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_ticks: Option<u64>,
    #[serde(default)]
    pub data_mode: DataMode,
    pub strategy_config: StrategyConfig,
    pub execution_config: ExecutionConfig,
}

impl Scenario {
    /// `end_time` XOR `max_ticks` ends the run (§3). Validated explicitly
    /// rather than modeled as a two-variant enum so scenario-set JSON can
    /// set either field by name without an internally-tagged wrapper.
    pub fn validate(&self) -> Result<(), DataError> {
        match (self.end_date, self.max_ticks) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(DataError::Validation(format!(
                "scenario '{}' sets both end_date and max_ticks, exactly one is required",
                self.name
            ))),
            (None, None) => Err(DataError::Validation(format!(
                "scenario '{}' sets neither end_date nor max_ticks, exactly one is required",
                self.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_scenario() -> Scenario {
        Scenario {
            name: SmolStr::new("s1"),
            symbol: SmolStr::new("EURUSD"),
            start_date: Utc::now(),
            end_date: None,
            max_ticks: Some(1000),
            data_mode: DataMode::Clean,
            strategy_config: StrategyConfig {
                workers: HashMap::new(),
                decision_logic: DecisionLogicConfig {
                    decision_logic_type: SmolStr::new("simple_consensus"),
                    rsi_worker: SmolStr::new("rsi_1"),
                    envelope_worker: SmolStr::new("envelope_1"),
                    params: HashMap::new(),
                },
            },
            execution_config: ExecutionConfig {
                broker_type: SmolStr::new("demo"),
                initial_balance: Decimal::new(10000, 0),
                account_currency: SmolStr::new("auto"),
                stress_test_config: StressTestConfig::default(),
                seeds: HashMap::new(),
            },
        }
    }

    #[test]
    fn test_validate_accepts_max_ticks_only() {
        assert!(base_scenario().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_both_set() {
        let mut scenario = base_scenario();
        scenario.end_date = Some(Utc::now());
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_neither_set() {
        let mut scenario = base_scenario();
        scenario.max_ticks = None;
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_is_auto_currency() {
        assert!(base_scenario().execution_config.is_auto_currency());
    }
}
