use crate::decision::DecisionLogic;
use crate::error::StrategyError;
use crate::worker::Worker;
use crate::workers::{EnvelopeWorker, RsiWorker};
use crate::SimpleConsensus;
use finiex_core::Timeframe;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// On-disk shape of one worker entry in a scenario's `strategy_config`
/// (§6). `params` is a closed, untyped numeric bag rather than a variant
/// per worker type, matching how the scenario-set JSON keeps worker
/// parameters homogeneous across worker types.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkerConfig {
    pub worker_type: SmolStr,
    pub name: SmolStr,
    pub timeframe: Timeframe,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

/// On-disk shape of a scenario's decision logic selection (§6).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DecisionLogicConfig {
    pub decision_logic_type: SmolStr,
    pub rsi_worker: SmolStr,
    pub envelope_worker: SmolStr,
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

fn param(params: &HashMap<String, f64>, key: &str, default: f64) -> f64 {
    params.get(key).copied().unwrap_or(default)
}

fn decimal_param(params: &HashMap<String, f64>, key: &str, default: Decimal) -> Decimal {
    params
        .get(key)
        .and_then(|v| Decimal::try_from(*v).ok())
        .unwrap_or(default)
}

/// Instantiates the worker named by `config.worker_type` (§4.3: this is
/// also how the requirements collector builds workers *temporarily*, with
/// no data, just to query `required_timeframes`/`warmup_bars`).
pub fn build_worker(config: &WorkerConfig) -> Result<Box<dyn Worker>, StrategyError> {
    match config.worker_type.as_str() {
        "rsi" => Ok(Box::new(RsiWorker::new(
            config.name.clone(),
            config.timeframe,
            param(&config.params, "period", 14.0) as usize,
            param(&config.params, "oversold", 30.0),
            param(&config.params, "overbought", 70.0),
        ))),
        "envelope" => Ok(Box::new(EnvelopeWorker::new(
            config.name.clone(),
            config.timeframe,
            param(&config.params, "period", 20.0) as usize,
            param(&config.params, "pct", 0.025),
        ))),
        other => Err(StrategyError::UnknownWorkerType(SmolStr::new(other))),
    }
}

/// Instantiates the decision logic named by `config.decision_logic_type`.
pub fn build_decision_logic(config: &DecisionLogicConfig) -> Result<Box<dyn DecisionLogic>, StrategyError> {
    match config.decision_logic_type.as_str() {
        "simple_consensus" => Ok(Box::new(SimpleConsensus::new(
            config.rsi_worker.clone(),
            config.envelope_worker.clone(),
            param(&config.params, "rsi_oversold", 30.0),
            param(&config.params, "rsi_overbought", 70.0),
            param(&config.params, "envelope_lower", 0.3),
            param(&config.params, "envelope_upper", 0.7),
            param(&config.params, "min_confidence", 0.5),
            decimal_param(&config.params, "lot_size", Decimal::new(1, 1)),
            decimal_param(&config.params, "min_free_margin", Decimal::new(1000, 0)),
        ))),
        other => Err(StrategyError::UnknownDecisionLogicType(SmolStr::new(other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_worker_unknown_type_is_reported() {
        let config = WorkerConfig {
            worker_type: SmolStr::new("macd"),
            name: SmolStr::new("macd_1"),
            timeframe: Timeframe::M5,
            params: HashMap::new(),
        };
        let err = build_worker(&config).unwrap_err();
        assert!(matches!(err, StrategyError::UnknownWorkerType(_)));
    }

    #[test]
    fn test_build_worker_rsi_defaults() {
        let config = WorkerConfig {
            worker_type: SmolStr::new("rsi"),
            name: SmolStr::new("rsi_1"),
            timeframe: Timeframe::M5,
            params: HashMap::new(),
        };
        let worker = build_worker(&config).unwrap();
        assert_eq!(worker.name(), "rsi_1");
        assert_eq!(worker.required_timeframes(), vec![Timeframe::M5]);
    }

    #[test]
    fn test_build_decision_logic_unknown_type_is_reported() {
        let config = DecisionLogicConfig {
            decision_logic_type: SmolStr::new("ml_ensemble"),
            rsi_worker: SmolStr::new("rsi_1"),
            envelope_worker: SmolStr::new("envelope_1"),
            params: HashMap::new(),
        };
        let err = build_decision_logic(&config).unwrap_err();
        assert!(matches!(err, StrategyError::UnknownDecisionLogicType(_)));
    }
}
