use crate::error::DataError;
use crate::index::{BarIndex, TickIndex};
use crate::package::ProcessDataPackage;
use crate::requirements::{collect_requirements, BarRequirement};
use crate::scenario::Scenario;
use chrono::{DateTime, Utc};
use finiex_core::{Bar, Tick, Timeframe};
use finiex_execution::BrokerSpec;
use smol_str::SmolStr;
use std::collections::HashMap;

fn read_json_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, DataError> {
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| DataError::ConfigParse {
        path: path.to_string(),
        source,
    })
}

/// §4.4: for each scenario, load only the tick files its range needs (or
/// the first `max_ticks` in tick-limited mode), normalize to UTC,
/// concatenate, sort stable by timestamp, and deduplicate by
/// `(timestamp, bid, ask)` keeping the last. Load every required
/// `(symbol, timeframe)` warmup window, selecting the last `warmup_bars`
/// bars strictly before the scenario's start time. Emits one
/// [`ProcessDataPackage`], recording an insufficient-warmup warning rather
/// than silently returning short history.
pub fn prepare_scenario_data(
    scenario: &Scenario,
    tick_index: &TickIndex,
    bar_index: &BarIndex,
    broker_spec: &BrokerSpec,
) -> Result<ProcessDataPackage, DataError> {
    scenario.validate()?;

    let requirements = collect_requirements(scenario)?;
    let mut warnings = Vec::new();

    let ticks = load_ticks(scenario, tick_index)?;
    let bars = load_bars(&requirements.bar_requirements, bar_index, &mut warnings)?;

    let broker_config_serialized = serde_json::to_string(broker_spec).map_err(|source| DataError::ConfigParse {
        path: "<broker_spec>".to_string(),
        source,
    })?;

    Ok(ProcessDataPackage {
        scenario_name: scenario.name.clone(),
        symbol: scenario.symbol.clone(),
        ticks,
        bars,
        broker_config_serialized,
        warnings,
    })
}

fn load_ticks(scenario: &Scenario, tick_index: &TickIndex) -> Result<Vec<Tick>, DataError> {
    let t0 = scenario.start_date;
    let t1 = scenario.end_date.unwrap_or(DateTime::<Utc>::MAX_UTC);

    let entries = tick_index.files_for_range(&scenario.symbol, t0, t1);
    if entries.is_empty() {
        return Err(DataError::NoTickFiles(scenario.symbol.clone()));
    }

    let mut ticks: Vec<Tick> = Vec::new();
    for entry in entries {
        ticks.extend(read_json_file::<Vec<Tick>>(&entry.path)?);
    }

    ticks.sort_by_key(|tick| tick.timestamp);
    ticks.retain(|tick| tick.timestamp >= t0 && tick.timestamp <= t1);

    let mut deduped: Vec<Tick> = Vec::with_capacity(ticks.len());
    for tick in ticks {
        match deduped.last_mut() {
            Some(last) if last.timestamp == tick.timestamp && last.bid == tick.bid && last.ask == tick.ask => {
                *last = tick;
            }
            _ => deduped.push(tick),
        }
    }

    if let Some(max_ticks) = scenario.max_ticks {
        deduped.truncate(max_ticks as usize);
    }

    Ok(deduped)
}

fn load_bars(
    bar_requirements: &[BarRequirement],
    bar_index: &BarIndex,
    warnings: &mut Vec<String>,
) -> Result<HashMap<Timeframe, Vec<Bar>>, DataError> {
    let mut bars = HashMap::new();

    for requirement in bar_requirements {
        let entry = bar_index
            .bar_file(&requirement.symbol, requirement.timeframe)
            .ok_or_else(|| DataError::NoBarFile {
                symbol: requirement.symbol.clone(),
                timeframe: SmolStr::new(requirement.timeframe.name()),
            })?;

        let mut all = read_json_file::<Vec<Bar>>(&entry.path)?;
        all.retain(|bar| bar.timestamp < requirement.before);
        all.sort_by_key(|bar| bar.timestamp);

        let found = all.len();
        if found < requirement.warmup_bars {
            warnings.push(format!(
                "insufficient warmup for {} {}: requested {}, found {found}",
                requirement.symbol,
                requirement.timeframe.name(),
                requirement.warmup_bars
            ));
        }

        let start = all.len().saturating_sub(requirement.warmup_bars);
        bars.insert(requirement.timeframe, all.split_off(start));
    }

    Ok(bars)
}
