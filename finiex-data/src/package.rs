use finiex_core::{Bar, Tick, Timeframe};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::HashMap;

/// Immutable per-scenario bundle (§3): exactly the tick/bar slice one
/// scenario needs, plus the serialized broker spec it runs against.
/// Produced by the preparator; never shared across scenario boundaries —
/// scenario isolation requires each scenario own its data independently,
/// even if two scenarios happen to request overlapping ranges (§4.4, §5).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProcessDataPackage {
    pub scenario_name: SmolStr,
    pub symbol: SmolStr,
    pub ticks: Vec<Tick>,
    pub bars: HashMap<Timeframe, Vec<Bar>>,
    pub broker_config_serialized: String,
    /// Non-fatal preparation warnings (e.g. insufficient warmup bars
    /// found) that the scenario process runner surfaces rather than the
    /// preparator silently returning short history (§4.4).
    pub warnings: Vec<String>,
}
