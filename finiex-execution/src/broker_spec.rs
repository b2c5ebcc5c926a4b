use crate::order::OrderType;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A latency distribution over ticks, used to draw `latency_ticks` at
/// order-submission time (§4.8.2). `Fixed` is sufficient for every
/// end-to-end scenario in §8; `Uniform` is kept for broker specs that
/// configure a spread of latencies.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LatencyDistribution {
    Fixed { ticks: u64 },
    Uniform { min_ticks: u64, max_ticks: u64 },
}

impl Default for LatencyDistribution {
    fn default() -> Self {
        LatencyDistribution::Fixed { ticks: 1 }
    }
}

/// Broker spec (§3, §6): leverage, lot bounds, commission model, and
/// supported order types. Parsed from `configs/brokers/<collector>/*.json`
/// by [`crate::error::ExecutionError`]-free `serde_json` deserialization
/// in `finiex-data`; this type owns the shape so both crates agree on it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BrokerSpec {
    pub name: SmolStr,
    pub leverage: Decimal,
    pub account_currency: SmolStr,
    pub commission_per_lot: Decimal,
    pub min_lots: Decimal,
    pub max_lots: Decimal,
    pub lot_step: Decimal,
    pub digits: u32,
    pub tick_size: Decimal,
    pub spread_points: Decimal,
    pub contract_size: Decimal,
    pub pip_value_per_lot: Decimal,
    pub supported_order_types: Vec<OrderType>,
    #[serde(default)]
    pub latency_distribution: LatencyDistribution,
    #[serde(default = "default_max_pending_age_ticks")]
    pub max_pending_age_ticks: u64,
}

fn default_max_pending_age_ticks() -> u64 {
    50
}

impl BrokerSpec {
    pub fn supports(&self, order_type: OrderType) -> bool {
        self.supported_order_types.contains(&order_type)
    }

    /// Snap `lots` to the broker's lot step, rounding down, matching how
    /// real brokers truncate fractional lots rather than rejecting them
    /// outright. Validation of the bounds themselves happens in
    /// [`crate::risk`].
    pub fn round_to_lot_step(&self, lots: Decimal) -> Decimal {
        if self.lot_step.is_zero() {
            return lots;
        }
        (lots / self.lot_step).trunc() * self.lot_step
    }
}
