use serde::{Deserialize, Serialize};

/// Optional stress-test injection config (§4.8.4). All RNG draws used to
/// decide injections come from the scenario-seeded
/// [`rand::rngs::StdRng`](rand::rngs::StdRng) held by the broker
/// simulator, so runs are bit-reproducible given the same seed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct StressTestConfig {
    #[serde(default)]
    pub reject_open_order: RejectOpenOrderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Default)]
pub struct RejectOpenOrderConfig {
    pub enabled: bool,
    /// Probability in `[0, 1]` that an `open_order` call is forced to
    /// REJECTED(`STRESS_TEST_REJECT`) regardless of its own validation.
    pub probability: f64,
}
