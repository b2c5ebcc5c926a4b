#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! Columnar tick/bar index, requirements collector, shared data
//! preparator, and broker/scenario-set config loaders (§4.2-§4.4, §4.13).
//! Everything here runs before a scenario's tick loop starts; nothing in
//! this crate is on the hot path.

pub mod config;
pub mod error;
pub mod index;
pub mod package;
pub mod preparator;
pub mod rebuild;
pub mod requirements;
pub mod scenario;

pub use config::{
    load_broker_spec, load_scenario_set, DecisionLogicConfigOverride, ExecutionConfigOverride, GlobalConfig,
    ScenarioOverride, ScenarioSetConfig, WorkerConfigOverride,
};
pub use error::DataError;
pub use index::{BarIndex, FileEntry, TickIndex};
pub use package::ProcessDataPackage;
pub use preparator::prepare_scenario_data;
pub use rebuild::{bar_index_status, rebuild_bar_index, rebuild_tick_index, tick_index_status, IndexStatus};
pub use requirements::{collect_requirements, BarRequirement, RequirementsMap, TickRequirement};
pub use scenario::{DataMode, ExecutionConfig, Scenario, StrategyConfig};
