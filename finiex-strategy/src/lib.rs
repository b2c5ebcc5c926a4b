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

//! Worker/`DecisionLogic` contracts (§4.6-4.7), the two reference indicator
//! workers, and the `SimpleConsensus` reference decision logic.
//!
//! This crate never depends on the scenario process runner: `TradingApi` is
//! the narrow seam the runner implements on top of
//! [`finiex_execution::BrokerSimulator`] so that worker/decision code stays
//! testable without a broker in the loop.

pub mod config;
pub mod consensus;
pub mod decision;
pub mod error;
pub mod worker;
pub mod workers;

pub use config::{build_decision_logic, build_worker, DecisionLogicConfig, WorkerConfig};
pub use consensus::SimpleConsensus;
pub use decision::{Action, Decision, DecisionLogic, TradingApi};
pub use error::StrategyError;
pub use worker::{BarView, Worker, WorkerResult};
pub use workers::{EnvelopeWorker, RsiWorker};
