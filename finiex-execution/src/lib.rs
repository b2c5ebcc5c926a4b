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

//! Order/Position/Portfolio model and the broker simulator (§4.8).

pub mod broker;
pub mod broker_spec;
pub mod error;
pub mod order;
pub mod portfolio;
pub mod position;
pub mod risk;
pub mod stress;

pub use broker::BrokerSimulator;
pub use broker_spec::{BrokerSpec, LatencyDistribution};
pub use error::ExecutionError;
pub use order::{Direction, Order, OrderResult, OrderStatus, OrderType, RejectionReason};
pub use portfolio::Portfolio;
pub use position::{CloseReason, Position};
pub use stress::StressTestConfig;
