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

//! Tick/Bar/Timeframe data model shared by every other crate in the
//! workspace. Nothing in here touches I/O, concurrency, or strategy logic.

/// Timeframe registry and bar-open alignment.
pub mod timeframe;

/// Tick and Bar data types, with their invariants enforced in constructors.
pub mod tick;

/// Shared error primitives for malformed tick/bar data.
pub mod error;

pub use error::CoreError;
pub use tick::{Bar, BarType, Tick};
pub use timeframe::Timeframe;

use chrono::{DateTime, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// A value paired with the time it was observed or produced.
///
/// Mirrors the teacher's `Timed<T>` wrapper used throughout the statistics
/// package to track when a data point occurred.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize, Constructor,
)]
pub struct Timed<T> {
    pub value: T,
    pub time: DateTime<Utc>,
}
