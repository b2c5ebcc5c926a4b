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

//! # finiex
//! Deterministic, tick-level backtesting engine for trading strategies.
//! * Single-tick-at-a-time simulation: bars, workers and decision logic
//!   never see future data.
//! * Strongly typed domain model (`finiex-core`, `finiex-data`,
//!   `finiex-execution`, `finiex-strategy`) shared across scenario
//!   processes as `serde` DTOs.
//! * Adaptive serial/parallel worker dispatch within a tick, coarse-grained
//!   scenario parallelism across a batch.
//! * Comprehensive statistics package (Sharpe, Sortino, Calmar, drawdown,
//!   win rate, profit factor) built from the closed-position history of
//!   each scenario run.

/// Process-wide ambient settings read once from the environment (§4.13).
pub mod app_config;

/// Renders per-tick OHLC bars across a fixed set of timeframes (§4.5).
pub mod bar_controller;

/// Batch execution coordinator: runs many scenarios concurrently while
/// preserving their original order in the reported results (§4.10).
pub mod batch;

/// Adaptive serial/parallel worker dispatch and decision-logic invocation
/// within a single tick (§4.6-4.7).
pub mod coordinator;

/// Crate-wide error type aggregating the per-crate domain errors.
pub mod error;

/// Live-stats coordinator: bounded, non-blocking progress/status telemetry
/// (§4.11).
pub mod live_stats;

/// Scenario-scoped logging: buffers `tracing` output per scenario so
/// concurrently running scenarios never interleave their log lines.
pub mod logging;

/// Single-scenario tick loop: wires the bar controller, worker coordinator
/// and broker together and produces a `ProcessResult`.
pub mod runner;

/// `ProcessResult` and the statistics structs nested inside it (§6).
pub mod result;

pub use finiex_core::Timed;

/// Statistical algorithms for analysing datasets and financial metrics.
///
/// eg/ `PortfolioStats`, `SharpeRatio`, `MaxDrawdown`, etc.
pub mod statistic;
