//! Live-stats coordinator (§4.11): a bounded, non-blocking multi-producer
//! single-consumer queue carrying status/progress telemetry out of the
//! tick loop. Scenario processes are producers; a display/UI is the
//! consumer. Enqueue never blocks the tick loop: a full queue silently
//! drops the message.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::time::Instant;

/// Coarse-grained lifecycle status of a scenario (§4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioStatus {
    Initialized,
    WarmupCoverage,
    WarmupDataTicks,
    WarmupDataBars,
    WarmupTrader,
    InitProcess,
    Running,
    Completed,
    FinishedWithError,
}

/// A lightweight snapshot of portfolio state, cheap enough to clone onto
/// the live queue every `update_interval_sec`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PortfolioSnapshot {
    pub balance: Decimal,
    pub equity: Decimal,
    pub open_positions: usize,
}

/// A lightweight snapshot of running performance, cheap enough to clone
/// onto the live queue every `update_interval_sec`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct PerformanceSnapshot {
    pub win_rate: f64,
    pub profit_factor: f64,
}

/// One message on the live-stats queue (§4.11).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveStatsMessage {
    Status {
        scenario_index: usize,
        scenario_name: SmolStr,
        status: ScenarioStatus,
    },
    Progress {
        scenario_index: usize,
        ticks_processed: u64,
        total_ticks: u64,
        progress_percent: f64,
        current_tick_time: chrono::DateTime<chrono::Utc>,
        portfolio_snapshot: Option<PortfolioSnapshot>,
        performance_snapshot: Option<PerformanceSnapshot>,
    },
}

/// Producer handle for one scenario, owning the throttling state for
/// `update_interval_sec` (§4.11). Cloning the underlying
/// `tokio::sync::mpsc::Sender` is cheap; each scenario gets its own
/// `LiveStatsProducer` wrapping a clone of the shared sender.
#[derive(Debug)]
pub struct LiveStatsProducer {
    sender: tokio::sync::mpsc::Sender<LiveStatsMessage>,
    scenario_index: usize,
    scenario_name: SmolStr,
    update_interval_sec: f64,
    last_sent: Option<Instant>,
}

impl LiveStatsProducer {
    pub fn new(sender: tokio::sync::mpsc::Sender<LiveStatsMessage>, scenario_index: usize, scenario_name: SmolStr, update_interval_sec: f64) -> Self {
        Self {
            sender,
            scenario_index,
            scenario_name,
            update_interval_sec,
            last_sent: None,
        }
    }

    /// Enqueue a status transition. Status updates are rare (lifecycle
    /// events, not per-tick) so they bypass the progress throttle.
    pub fn status(&self, status: ScenarioStatus) {
        self.try_send(LiveStatsMessage::Status {
            scenario_index: self.scenario_index,
            scenario_name: self.scenario_name.clone(),
            status,
        });
    }

    /// Enqueue a progress update, throttled to at most once per
    /// `update_interval_sec`. Called every tick; most calls are no-ops.
    pub fn progress(
        &mut self,
        ticks_processed: u64,
        total_ticks: u64,
        current_tick_time: chrono::DateTime<chrono::Utc>,
        portfolio_snapshot: Option<PortfolioSnapshot>,
        performance_snapshot: Option<PerformanceSnapshot>,
    ) {
        let now = Instant::now();
        let due = match self.last_sent {
            None => true,
            Some(last) => now.duration_since(last).as_secs_f64() >= self.update_interval_sec,
        };
        if !due {
            return;
        }
        self.last_sent = Some(now);

        let progress_percent = if total_ticks == 0 { 100.0 } else { (ticks_processed as f64 / total_ticks as f64) * 100.0 };

        self.try_send(LiveStatsMessage::Progress {
            scenario_index: self.scenario_index,
            ticks_processed,
            total_ticks,
            progress_percent,
            current_tick_time,
            portfolio_snapshot,
            performance_snapshot,
        });
    }

    /// Best-effort final update attempted right before the scenario
    /// process exits (§4.11), bypassing the throttle unconditionally.
    pub fn final_progress(
        &mut self,
        ticks_processed: u64,
        total_ticks: u64,
        current_tick_time: chrono::DateTime<chrono::Utc>,
        portfolio_snapshot: Option<PortfolioSnapshot>,
        performance_snapshot: Option<PerformanceSnapshot>,
    ) {
        self.last_sent = None;
        self.progress(ticks_processed, total_ticks, current_tick_time, portfolio_snapshot, performance_snapshot);
    }

    /// Non-blocking enqueue (§5 "non-blocking `try_send`"); a full queue
    /// silently drops the message, since telemetry must never slow down
    /// the tick loop.
    fn try_send(&self, message: LiveStatsMessage) {
        if let Err(error) = self.sender.try_send(message) {
            tracing::debug!(scenario = %self.scenario_name, %error, "live-stats queue full, dropping telemetry");
        }
    }
}

/// Build the bounded live-stats channel shared by every scenario in a
/// batch (§4.11, §5 "the live queue is the only writable shared
/// resource").
pub fn channel(capacity: usize) -> (tokio::sync::mpsc::Sender<LiveStatsMessage>, tokio::sync::mpsc::Receiver<LiveStatsMessage>) {
    tokio::sync::mpsc::channel(capacity.max(1))
}
