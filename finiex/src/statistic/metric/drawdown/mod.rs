use crate::Timed;
use chrono::{DateTime, TimeDelta, Utc};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

pub mod max;
pub mod mean;

/// [`Drawdown`] is the peak-to-trough decline of a value during a specific period. Drawdown is
/// a measure of downside volatility.
///
/// Example use cases are:
///  - Portfolio PnL
///  - Strategy PnL
///  - Instrument PnL
///  - Asset equity
///
/// See documentation: <https://www.investopedia.com/terms/d/drawdown.asp>
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct Drawdown {
    pub value: f64,
    pub time_start: DateTime<Utc>,
    pub time_end: DateTime<Utc>,
}

impl Drawdown {
    /// Time period of the [`Drawdown`].
    pub fn duration(&self) -> TimeDelta {
        self.time_end.signed_duration_since(self.time_start)
    }
}

/// [`Drawdown`] generator.
///
/// See documentation: <https://www.investopedia.com/terms/d/drawdown.asp>
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct DrawdownGenerator {
    pub peak: f64,
    pub drawdown_max: f64,
    pub time_peak: DateTime<Utc>,
    pub time_now: DateTime<Utc>,
}

impl DrawdownGenerator {
    /// Initialise a [`DrawdownGenerator`] from an initial [`Timed`] value.
    pub fn init(point: Timed<f64>) -> Self {
        Self {
            peak: point.value,
            drawdown_max: 0.0,
            time_peak: point.time,
            time_now: point.time,
        }
    }

    /// Updates the internal [`DrawdownGenerator`] state using the latest [`Timed`] value.
    ///
    /// If the drawdown period has ended (ie/ investment recovers from a trough back above the
    /// previous peak), the functions returns Some(Drawdown), else None is returned.
    pub fn update(&mut self, point: Timed<f64>) -> Option<Drawdown> {
        self.time_now = point.time;

        if point.value > self.peak {
            // Only emit a Drawdown if one actually occurred
            // For example, if we've only ever increased the peak then we don't want to emit
            let ended_drawdown = self.generate();

            // Reset parameters (even if we didn't emit, as we have a new peak)
            self.peak = point.value;
            self.drawdown_max = 0.0;
            self.time_peak = point.time;

            ended_drawdown
        } else {
            // Calculate current drawdown at this instant
            let drawdown_current = (self.peak - point.value) / self.peak;

            // Replace "max drawdown in period" if current drawdown is larger
            if drawdown_current > self.drawdown_max {
                self.drawdown_max = drawdown_current;
            }

            None
        }
    }

    /// Generates the current [`Drawdown`] at this instant, if it is non-zero.
    pub fn generate(&self) -> Option<Drawdown> {
        (self.drawdown_max != 0.0).then_some(Drawdown {
            value: self.drawdown_max,
            time_start: self.time_peak,
            time_end: self.time_now,
        })
    }
}
