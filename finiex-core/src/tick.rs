use crate::{error::CoreError, timeframe::Timeframe};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A single market tick: `{timestamp, symbol, bid, ask, volume?}` (§3).
///
/// Construction enforces `bid > 0` and `ask ≥ bid`; callers that stream
/// ticks in from the columnar store are expected to validate once at the
/// boundary via [`Tick::new`] rather than trusting the file contents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    pub symbol: SmolStr,
    pub bid: Decimal,
    pub ask: Decimal,
    pub volume: Option<Decimal>,
}

impl Tick {
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: impl Into<SmolStr>,
        bid: Decimal,
        ask: Decimal,
        volume: Option<Decimal>,
    ) -> Result<Self, CoreError> {
        let symbol = symbol.into();

        if bid <= Decimal::ZERO {
            return Err(CoreError::NonPositiveBid {
                symbol,
                bid: bid.to_string(),
            });
        }

        if ask < bid {
            return Err(CoreError::AskBelowBid {
                symbol,
                bid: bid.to_string(),
                ask: ask.to_string(),
            });
        }

        Ok(Self {
            timestamp,
            symbol,
            bid,
            ask,
            volume,
        })
    }

    /// Mid price: `(bid + ask) / 2`.
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// How a [`Bar`] came to exist.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub enum BarType {
    /// Rendered directly from ticks.
    Real,
    /// Synthesized to fill a gap (weekend/holiday); OHLC = last known
    /// close, `tick_count = 0`.
    Synthetic,
    /// Started as real, completed with synthetic fill (not currently
    /// produced by the controller, but representable on the wire per the
    /// consumed bar store's column contract, §6).
    Hybrid,
}

/// An OHLC bar for one symbol/timeframe (§3).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Bar {
    pub symbol: SmolStr,
    pub timeframe: Timeframe,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub tick_count: u64,
    pub is_complete: bool,
    pub bar_type: BarType,
}

impl Bar {
    /// A synthetic gap-filler bar: OHLC all equal to `last_close`.
    pub fn synthetic(symbol: SmolStr, timeframe: Timeframe, timestamp: DateTime<Utc>, last_close: Decimal) -> Self {
        Self {
            symbol,
            timeframe,
            timestamp,
            open: last_close,
            high: last_close,
            low: last_close,
            close: last_close,
            volume: Decimal::ZERO,
            tick_count: 0,
            is_complete: true,
            bar_type: BarType::Synthetic,
        }
    }

    /// Open a new real bar from the first tick observed inside it.
    pub fn open_real(symbol: SmolStr, timeframe: Timeframe, timestamp: DateTime<Utc>, mid: Decimal, volume: Decimal) -> Self {
        Self {
            symbol,
            timeframe,
            timestamp,
            open: mid,
            high: mid,
            low: mid,
            close: mid,
            volume,
            tick_count: 1,
            is_complete: false,
            bar_type: BarType::Real,
        }
    }

    /// Fold another tick's mid price into this bar in place.
    pub fn update(&mut self, mid: Decimal, volume: Decimal) {
        if mid > self.high {
            self.high = mid;
        }
        if mid < self.low {
            self.low = mid;
        }
        self.close = mid;
        self.volume += volume;
        self.tick_count += 1;
    }
}
