use crate::worker::{BarView, Worker, WorkerResult};
use finiex_core::{Bar, Tick, Timeframe};
use rust_decimal::prelude::ToPrimitive;
use smol_str::SmolStr;
use std::collections::{HashMap, VecDeque};

/// Moving-average envelope band worker (§4.7.1): `mid = SMA(close,
/// period)`, `upper/lower = mid * (1 ± pct)`, `envelope_position = (price
/// - lower) / (upper - lower)` clamped to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct EnvelopeWorker {
    name: SmolStr,
    timeframe: Timeframe,
    period: usize,
    pct: f64,
    closes: VecDeque<f64>,
}

impl EnvelopeWorker {
    pub fn new(name: impl Into<SmolStr>, timeframe: Timeframe, period: usize, pct: f64) -> Self {
        Self {
            name: name.into(),
            timeframe,
            period,
            pct,
            closes: VecDeque::with_capacity(period),
        }
    }

    fn push_close(&mut self, close: f64) {
        self.closes.push_back(close);
        while self.closes.len() > self.period {
            self.closes.pop_front();
        }
    }

    fn sma(&self) -> Option<f64> {
        if self.closes.len() < self.period {
            return None;
        }
        Some(self.closes.iter().sum::<f64>() / self.period as f64)
    }

    fn envelope_position(&self, price: f64, mid: f64) -> f64 {
        let upper = mid * (1.0 + self.pct);
        let lower = mid * (1.0 - self.pct);
        if (upper - lower).abs() < f64::EPSILON {
            return 0.5;
        }
        ((price - lower) / (upper - lower)).clamp(0.0, 1.0)
    }
}

fn to_f64(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

impl Worker for EnvelopeWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_timeframes(&self) -> Vec<Timeframe> {
        vec![self.timeframe]
    }

    fn warmup_bars(&self, timeframe: Timeframe) -> usize {
        if timeframe == self.timeframe {
            self.period
        } else {
            0
        }
    }

    fn on_warmup(&mut self, bars_by_timeframe: &HashMap<Timeframe, Vec<Bar>>) {
        if let Some(bars) = bars_by_timeframe.get(&self.timeframe) {
            for bar in bars {
                self.push_close(to_f64(bar.close));
            }
        }
    }

    fn compute(&mut self, _tick: &Tick, bars_by_timeframe: &HashMap<Timeframe, BarView<'_>>) -> WorkerResult {
        let close = bars_by_timeframe
            .get(&self.timeframe)
            .and_then(|view| view.current)
            .map(|bar| to_f64(bar.close));

        if let Some(close) = close {
            self.push_close(close);
        }

        let sma = self.sma();

        let position = match (sma, close) {
            (Some(mid), Some(price)) => Some(self.envelope_position(price, mid)),
            _ => None,
        };

        WorkerResult {
            worker_name: self.name.clone(),
            value: position.unwrap_or(0.5),
            confidence: position.map(|p| (p - 0.5).abs() * 2.0).unwrap_or(0.0),
            computation_time_ms: 0.0,
            is_stale: position.is_none(),
        }
    }
}
