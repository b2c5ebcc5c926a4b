use crate::worker::{BarView, Worker, WorkerResult};
use finiex_core::{Bar, Tick, Timeframe};
use rust_decimal::prelude::ToPrimitive;
use smol_str::SmolStr;
use std::collections::HashMap;

/// Wilder's smoothed RSI over bar closes (§4.7.1).
#[derive(Debug, Clone)]
pub struct RsiWorker {
    name: SmolStr,
    timeframe: Timeframe,
    period: usize,
    oversold: f64,
    overbought: f64,
    prev_close: Option<f64>,
    avg_gain: f64,
    avg_loss: f64,
    bars_observed: usize,
}

impl RsiWorker {
    pub fn new(name: impl Into<SmolStr>, timeframe: Timeframe, period: usize, oversold: f64, overbought: f64) -> Self {
        Self {
            name: name.into(),
            timeframe,
            period,
            oversold,
            overbought,
            prev_close: None,
            avg_gain: 0.0,
            avg_loss: 0.0,
            bars_observed: 0,
        }
    }

    fn fold_bar(&mut self, close: f64) {
        if let Some(prev) = self.prev_close {
            let change = close - prev;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);

            if self.bars_observed < self.period {
                self.avg_gain += gain;
                self.avg_loss += loss;
            } else if self.bars_observed == self.period {
                self.avg_gain = (self.avg_gain + gain) / self.period as f64;
                self.avg_loss = (self.avg_loss + loss) / self.period as f64;
            } else {
                self.avg_gain = (self.avg_gain * (self.period - 1) as f64 + gain) / self.period as f64;
                self.avg_loss = (self.avg_loss * (self.period - 1) as f64 + loss) / self.period as f64;
            }

            self.bars_observed += 1;
        }

        self.prev_close = Some(close);
    }

    fn rsi(&self) -> Option<f64> {
        if self.bars_observed < self.period {
            return None;
        }

        if self.avg_loss == 0.0 {
            return Some(100.0);
        }

        let rs = self.avg_gain / self.avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }

    fn extremity(&self, rsi: f64) -> f64 {
        if rsi <= self.oversold {
            ((self.oversold - rsi) / self.oversold).max(0.0)
        } else if rsi >= self.overbought {
            ((rsi - self.overbought) / (100.0 - self.overbought)).max(0.0)
        } else {
            0.0
        }
    }
}

fn to_f64(value: rust_decimal::Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

impl Worker for RsiWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_timeframes(&self) -> Vec<Timeframe> {
        vec![self.timeframe]
    }

    fn warmup_bars(&self, timeframe: Timeframe) -> usize {
        if timeframe == self.timeframe {
            self.period + 1
        } else {
            0
        }
    }

    fn on_warmup(&mut self, bars_by_timeframe: &HashMap<Timeframe, Vec<Bar>>) {
        if let Some(bars) = bars_by_timeframe.get(&self.timeframe) {
            for bar in bars {
                self.fold_bar(to_f64(bar.close));
            }
        }
    }

    fn compute(&mut self, _tick: &Tick, bars_by_timeframe: &HashMap<Timeframe, BarView<'_>>) -> WorkerResult {
        let close = bars_by_timeframe
            .get(&self.timeframe)
            .and_then(|view| view.current)
            .map(|bar| to_f64(bar.close));

        if let Some(close) = close {
            self.fold_bar(close);
        }

        let rsi = self.rsi();

        WorkerResult {
            worker_name: self.name.clone(),
            value: rsi.unwrap_or(50.0),
            confidence: rsi.map(|r| self.extremity(r)).unwrap_or(0.0),
            computation_time_ms: 0.0,
            is_stale: rsi.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finiex_core::BarType;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn bar(close: rust_decimal::Decimal) -> Bar {
        Bar {
            symbol: SmolStr::new("EURUSD"),
            timeframe: Timeframe::M5,
            timestamp: Utc::now(),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(0),
            tick_count: 1,
            is_complete: true,
            bar_type: BarType::Real,
        }
    }

    #[test]
    fn test_rsi_stale_until_warmup() {
        let mut worker = RsiWorker::new("rsi", Timeframe::M5, 14, 30.0, 70.0);
        let warmup = vec![bar(dec!(1.1000)), bar(dec!(1.1010))];
        let mut by_tf = HashMap::new();
        by_tf.insert(Timeframe::M5, warmup);
        worker.on_warmup(&by_tf);

        assert!(worker.rsi().is_none());
    }

    #[test]
    fn test_rsi_monotonic_gains_saturate_near_100() {
        let mut worker = RsiWorker::new("rsi", Timeframe::M5, 14, 30.0, 70.0);
        let warmup: Vec<Bar> = (0..20).map(|i| bar(dec!(1.1000) + rust_decimal::Decimal::new(i, 4))).collect();
        let mut by_tf = HashMap::new();
        by_tf.insert(Timeframe::M5, warmup);
        worker.on_warmup(&by_tf);

        let rsi = worker.rsi().unwrap();
        assert!(rsi > 90.0, "expected RSI near 100 for monotonic gains, got {rsi}");
    }
}
