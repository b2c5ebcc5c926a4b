use finiex_core::{Bar, Tick, Timeframe};
use finiex_strategy::BarView;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::collections::HashMap;

/// One timeframe's rolling bar state: the bar currently forming (if any)
/// plus the completed-bar history preceding it, oldest first.
#[derive(Debug, Clone, Default)]
struct TimeframeState {
    current: Option<Bar>,
    history: Vec<Bar>,
}

/// Renders per-tick OHLC bars across a fixed set of timeframes (§4.5).
///
/// Owns all bar storage; workers only ever see it through a lent
/// [`BarView`] constructed fresh each tick, never a clone.
#[derive(Debug, Clone, Default)]
pub struct BarController {
    timeframes: Vec<Timeframe>,
    states: HashMap<Timeframe, TimeframeState>,
}

impl BarController {
    /// Build a controller rendering exactly `timeframes`, deduplicated.
    pub fn new(timeframes: impl IntoIterator<Item = Timeframe>) -> Self {
        let mut seen = Vec::new();
        for tf in timeframes {
            if !seen.contains(&tf) {
                seen.push(tf);
            }
        }
        let states = seen.iter().map(|tf| (*tf, TimeframeState::default())).collect();
        Self {
            timeframes: seen,
            states,
        }
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    /// Seed completed-bar history ahead of the tick loop, one vector per
    /// timeframe this controller renders. Bars for timeframes this
    /// controller doesn't render are ignored.
    pub fn inject_warmup(&mut self, bars_by_timeframe: HashMap<Timeframe, Vec<Bar>>) {
        for (tf, mut bars) in bars_by_timeframe {
            if let Some(state) = self.states.get_mut(&tf) {
                bars.sort_by_key(|b| b.timestamp);
                state.history = bars;
            }
        }
    }

    /// Fold one tick into every rendered timeframe, returning a read-only
    /// view of each timeframe's current bar and history.
    ///
    /// Per timeframe: align the tick to its bar-open boundary; if that's
    /// later than the currently-forming bar's open, close the current bar
    /// (synthesizing any skipped bars in between, e.g. across a weekend
    /// gap) and open a new one; otherwise fold the tick into the bar
    /// already forming.
    pub fn on_tick(&mut self, tick: &Tick) -> HashMap<Timeframe, BarView<'_>> {
        let mid = tick.mid();
        let volume = tick.volume.unwrap_or(Decimal::ZERO);

        for tf in self.timeframes.clone() {
            let bar_open = tf.align_bar_open(tick.timestamp);
            let state = self.states.get_mut(&tf).expect("state exists for every registered timeframe");

            match &mut state.current {
                None => {
                    state.current = Some(Bar::open_real(tick.symbol.clone(), tf, bar_open, mid, volume));
                }
                Some(current) if bar_open > current.timestamp => {
                    close_and_advance(state, tf, tick.symbol.clone(), bar_open, mid, volume);
                }
                Some(current) => {
                    current.update(mid, volume);
                }
            }
        }

        self.timeframes
            .iter()
            .map(|tf| {
                let state = &self.states[tf];
                (
                    *tf,
                    BarView {
                        current: state.current.as_ref(),
                        history: &state.history,
                    },
                )
            })
            .collect()
    }
}

/// Finalize the bar currently forming in `state`, synthesize any bars
/// skipped between its open and `bar_open` (a gap wider than one bar,
/// e.g. a weekend), then open a new real bar at `bar_open`.
fn close_and_advance(
    state: &mut TimeframeState,
    tf: Timeframe,
    symbol: SmolStr,
    bar_open: chrono::DateTime<chrono::Utc>,
    mid: Decimal,
    volume: Decimal,
) {
    let mut finished = state.current.take().expect("caller only invokes this with a current bar");
    finished.is_complete = true;
    let last_close = finished.close;
    let mut cursor = finished.timestamp;
    state.history.push(finished);

    let step = chrono::TimeDelta::minutes(tf.minutes());
    loop {
        cursor += step;
        if cursor >= bar_open {
            break;
        }
        state
            .history
            .push(Bar::synthetic(symbol.clone(), tf, cursor, last_close));
    }

    state.current = Some(Bar::open_real(symbol, tf, bar_open, mid, volume));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn tick(ts: chrono::DateTime<Utc>, bid: Decimal, ask: Decimal) -> Tick {
        Tick::new(ts, "EURUSD", bid, ask, Some(dec!(1))).unwrap()
    }

    #[test]
    fn first_tick_opens_a_bar_per_timeframe() {
        let mut controller = BarController::new([Timeframe::M1, Timeframe::M5]);
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 3, 0).unwrap();

        let views = controller.on_tick(&tick(t0, dec!(1.1000), dec!(1.1002)));

        assert_eq!(views[&Timeframe::M1].current.unwrap().open, dec!(1.1001));
        assert_eq!(views[&Timeframe::M5].current.unwrap().timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert!(views[&Timeframe::M1].history.is_empty());
    }

    #[test]
    fn crossing_a_boundary_closes_and_opens_a_new_bar() {
        let mut controller = BarController::new([Timeframe::M1]);
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 10).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 1, 5).unwrap();

        controller.on_tick(&tick(t0, dec!(1.1000), dec!(1.1002)));
        let views = controller.on_tick(&tick(t1, dec!(1.1010), dec!(1.1012)));

        let view = &views[&Timeframe::M1];
        assert_eq!(view.history.len(), 1);
        assert!(view.history[0].is_complete);
        assert_eq!(view.current.unwrap().timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 10, 1, 0).unwrap());
    }

    #[test]
    fn a_multi_bar_gap_is_filled_with_synthetic_bars() {
        let mut controller = BarController::new([Timeframe::M1]);
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 3, 0).unwrap();

        controller.on_tick(&tick(t0, dec!(1.1000), dec!(1.1002)));
        let views = controller.on_tick(&tick(t1, dec!(1.1010), dec!(1.1012)));

        let view = &views[&Timeframe::M1];
        assert_eq!(view.history.len(), 3);
        assert!(!view.history[0].bar_type.eq(&finiex_core::BarType::Synthetic));
        assert!(view.history[1].bar_type.eq(&finiex_core::BarType::Synthetic));
        assert!(view.history[2].bar_type.eq(&finiex_core::BarType::Synthetic));
        assert_eq!(view.history[1].close, dec!(1.1001));
        assert_eq!(view.current.unwrap().timestamp, t1);
    }

    #[test]
    fn inject_warmup_seeds_history_before_first_tick() {
        let mut controller = BarController::new([Timeframe::M1]);
        let warmup_bar = Bar::synthetic(SmolStr::new("EURUSD"), Timeframe::M1, Utc.with_ymd_and_hms(2024, 1, 1, 9, 59, 0).unwrap(), dec!(1.0999));

        let mut seed = HashMap::new();
        seed.insert(Timeframe::M1, vec![warmup_bar.clone()]);
        controller.inject_warmup(seed);

        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let views = controller.on_tick(&tick(t0, dec!(1.1000), dec!(1.1002)));

        assert_eq!(views[&Timeframe::M1].history, &[warmup_bar]);
    }
}
