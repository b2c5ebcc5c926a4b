use crate::{
    statistic::{
        metric::drawdown::{max::MaxDrawdownGenerator, mean::MeanDrawdownGenerator, DrawdownGenerator},
        summary::{PositionSummariser, TableBuilder},
    },
    Timed,
};
use chrono::{DateTime, Utc};
use finiex_execution::Position;
use prettytable::{row, Row};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Tracks running equity (starting balance plus cumulative realized PnL of
/// closed positions) and the max/mean drawdown derived from its peaks and
/// troughs (§4.8.5).
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct DrawdownSummary {
    equity: f64,
    generator: DrawdownGenerator,
    max: MaxDrawdownGenerator,
    mean: MeanDrawdownGenerator,
}

impl DrawdownSummary {
    pub fn new(starting_equity: f64, start_time: DateTime<Utc>) -> Self {
        Self {
            equity: starting_equity,
            generator: DrawdownGenerator::init(Timed::new(starting_equity, start_time)),
            max: MaxDrawdownGenerator::default(),
            mean: MeanDrawdownGenerator::default(),
        }
    }
}

impl PositionSummariser for DrawdownSummary {
    fn update(&mut self, position: &Position) {
        let (Some(realized_pnl), Some(close_time)) = (position.realized_pnl, position.close_time) else {
            return;
        };

        self.equity += realized_pnl.to_f64().unwrap_or(0.0);

        if let Some(ended_drawdown) = self.generator.update(Timed::new(self.equity, close_time)) {
            self.max.update(&ended_drawdown);
            self.mean.update(&ended_drawdown);
        }
    }
}

impl TableBuilder for DrawdownSummary {
    fn titles(&self) -> Row {
        row![
            "Max Drawdown",
            "Max Drawdown Days",
            "Avg. Drawdown",
            "Avg. Drawdown Days",
        ]
    }

    fn row(&self) -> Row {
        let max = self.max.generate();
        let mean = self.mean.generate();

        row![
            format!("{:.3}", max.map(|m| m.0.value).unwrap_or(0.0)),
            max.map(|m| m.0.duration().num_days()).unwrap_or(0).to_string(),
            format!("{:.3}", mean.map(|m| m.mean_drawdown).unwrap_or(0.0)),
            mean.map(|m| m.mean_drawdown_ms / 86_400_000).unwrap_or(0).to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finiex_execution::{CloseReason, Direction};
    use rust_decimal_macros::dec;

    fn closed(realized_pnl: rust_decimal::Decimal, close_time: DateTime<Utc>) -> Position {
        Position {
            position_id: 1,
            symbol: "EURUSD".into(),
            direction: Direction::Buy,
            lots: dec!(1),
            open_price: dec!(1.1),
            open_time: close_time,
            current_price: dec!(1.1),
            unrealized_pnl: dec!(0),
            swap: dec!(0),
            commission: dec!(0),
            close_price: Some(dec!(1.1)),
            close_time: Some(close_time),
            close_reason: Some(CloseReason::Signal),
            realized_pnl: Some(realized_pnl),
        }
    }

    #[test]
    fn update_ignores_open_positions() {
        let start = DateTime::<Utc>::MIN_UTC;
        let mut summary = DrawdownSummary::new(1000.0, start);

        let mut open = closed(dec!(100), start);
        open.close_time = None;

        summary.update(&open);
        assert_eq!(summary.equity, 1000.0);
    }

    #[test]
    fn update_tracks_equity_and_emits_drawdown_on_new_peak() {
        let start = DateTime::<Utc>::MIN_UTC;
        let mut summary = DrawdownSummary::new(1000.0, start);

        summary.update(&closed(dec!(-200), start + chrono::TimeDelta::days(1)));
        summary.update(&closed(dec!(500), start + chrono::TimeDelta::days(2)));

        assert_eq!(summary.equity, 1300.0);
        assert!(summary.max.generate().is_some());
    }
}
