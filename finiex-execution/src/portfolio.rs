use crate::position::Position;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Running portfolio state for one scenario (§3). Invariant:
/// `equity = balance + Σ unrealized_pnl` at all times.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Portfolio {
    pub account_currency: SmolStr,
    pub initial_balance: Decimal,
    pub balance: Decimal,
    pub equity: Decimal,
    pub free_margin: Decimal,
    pub used_margin: Decimal,
    pub max_equity: Decimal,
    pub max_drawdown: Decimal,
    pub open_positions: Vec<Position>,
    pub closed_positions: Vec<Position>,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub long_trades: u64,
    pub short_trades: u64,
}

impl Portfolio {
    pub fn new(account_currency: impl Into<SmolStr>, initial_balance: Decimal) -> Self {
        Self {
            account_currency: account_currency.into(),
            initial_balance,
            balance: initial_balance,
            equity: initial_balance,
            free_margin: initial_balance,
            used_margin: Decimal::ZERO,
            max_equity: initial_balance,
            max_drawdown: Decimal::ZERO,
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
            winning_trades: 0,
            losing_trades: 0,
            long_trades: 0,
            short_trades: 0,
        }
    }

    /// Recompute `equity`, `free_margin`, `max_equity`, and
    /// `max_drawdown` from the current open positions and used margin.
    /// Called once per tick after marking positions to market (§4.8.2).
    pub fn recompute(&mut self) {
        let unrealized: Decimal = self.open_positions.iter().map(|p| p.unrealized_pnl).sum();
        self.equity = self.balance + unrealized;
        self.free_margin = self.equity - self.used_margin;

        if self.equity > self.max_equity {
            self.max_equity = self.equity;
        }

        let drawdown = self.max_equity - self.equity;
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
    }

    pub fn record_close(&mut self, position: &Position) {
        let realized = position.realized_pnl.unwrap_or(Decimal::ZERO);
        self.balance += realized;

        if realized.is_sign_positive() && !realized.is_zero() {
            self.winning_trades += 1;
        } else if realized.is_sign_negative() {
            self.losing_trades += 1;
        }

        match position.direction {
            crate::order::Direction::Buy => self.long_trades += 1,
            crate::order::Direction::Sell => self.short_trades += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_recompute_tracks_max_drawdown() {
        let mut portfolio = Portfolio::new("EUR", dec!(10000));
        portfolio.balance = dec!(10500);
        portfolio.recompute();
        assert_eq!(portfolio.equity, dec!(10500));
        assert_eq!(portfolio.max_equity, dec!(10500));
        assert_eq!(portfolio.max_drawdown, dec!(0));

        portfolio.balance = dec!(10200);
        portfolio.recompute();
        assert_eq!(portfolio.max_equity, dec!(10500));
        assert_eq!(portfolio.max_drawdown, dec!(300));

        portfolio.balance = dec!(10800);
        portfolio.recompute();
        assert_eq!(portfolio.max_equity, dec!(10800));
        // Historical max drawdown is retained, not reset by a new peak.
        assert_eq!(portfolio.max_drawdown, dec!(300));
    }
}
