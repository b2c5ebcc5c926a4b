use crate::order::{Direction, OrderType, RejectionReason};
use derive_more::Constructor;
use rust_decimal::Decimal;

/// General interface for implementing a single order-validation check,
/// grounded in the teacher's `risk::check::RiskCheck` trait: each check is
/// composable and produces a single named rejection reason rather than an
/// inline `if`-chain (§4.8.6).
pub trait RiskCheck {
    type Input;

    fn name(&self) -> &'static str;
    fn check(&self, input: &Self::Input) -> Result<(), RejectionReason>;
}

/// Validates `min_lots <= lots <= max_lots`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct LotBoundsCheck {
    pub min_lots: Decimal,
    pub max_lots: Decimal,
}

impl RiskCheck for LotBoundsCheck {
    type Input = Decimal;

    fn name(&self) -> &'static str {
        "LotBoundsCheck"
    }

    fn check(&self, lots: &Decimal) -> Result<(), RejectionReason> {
        if *lots <= Decimal::ZERO || *lots < self.min_lots || *lots > self.max_lots {
            Err(RejectionReason::InvalidLots)
        } else {
            Ok(())
        }
    }
}

/// Validates that `required_margin <= free_margin` (§4.8.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Constructor)]
pub struct MarginCheck {
    pub free_margin: Decimal,
}

impl RiskCheck for MarginCheck {
    type Input = Decimal;

    fn name(&self) -> &'static str {
        "MarginCheck"
    }

    fn check(&self, required_margin: &Decimal) -> Result<(), RejectionReason> {
        if self.free_margin < *required_margin {
            Err(RejectionReason::InsufficientMargin)
        } else {
            Ok(())
        }
    }
}

/// Input to [`OrderPriceCheck`]: the requested price (if any) and the
/// current top-of-book the order is being validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceCheckInput {
    pub order_type: OrderType,
    pub direction: Direction,
    pub requested_price: Option<Decimal>,
    pub current_bid: Decimal,
    pub current_ask: Decimal,
}

/// Validates the order-type/direction/price invariants in §3: `LIMIT` BUY
/// requires `requested_price <= current ask`, `STOP` BUY requires
/// `requested_price >= current ask`, symmetric for SELL. `MARKET` orders
/// carry no requested price and always pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Constructor)]
pub struct OrderPriceCheck;

impl RiskCheck for OrderPriceCheck {
    type Input = PriceCheckInput;

    fn name(&self) -> &'static str {
        "OrderPriceCheck"
    }

    fn check(&self, input: &PriceCheckInput) -> Result<(), RejectionReason> {
        let requested = match input.order_type {
            OrderType::Market => return Ok(()),
            OrderType::Limit | OrderType::Stop | OrderType::StopLimit => match input.requested_price {
                Some(price) => price,
                None => return Err(RejectionReason::InvalidPrice),
            },
        };

        let valid = match (input.order_type, input.direction) {
            (OrderType::Limit, Direction::Buy) => requested <= input.current_ask,
            (OrderType::Limit, Direction::Sell) => requested >= input.current_bid,
            (OrderType::Stop, Direction::Buy) => requested >= input.current_ask,
            (OrderType::Stop, Direction::Sell) => requested <= input.current_bid,
            // STOP_LIMIT validates as a STOP on submission; it converts to
            // a LIMIT of the same price only once the stop triggers
            // (§4.8.2), so the submission-time invariant mirrors STOP.
            (OrderType::StopLimit, Direction::Buy) => requested >= input.current_ask,
            (OrderType::StopLimit, Direction::Sell) => requested <= input.current_bid,
            (OrderType::Market, _) => true,
        };

        if valid {
            Ok(())
        } else {
            Err(RejectionReason::InvalidPrice)
        }
    }
}

/// Calculates the notional value in quote currency given lots, price, and
/// contract size. Grounded in the teacher's
/// `risk::check::util::calculate_quote_notional`.
pub fn calculate_notional(lots: Decimal, price: Decimal, contract_size: Decimal) -> Option<Decimal> {
    lots.checked_mul(price)?.checked_mul(contract_size)
}

/// Required margin for opening a position: `lots * contract_size * price /
/// leverage` (§4.8.1).
pub fn calculate_required_margin(
    lots: Decimal,
    contract_size: Decimal,
    price: Decimal,
    leverage: Decimal,
) -> Option<Decimal> {
    if leverage.is_zero() {
        return None;
    }
    calculate_notional(lots, price, contract_size)?.checked_div(leverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_lot_bounds_check() {
        let check = LotBoundsCheck::new(dec!(0.01), dec!(10));

        assert!(check.check(&dec!(0.1)).is_ok());
        assert_eq!(check.check(&dec!(0)), Err(RejectionReason::InvalidLots));
        assert_eq!(check.check(&dec!(11)), Err(RejectionReason::InvalidLots));
        assert_eq!(check.check(&dec!(0.001)), Err(RejectionReason::InvalidLots));
    }

    #[test]
    fn test_margin_check() {
        let check = MarginCheck::new(dec!(1000));
        assert!(check.check(&dec!(999)).is_ok());
        assert_eq!(check.check(&dec!(1000.01)), Err(RejectionReason::InsufficientMargin));
    }

    #[test]
    fn test_order_price_check_limit_buy() {
        let check = OrderPriceCheck;
        let base = PriceCheckInput {
            order_type: OrderType::Limit,
            direction: Direction::Buy,
            requested_price: Some(dec!(1.1000)),
            current_bid: dec!(1.1010),
            current_ask: dec!(1.1012),
        };

        assert!(check.check(&base).is_ok());

        let invalid = PriceCheckInput {
            requested_price: Some(dec!(1.1020)),
            ..base
        };
        assert_eq!(check.check(&invalid), Err(RejectionReason::InvalidPrice));
    }

    #[test]
    fn test_calculate_required_margin() {
        let margin = calculate_required_margin(dec!(1), dec!(100000), dec!(1.10), dec!(100)).unwrap();
        assert_eq!(margin, dec!(1100));
    }
}
