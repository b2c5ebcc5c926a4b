use crate::decision::{Action, Decision, DecisionLogic, TradingApi};
use crate::worker::WorkerResult;
use chrono::{DateTime, Utc};
use finiex_execution::{Direction, OrderResult, OrderType};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};

/// Reference decision logic (§4.7): RSI + envelope consensus, one position
/// per symbol, reversal-on-opposite-signal. Reads the two named workers'
/// results out of the `worker_results` map passed by the coordinator; the
/// names are whatever the scenario config assigns the [`crate::RsiWorker`]
/// and [`crate::EnvelopeWorker`] instances, so they're supplied at
/// construction rather than hardcoded.
#[derive(Debug, Clone)]
pub struct SimpleConsensus {
    rsi_worker: SmolStr,
    envelope_worker: SmolStr,
    rsi_oversold: f64,
    rsi_overbought: f64,
    envelope_lower: f64,
    envelope_upper: f64,
    min_confidence: f64,
    lot_size: Decimal,
    min_free_margin: Decimal,
}

impl SimpleConsensus {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rsi_worker: impl Into<SmolStr>,
        envelope_worker: impl Into<SmolStr>,
        rsi_oversold: f64,
        rsi_overbought: f64,
        envelope_lower: f64,
        envelope_upper: f64,
        min_confidence: f64,
        lot_size: Decimal,
        min_free_margin: Decimal,
    ) -> Self {
        Self {
            rsi_worker: rsi_worker.into(),
            envelope_worker: envelope_worker.into(),
            rsi_oversold,
            rsi_overbought,
            envelope_lower,
            envelope_upper,
            min_confidence,
            lot_size,
            min_free_margin,
        }
    }

    /// Constructs with the reference config from §4.7:
    /// `rsi_oversold=30, rsi_overbought=70, envelope_lower=0.3,
    /// envelope_upper=0.7, min_confidence=0.5, lot_size=0.1,
    /// min_free_margin=1000`.
    pub fn with_reference_config(rsi_worker: impl Into<SmolStr>, envelope_worker: impl Into<SmolStr>) -> Self {
        Self::new(
            rsi_worker,
            envelope_worker,
            30.0,
            70.0,
            0.3,
            0.7,
            0.5,
            Decimal::new(1, 1),
            Decimal::new(1000, 0),
        )
    }
}

impl DecisionLogic for SimpleConsensus {
    fn required_order_types(&self) -> HashSet<OrderType> {
        HashSet::from([OrderType::Market])
    }

    fn compute(
        &mut self,
        _symbol: &str,
        price: Decimal,
        timestamp: DateTime<Utc>,
        worker_results: &HashMap<SmolStr, WorkerResult>,
    ) -> Decision {
        let rsi = worker_results.get(self.rsi_worker.as_str());
        let envelope = worker_results.get(self.envelope_worker.as_str());

        let (rsi, envelope) = match (rsi, envelope) {
            (Some(rsi), Some(envelope)) if !rsi.is_stale && !envelope.is_stale => (rsi, envelope),
            _ => {
                return Decision {
                    action: Action::Flat,
                    confidence: 0.0,
                    reason: SmolStr::new("warmup"),
                    price,
                    timestamp,
                };
            }
        };

        let rsi_value = rsi.value;
        let rsi_extremity = rsi.confidence;
        let envelope_position = envelope.value;
        let envelope_extremity = envelope.confidence;

        let confidence = (0.5 + 0.5 * (rsi_extremity + envelope_extremity) / 2.0).clamp(0.5, 1.0);

        let (action, reason) = if rsi_value <= self.rsi_oversold
            && envelope_position <= self.envelope_lower
            && confidence >= self.min_confidence
        {
            (Action::Buy, "rsi_oversold+envelope_lower")
        } else if rsi_value >= self.rsi_overbought
            && envelope_position >= self.envelope_upper
            && confidence >= self.min_confidence
        {
            (Action::Sell, "rsi_overbought+envelope_upper")
        } else {
            (Action::Flat, "no_consensus")
        };

        Decision {
            action,
            confidence,
            reason: SmolStr::new(reason),
            price,
            timestamp,
        }
    }

    fn execute(&mut self, decision: &Decision, symbol: &str, api: &mut dyn TradingApi) -> Option<OrderResult> {
        let current_position = api.has_open_position(symbol);

        // Direction used for the duplicate-suppression check below, and,
        // for BUY/SELL, the direction an order would actually be submitted
        // in. FLAT never submits an order (it closes directly) but still
        // checks the closing direction, the opposite of the open position.
        let submit_direction = match decision.action {
            Action::Buy => Some(Direction::Buy),
            Action::Sell => Some(Direction::Sell),
            Action::Flat => current_position.map(Direction::opposite),
        }?;

        // Checked before the FLAT/same-direction/reversal branching (§4.7):
        // a pending order already in flight in this direction means a prior
        // tick already submitted the same intent.
        if api.has_pending_order(symbol, submit_direction) {
            return None;
        }

        match decision.action {
            Action::Flat => api.close_position(symbol, "flat_close"),
            Action::Buy | Action::Sell => match current_position {
                None => {
                    if api.free_margin() < self.min_free_margin {
                        return None;
                    }
                    Some(api.open_order(symbol, OrderType::Market, submit_direction, self.lot_size, None, "open"))
                }
                Some(existing) if existing == submit_direction => None,
                Some(_opposite) => {
                    if api.free_margin() < self.min_free_margin {
                        return None;
                    }
                    // Reversal: close the existing position immediately
                    // (single EXECUTED record, no margin/stress pipeline),
                    // then open a fresh position in the new direction
                    // (§4.8.2).
                    api.close_position(symbol, "reversal_close");
                    Some(api.open_order(symbol, OrderType::Market, submit_direction, self.lot_size, None, "reversal_open"))
                }
            },
        }
    }
}
