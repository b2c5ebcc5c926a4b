use crate::bar_controller::BarController;
use crate::coordinator::WorkerCoordinator;
use crate::error::FiniexError;
use crate::logging::ScenarioLogger;
use crate::result::{
    CoordinationStatistics, CostBreakdown, DecisionStatistics, ExecutionStats, PortfolioStats, ProcessResult, ProfilingData, TickLoopResults,
    TickRangeStats, WorkerStatistics,
};
use crate::statistic::metric::profit_factor::ProfitFactor;
use crate::statistic::metric::ratio::{CalmarRatio, Ratio, SharpeRatio, SortinoRatio};
use crate::statistic::metric::win_rate::WinRate;
use crate::statistic::summary::pnl::PnLReturnSummary;
use finiex_data::{ProcessDataPackage, Scenario};
use finiex_execution::{BrokerSimulator, BrokerSpec, Direction, ExecutionError, OrderResult, OrderType};
use finiex_strategy::{build_decision_logic, build_worker, Action, TradingApi, Worker};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Facade over [`BrokerSimulator`] implementing the narrow
/// [`TradingApi`] a [`finiex_strategy::DecisionLogic`] is allowed to call
/// (§4.9's `DecisionTradingAPI`). Holds the tick timestamp each order
/// submitted through it should be stamped with.
struct DecisionTradingApi<'a> {
    broker: &'a mut BrokerSimulator,
    now: chrono::DateTime<chrono::Utc>,
    orders_submitted: u64,
}

impl TradingApi for DecisionTradingApi<'_> {
    fn open_order(
        &mut self,
        symbol: &str,
        order_type: OrderType,
        direction: Direction,
        lots: Decimal,
        requested_price: Option<Decimal>,
        comment: &str,
    ) -> OrderResult {
        self.orders_submitted += 1;
        self.broker.open_order(symbol, order_type, direction, lots, requested_price, comment, self.now)
    }

    fn has_pending_order(&self, symbol: &str, direction: Direction) -> bool {
        self.broker.has_pending_order(symbol, direction)
    }

    fn has_open_position(&self, symbol: &str) -> Option<Direction> {
        self.broker.open_position_for(symbol).map(|position| position.direction)
    }

    fn close_position(&mut self, symbol: &str, comment: &str) -> Option<OrderResult> {
        let result = self.broker.close_position(symbol, comment, self.now);
        if result.is_some() {
            self.orders_submitted += 1;
        }
        result
    }

    fn free_margin(&self) -> Decimal {
        self.broker.portfolio.free_margin
    }
}

/// Runs one scenario end to end (§4.9): builds workers/decision
/// logic/broker/bar controller from `package`, injects warmup, replays
/// every tick, flushes the broker, and returns a [`ProcessResult`].
///
/// Never panics outward: a panic inside the tick loop is caught at this
/// boundary (§7.1) and reported as an error result, since one scenario's
/// bug must not take down sibling scenarios running in the same batch.
pub fn run_scenario(scenario: &Scenario, scenario_index: usize, package: &ProcessDataPackage) -> ProcessResult {
    let started = Instant::now();
    let logger = ScenarioLogger::new();

    let outcome = logger.scoped(|| panic::catch_unwind(AssertUnwindSafe(|| run_scenario_inner(scenario, package))));

    let scenario_logger_buffer = logger.flush();
    let execution_time_ms = started.elapsed().as_secs_f64() * 1_000.0;

    match outcome {
        Ok(Ok(tick_loop_results)) => {
            tracing::info!(scenario = %scenario.name, "scenario completed");
            ProcessResult {
                success: true,
                scenario_name: scenario.name.clone(),
                symbol: scenario.symbol.clone(),
                scenario_index,
                execution_time_ms,
                error_type: None,
                error_message: None,
                traceback: None,
                tick_loop_results,
                scenario_logger_buffer,
            }
        }
        Ok(Err(error)) => error_result(scenario, scenario_index, execution_time_ms, scenario_logger_buffer, &error, None),
        Err(panic_payload) => {
            let message = panic_message(&panic_payload);
            let error = FiniexError::WorkerPanic(message.clone());
            error_result(scenario, scenario_index, execution_time_ms, scenario_logger_buffer, &error, Some(message))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "scenario panicked with a non-string payload".to_string()
    }
}

fn error_result(
    scenario: &Scenario,
    scenario_index: usize,
    execution_time_ms: f64,
    scenario_logger_buffer: String,
    error: &FiniexError,
    traceback: Option<String>,
) -> ProcessResult {
    tracing::error!(scenario = %scenario.name, %error, "scenario failed");
    ProcessResult {
        success: false,
        scenario_name: scenario.name.clone(),
        symbol: scenario.symbol.clone(),
        scenario_index,
        execution_time_ms,
        tick_loop_results: TickLoopResults::default(),
        scenario_logger_buffer,
        error_type: Some(error.error_type().to_string()),
        error_message: Some(error.to_string()),
        traceback,
    }
}

fn run_scenario_inner(scenario: &Scenario, package: &ProcessDataPackage) -> Result<TickLoopResults, FiniexError> {
    let warmup_started = Instant::now();

    let broker_spec: BrokerSpec = serde_json::from_str(&package.broker_config_serialized)
        .map_err(|error| FiniexError::Execution(ExecutionError::InvalidBrokerSpec(error.to_string())))?;

    let account_currency = if scenario.execution_config.is_auto_currency() {
        broker_spec.account_currency.clone()
    } else {
        scenario.execution_config.account_currency.clone()
    };

    let mut broker = BrokerSimulator::new(
        broker_spec.clone(),
        scenario.execution_config.initial_balance,
        scenario.execution_config.stress_test_config.clone(),
        scenario.execution_config.seed("broker"),
    );
    broker.portfolio.account_currency = account_currency;

    let workers: Vec<Box<dyn Worker>> = scenario
        .strategy_config
        .workers
        .values()
        .map(build_worker)
        .collect::<Result<_, _>>()?;

    let decision_logic = build_decision_logic(&scenario.strategy_config.decision_logic)?;

    let mut coordinator = WorkerCoordinator::new(
        workers,
        decision_logic,
        crate::app_config::parallel_workers(),
        crate::app_config::parallel_threshold_ms(),
    );

    let required = coordinator.required_order_types();
    let unsupported: Vec<_> = required.iter().filter(|order_type| !broker_spec.supports(**order_type)).collect();
    if !unsupported.is_empty() {
        return Err(FiniexError::Execution(ExecutionError::InvalidBrokerSpec(format!(
            "decision logic requires order types {unsupported:?} not in broker's supported_order_types"
        ))));
    }

    let mut bar_controller = BarController::new(coordinator.required_timeframes());
    bar_controller.inject_warmup(package.bars.clone());
    coordinator.on_warmup(&package.bars);

    let mut decision_statistics = DecisionStatistics::default();
    let mut worker_statistics: HashMap<smol_str::SmolStr, WorkerStatistics> = HashMap::new();
    let mut coordination_statistics = CoordinationStatistics::default();
    let mut tick_range_stats = TickRangeStats::default();

    let warmup_time_ms = warmup_started.elapsed().as_secs_f64() * 1_000.0;
    let tick_loop_started = Instant::now();

    for tick in &package.ticks {
        broker.update_prices(tick);
        let bar_views = bar_controller.on_tick(tick);

        let mut api = DecisionTradingApi {
            broker: &mut broker,
            now: tick.timestamp,
            orders_submitted: 0,
        };

        let outcome = coordinator.on_tick(tick, &bar_views, &scenario.symbol, &mut api);
        decision_statistics.orders_submitted += api.orders_submitted;

        match outcome.decision.action {
            Action::Buy => decision_statistics.buy_signals += 1,
            Action::Sell => decision_statistics.sell_signals += 1,
            Action::Flat => decision_statistics.flat_signals += 1,
        }

        for result in outcome.worker_results.values() {
            let entry = worker_statistics.entry(result.worker_name.clone()).or_default();
            entry.invocations += 1;
            entry.total_time_ms += result.computation_time_ms;
            if result.is_stale {
                entry.stale_invocations += 1;
            }
        }

        coordination_statistics.record(outcome.coordination);

        if tick_range_stats.first_tick.is_none() {
            tick_range_stats.first_tick = Some(tick.timestamp);
        }
        tick_range_stats.last_tick = Some(tick.timestamp);
        tick_range_stats.ticks_processed += 1;
    }

    let tick_loop_time_ms = tick_loop_started.elapsed().as_secs_f64() * 1_000.0;
    let flush_started = Instant::now();

    let last_mid = package.ticks.last().map(|tick| tick.mid()).unwrap_or(Decimal::ZERO);
    let flush_time = package.ticks.last().map(|tick| tick.timestamp).unwrap_or(scenario.start_date);
    broker.flush(last_mid, flush_time);

    let flush_time_ms = flush_started.elapsed().as_secs_f64() * 1_000.0;

    let portfolio_stats = build_portfolio_stats(&broker, &tick_range_stats);
    let execution_stats = ExecutionStats {
        orders_submitted: decision_statistics.orders_submitted,
        orders_executed: broker.orders_executed(),
        orders_rejected: broker.orders_rejected(),
    };
    let cost_breakdown = broker.portfolio.closed_positions.iter().fold(CostBreakdown::default(), |mut acc, position| {
        acc.total_commission += position.commission;
        acc.total_swap += position.swap;
        acc
    });

    Ok(TickLoopResults {
        decision_statistics,
        worker_statistics,
        coordination_statistics,
        portfolio_stats,
        execution_stats,
        cost_breakdown,
        profiling_data: ProfilingData {
            warmup_time_ms,
            tick_loop_time_ms,
            flush_time_ms,
        },
        tick_range_stats,
        tick_loop_error: None,
    })
}

fn build_portfolio_stats(broker: &BrokerSimulator, tick_range_stats: &TickRangeStats) -> PortfolioStats {
    let portfolio = &broker.portfolio;

    let (gross_profit, gross_loss) = portfolio.closed_positions.iter().filter_map(|position| position.realized_pnl).fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(profit, loss), pnl| {
            if pnl.is_sign_positive() {
                (profit + pnl, loss)
            } else {
                (profit, loss + pnl.abs())
            }
        },
    );

    let win_rate = WinRate::calculate(
        Decimal::from(portfolio.winning_trades),
        Decimal::from(portfolio.winning_trades + portfolio.losing_trades),
    )
    .map(|w| w.value.to_f64().unwrap_or(0.0))
    .unwrap_or(0.0);

    let profit_factor = ProfitFactor::calculate(gross_profit, gross_loss)
        .map(|pf| pf.value.to_f64().unwrap_or(0.0))
        .unwrap_or(0.0);

    let rate_of_return = if portfolio.initial_balance.is_zero() {
        0.0
    } else {
        ((portfolio.equity - portfolio.initial_balance) / portfolio.initial_balance)
            .to_f64()
            .unwrap_or(0.0)
    };

    let mut pnl_returns = PnLReturnSummary::new();
    for position in &portfolio.closed_positions {
        pnl_returns.update(position);
    }

    let elapsed_days = tick_range_stats
        .first_tick
        .zip(tick_range_stats.last_tick)
        .map(|(first, last)| (last - first).num_seconds() as f64 / 86_400.0)
        .unwrap_or(0.0);
    pnl_returns.set_trades_per_day(portfolio.closed_positions.len() as u64, elapsed_days);

    let mut sharpe = SharpeRatio::init(0.0);
    sharpe.update(&pnl_returns);

    let mut sortino = SortinoRatio::init(0.0);
    sortino.update(&pnl_returns);

    let mut calmar = CalmarRatio::init(0.0);
    calmar.update(&pnl_returns, portfolio.max_drawdown.to_f64().unwrap_or(0.0));

    PortfolioStats {
        final_balance: portfolio.balance,
        final_equity: portfolio.equity,
        max_drawdown: portfolio.max_drawdown,
        total_trades: portfolio.closed_positions.len() as u64,
        winning_trades: portfolio.winning_trades,
        losing_trades: portfolio.losing_trades,
        long_trades: portfolio.long_trades,
        short_trades: portfolio.short_trades,
        win_rate,
        profit_factor,
        rate_of_return,
        sharpe_ratio: sharpe.ratio(),
        sortino_ratio: sortino.ratio(),
        calmar_ratio: calmar.ratio(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use finiex_core::{Timeframe, Tick};
    use finiex_data::{DataMode, ExecutionConfig, StrategyConfig};
    use finiex_execution::{LatencyDistribution, StressTestConfig};
    use finiex_strategy::{DecisionLogicConfig, WorkerConfig};
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use std::collections::HashMap;

    fn broker_spec() -> BrokerSpec {
        BrokerSpec {
            name: SmolStr::new("demo"),
            leverage: dec!(100),
            account_currency: SmolStr::new("USD"),
            commission_per_lot: dec!(0),
            min_lots: dec!(0.01),
            max_lots: dec!(10),
            lot_step: dec!(0.01),
            digits: 5,
            tick_size: dec!(0.00001),
            spread_points: dec!(1),
            contract_size: dec!(100000),
            pip_value_per_lot: dec!(10),
            supported_order_types: vec![OrderType::Market],
            latency_distribution: LatencyDistribution::Fixed { ticks: 0 },
            max_pending_age_ticks: 50,
        }
    }

    fn scenario(start: chrono::DateTime<Utc>) -> Scenario {
        let mut workers = HashMap::new();
        workers.insert(
            SmolStr::new("rsi_1"),
            WorkerConfig {
                worker_type: SmolStr::new("rsi"),
                name: SmolStr::new("rsi_1"),
                timeframe: Timeframe::M5,
                params: HashMap::from([("period".to_string(), 2.0)]),
            },
        );
        workers.insert(
            SmolStr::new("envelope_1"),
            WorkerConfig {
                worker_type: SmolStr::new("envelope"),
                name: SmolStr::new("envelope_1"),
                timeframe: Timeframe::M5,
                params: HashMap::from([("period".to_string(), 2.0)]),
            },
        );

        Scenario {
            name: SmolStr::new("flat_market"),
            symbol: SmolStr::new("EURUSD"),
            start_date: start,
            end_date: None,
            max_ticks: Some(5),
            data_mode: DataMode::Clean,
            strategy_config: StrategyConfig {
                workers,
                decision_logic: DecisionLogicConfig {
                    decision_logic_type: SmolStr::new("simple_consensus"),
                    rsi_worker: SmolStr::new("rsi_1"),
                    envelope_worker: SmolStr::new("envelope_1"),
                    params: HashMap::new(),
                },
            },
            execution_config: ExecutionConfig {
                broker_type: SmolStr::new("demo"),
                initial_balance: dec!(10000),
                account_currency: SmolStr::new("auto"),
                stress_test_config: StressTestConfig::default(),
                seeds: HashMap::new(),
            },
        }
    }

    fn flat_ticks(start: chrono::DateTime<Utc>, n: usize) -> Vec<Tick> {
        (0..n)
            .map(|i| Tick::new(start + chrono::TimeDelta::minutes(i as i64), "EURUSD", dec!(1.1000), dec!(1.1002), None).unwrap())
            .collect()
    }

    fn package(scenario: &Scenario, ticks: Vec<Tick>) -> ProcessDataPackage {
        ProcessDataPackage {
            scenario_name: scenario.name.clone(),
            symbol: scenario.symbol.clone(),
            ticks,
            bars: HashMap::new(),
            broker_config_serialized: serde_json::to_string(&broker_spec()).unwrap(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn flat_market_produces_no_signals_and_a_successful_result() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let scenario = scenario(start);
        let package = package(&scenario, flat_ticks(start, 5));

        let result = run_scenario(&scenario, 0, &package);

        assert!(result.success);
        assert_eq!(result.tick_loop_results.tick_range_stats.ticks_processed, 5);
        assert_eq!(result.tick_loop_results.decision_statistics.flat_signals, 5);
        assert_eq!(result.tick_loop_results.execution_stats.orders_submitted, 0);
    }

    #[test]
    fn unsupported_order_type_is_reported_as_an_error_result() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut scenario = scenario(start);
        scenario.strategy_config.decision_logic.decision_logic_type = SmolStr::new("unknown_logic");
        let package = package(&scenario, flat_ticks(start, 1));

        let result = run_scenario(&scenario, 0, &package);

        assert!(!result.success);
        assert!(result.error_message.is_some());
    }
}
