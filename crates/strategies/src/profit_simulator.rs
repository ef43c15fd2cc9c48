use dex::ExchangeClient;
use ethers::types::U256;
use models::{DirectionPlan, PoolHandle, Reserves, TokenPair, TradeSimulation};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;
use utils::{format_fixed, gas_cost_in_native, to_display, UnitsError};

/// 利润模拟配置
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub gas_limit: u64,
    /// Gas 价格 (Gwei)
    pub gas_price_gwei: Decimal,
    /// 1 个原生币折合多少 base 代币
    pub native_to_base_rate: Decimal,
    /// 日志展示精度
    pub display_precision: u32,
}

/// 模拟拒绝原因 (正常结果，不是错误)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("流动性不足，试算金额为零")]
    InsufficientLiquidity,

    #[error("扣除 gas 前已亏损: 投入 {amount_in}, 换回 {amount_out}")]
    UnprofitableBeforeGas { amount_in: Decimal, amount_out: Decimal },

    #[error("扣除 gas 后无利润: 净利润 {net_profit}")]
    UnprofitableAfterGas { net_profit: Decimal },

    #[error("报价调用失败: {0}")]
    SimulationFailed(String),
}

/// 模拟结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationOutcome {
    Accepted(TradeSimulation),
    Rejected(RejectReason),
}

/// 模拟中的一侧交易所及其本轮储备快照
pub struct Leg<'a> {
    pub client: &'a dyn ExchangeClient,
    pub reserves: Reserves,
}

impl<'a> Leg<'a> {
    pub fn new(client: &'a dyn ExchangeClient, reserves: Reserves) -> Self {
        Self { client, reserves }
    }

    fn pool(&self) -> &PoolHandle {
        self.client.pool()
    }
}

/// 往返交易利润模拟器
///
/// 1. 试算金额 = 两个池子中较小的 quote 储备的一半
/// 2. 买入侧 getAmountsIn 求需要的 base，再 getAmountsOut 得到实际买到的 quote
/// 3. 卖出侧 getAmountsOut 把 quote 换回 base
/// 4. 净利润 = 换回 - 投入 - gas 成本 (全部换算为 base 展示单位)
pub struct ProfitSimulator {
    pair: TokenPair,
    config: SimulatorConfig,
}

impl ProfitSimulator {
    pub fn new(pair: TokenPair, config: SimulatorConfig) -> Self {
        Self { pair, config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// gas 成本 (原生币展示单位)
    pub fn gas_cost_native(&self) -> Result<Decimal, UnitsError> {
        gas_cost_in_native(self.config.gas_limit, self.config.gas_price_gwei)
    }

    /// gas 成本 (base 代币展示单位)
    pub fn gas_cost_in_base(&self) -> Result<Decimal, UnitsError> {
        let native = self.gas_cost_native()?;
        native
            .checked_mul(self.config.native_to_base_rate)
            .ok_or_else(|| UnitsError::Overflow(format!("{} * {}", native, self.config.native_to_base_rate)))
    }

    /// 试算的 quote 数量 (链上单位)
    pub fn trial_amount(&self, a: &Leg<'_>, b: &Leg<'_>) -> U256 {
        let base = self.pair.base.address;
        let (_, quote_a) = a.reserves.oriented(a.pool().token0, base);
        let (_, quote_b) = b.reserves.oriented(b.pool().token0, base);
        quote_a.min(quote_b) / 2
    }

    /// 按方向模拟一次往返
    pub async fn simulate(&self, plan: &DirectionPlan, buy: Leg<'_>, sell: Leg<'_>) -> SimulationOutcome {
        let trial = self.trial_amount(&buy, &sell);
        if trial.is_zero() {
            return SimulationOutcome::Rejected(RejectReason::InsufficientLiquidity);
        }

        let buy_path = self.pair.buy_path();
        let sell_path = self.pair.sell_path();

        // 买入 trial 个 quote 需要多少 base
        let amount_in_raw = match buy.client.get_amounts_in(trial, &buy_path).await {
            Ok(amounts) => match amounts.first() {
                Some(amount) => *amount,
                None => return rejected_call("getAmountsIn 返回为空"),
            },
            Err(e) => return rejected_call(format!("{:#}", e)),
        };

        // 实际能买到的 quote
        let quote_bought = match buy.client.get_amounts_out(amount_in_raw, &buy_path).await {
            Ok(amounts) => match amounts.last() {
                Some(amount) => *amount,
                None => return rejected_call("getAmountsOut 返回为空"),
            },
            Err(e) => return rejected_call(format!("{:#}", e)),
        };

        // 卖出侧换回的 base
        let amount_out_raw = match sell.client.get_amounts_out(quote_bought, &sell_path).await {
            Ok(amounts) => match amounts.last() {
                Some(amount) => *amount,
                None => return rejected_call("getAmountsOut 返回为空"),
            },
            Err(e) => return rejected_call(format!("{:#}", e)),
        };

        let precision = self.config.display_precision;
        if let Ok(amount_in) = to_display(amount_in_raw, self.pair.base.decimals) {
            info!(
                target: "strategy",
                "预计在 {} 买入 {} 需要 {} {}",
                buy.pool().name,
                self.pair.quote.symbol,
                format_fixed(amount_in, precision),
                self.pair.base.symbol
            );
        }
        if let Ok(amount_out) = to_display(amount_out_raw, self.pair.base.decimals) {
            info!(
                target: "strategy",
                "预计在 {} 卖出 {} 换回 {} {}",
                sell.pool().name,
                self.pair.quote.symbol,
                format_fixed(amount_out, precision),
                self.pair.base.symbol
            );
        }

        let outcome = self.evaluate(amount_in_raw, amount_out_raw);
        if let SimulationOutcome::Accepted(sim) = &outcome {
            info!(
                target: "strategy",
                "模拟通过: {} -> {} | 净利润 {} {} (gas {})",
                plan.buy_on,
                plan.sell_on,
                format_fixed(sim.net_profit, precision),
                self.pair.base.symbol,
                format_fixed(sim.estimated_gas_cost, precision)
            );
        }
        outcome
    }

    /// 根据往返金额 (base 链上单位) 判断是否有利可图
    pub fn evaluate(&self, amount_in_raw: U256, amount_out_raw: U256) -> SimulationOutcome {
        let decimals = self.pair.base.decimals;

        let converted = to_display(amount_in_raw, decimals).and_then(|amount_in| {
            let amount_out = to_display(amount_out_raw, decimals)?;
            let gas_cost = self.gas_cost_in_base()?;
            Ok((amount_in, amount_out, gas_cost))
        });
        let (amount_in, amount_out, estimated_gas_cost) = match converted {
            Ok(values) => values,
            Err(e) => return rejected_call(e.to_string()),
        };

        if amount_out < amount_in {
            return SimulationOutcome::Rejected(RejectReason::UnprofitableBeforeGas { amount_in, amount_out });
        }

        let net_profit = amount_out - amount_in - estimated_gas_cost;
        if net_profit <= Decimal::ZERO {
            return SimulationOutcome::Rejected(RejectReason::UnprofitableAfterGas { net_profit });
        }

        SimulationOutcome::Accepted(TradeSimulation {
            amount_in,
            amount_out,
            estimated_gas_cost,
            net_profit,
            amount_in_raw,
            amount_out_raw,
        })
    }
}

fn rejected_call(reason: impl Into<String>) -> SimulationOutcome {
    SimulationOutcome::Rejected(RejectReason::SimulationFailed(reason.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ether, pair, MockExchange};
    use models::ExchangeId;
    use rust_decimal_macros::dec;

    fn simulator(gas_limit: u64, gas_price_gwei: Decimal) -> ProfitSimulator {
        ProfitSimulator::new(
            pair(),
            SimulatorConfig {
                gas_limit,
                gas_price_gwei,
                native_to_base_rate: Decimal::ONE,
                display_precision: 6,
            },
        )
    }

    fn plan_buy_b() -> DirectionPlan {
        DirectionPlan {
            buy_on: ExchangeId::B,
            sell_on: ExchangeId::A,
            pct_diff: dec!(9900),
            pct_diff_display: dec!(9900.00),
        }
    }

    #[test]
    fn test_gas_is_normalized_before_subtraction() {
        // 200000 gas * 75 gwei = 0.015 ETH
        let sim = simulator(200_000, dec!(75));
        let outcome = sim.evaluate(ether(1), U256::from(102) * U256::exp10(16));

        match outcome {
            SimulationOutcome::Accepted(result) => {
                assert_eq!(result.amount_in, dec!(1));
                assert_eq!(result.amount_out, dec!(1.02));
                assert_eq!(result.estimated_gas_cost, dec!(0.015));
                assert_eq!(result.net_profit, dec!(0.005));
                assert_eq!(result.amount_in_raw, ether(1));
            }
            other => panic!("expected accepted, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_before_gas() {
        let sim = simulator(200_000, dec!(75));
        let outcome = sim.evaluate(ether(2), ether(1));
        assert!(matches!(
            outcome,
            SimulationOutcome::Rejected(RejectReason::UnprofitableBeforeGas { .. })
        ));
    }

    #[test]
    fn test_rejected_after_gas() {
        // 毛利 0.01 < gas 0.015
        let sim = simulator(200_000, dec!(75));
        let outcome = sim.evaluate(ether(1), U256::from(101) * U256::exp10(16));
        assert_eq!(
            outcome,
            SimulationOutcome::Rejected(RejectReason::UnprofitableAfterGas { net_profit: dec!(-0.005) })
        );

        // 净利润恰好为零也拒绝
        let outcome = sim.evaluate(ether(1), U256::from(1015) * U256::exp10(15));
        assert_eq!(
            outcome,
            SimulationOutcome::Rejected(RejectReason::UnprofitableAfterGas { net_profit: Decimal::ZERO })
        );
    }

    #[test]
    fn test_native_to_base_rate_applies() {
        let mut sim = simulator(200_000, dec!(75));
        sim.config.native_to_base_rate = dec!(2000);
        // 0.015 ETH * 2000 = 30 base
        assert_eq!(sim.gas_cost_in_base().unwrap(), dec!(30));
    }

    #[tokio::test]
    async fn test_profitable_round_trip() {
        let sim = simulator(400_000, dec!(20));
        // A: 1 quote = 100 base, B: 1 quote = 1 base
        let a = MockExchange::new(ExchangeId::A, ether(1000), ether(10));
        let b = MockExchange::new(ExchangeId::B, ether(1000), ether(1000));

        let outcome = sim
            .simulate(
                &plan_buy_b(),
                Leg::new(&b, b.current_reserves()),
                Leg::new(&a, a.current_reserves()),
            )
            .await;

        match outcome {
            SimulationOutcome::Accepted(result) => {
                assert!(result.amount_out > result.amount_in);
                assert_eq!(result.estimated_gas_cost, dec!(0.008));
                assert_eq!(
                    result.net_profit,
                    result.amount_out - result.amount_in - dec!(0.008)
                );
            }
            other => panic!("expected accepted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_small_divergence_is_eaten_by_slippage() {
        let sim = simulator(400_000, dec!(20));
        let a = MockExchange::new(ExchangeId::A, ether(1000), ether(10));
        let b = MockExchange::new(ExchangeId::B, ether(1000), U256::from(105) * U256::exp10(17));

        let outcome = sim
            .simulate(
                &plan_buy_b(),
                Leg::new(&b, b.current_reserves()),
                Leg::new(&a, a.current_reserves()),
            )
            .await;

        assert!(matches!(
            outcome,
            SimulationOutcome::Rejected(RejectReason::UnprofitableBeforeGas { .. })
        ));
    }

    #[tokio::test]
    async fn test_simulation_is_idempotent() {
        let sim = simulator(400_000, dec!(20));
        let a = MockExchange::new(ExchangeId::A, ether(1000), ether(10));
        let b = MockExchange::new(ExchangeId::B, ether(1000), ether(1000));

        let first = sim
            .simulate(&plan_buy_b(), Leg::new(&b, b.current_reserves()), Leg::new(&a, a.current_reserves()))
            .await;
        let second = sim
            .simulate(&plan_buy_b(), Leg::new(&b, b.current_reserves()), Leg::new(&a, a.current_reserves()))
            .await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pricing_failure_is_rejection() {
        let sim = simulator(400_000, dec!(20));
        let a = MockExchange::new(ExchangeId::A, ether(1000), ether(10));
        let b = MockExchange::new(ExchangeId::B, ether(1000), ether(1000)).failing_quotes();

        let outcome = sim
            .simulate(&plan_buy_b(), Leg::new(&b, b.current_reserves()), Leg::new(&a, a.current_reserves()))
            .await;

        assert!(matches!(
            outcome,
            SimulationOutcome::Rejected(RejectReason::SimulationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_trial_amount() {
        let sim = simulator(400_000, dec!(20));
        let a = MockExchange::new(ExchangeId::A, ether(1000), U256::one());
        let b = MockExchange::new(ExchangeId::B, ether(1000), ether(1000));

        let outcome = sim
            .simulate(&plan_buy_b(), Leg::new(&b, b.current_reserves()), Leg::new(&a, a.current_reserves()))
            .await;

        assert_eq!(outcome, SimulationOutcome::Rejected(RejectReason::InsufficientLiquidity));
    }
}
