use chrono::{DateTime, Utc};
use dex::ExchangeClient;
use executor::TradeExecutor;
use models::{ExchangeId, GasParams, PriceQuote, TokenPair, TradeReceipt, TradeRequest, TradeSimulation};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Serialize;
use services::{SwapTrigger, WalletReader};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use utils::format_fixed;

use crate::direction::resolve_direction;
use crate::execution_guard::ExecutionGuard;
use crate::price_oracle::PriceOracle;
use crate::profit_simulator::{Leg, ProfitSimulator, RejectReason, SimulationOutcome};
use crate::report::{BalanceReport, WalletSnapshot};

/// 编排器配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 价差阈值 (百分比)
    pub price_difference_pct: Decimal,
    /// 价格展示精度
    pub display_precision: u32,
    /// 链上 gas 参数
    pub gas: GasParams,
    pub native_to_base_rate: Decimal,
}

/// 一轮评估的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// 已有一轮在评估中，触发信号被丢弃
    Dropped,
    /// 储备读取失败
    ReadFailed(String),
    /// 价差未达到阈值
    NoOpportunity { pct_diff: Decimal },
    Rejected(RejectReason),
    /// 模拟通过，但未开启执行
    ExecutionSkipped(TradeSimulation),
    Executed(TradeReceipt),
    ExecutionFailed(String),
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Dropped => "dropped",
            CycleOutcome::ReadFailed(_) => "read_failed",
            CycleOutcome::NoOpportunity { .. } => "no_opportunity",
            CycleOutcome::Rejected(_) => "rejected",
            CycleOutcome::ExecutionSkipped(_) => "execution_skipped",
            CycleOutcome::Executed(_) => "executed",
            CycleOutcome::ExecutionFailed(_) => "execution_failed",
        }
    }
}

/// 最近一轮摘要 (状态页展示)
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub trigger: ExchangeId,
    pub outcome: &'static str,
    pub detail: Option<String>,
    pub price_a: Option<Decimal>,
    pub price_b: Option<Decimal>,
    pub pct_diff: Option<Decimal>,
    /// 采样时的区块高度
    pub block_number: Option<u64>,
    pub finished_at: DateTime<Utc>,
}

/// 套利流水线编排
///
/// 报价 -> 方向 -> 模拟 -> (可选) 执行 -> 余额报告，整个过程受 [`ExecutionGuard`] 保护。
pub struct ArbitrageOrchestrator {
    pair: TokenPair,
    exchange_a: Arc<dyn ExchangeClient>,
    exchange_b: Arc<dyn ExchangeClient>,
    oracle: PriceOracle,
    simulator: ProfitSimulator,
    /// 未开启执行时为 None
    executor: Option<Arc<dyn TradeExecutor>>,
    wallet: Option<Arc<dyn WalletReader>>,
    guard: Arc<ExecutionGuard>,
    config: OrchestratorConfig,
    last_cycle: RwLock<Option<CycleSummary>>,
}

/// 本轮内的价格采样
struct Prices {
    a: PriceQuote,
    b: PriceQuote,
    block_number: Option<u64>,
}

impl ArbitrageOrchestrator {
    pub fn new(
        pair: TokenPair,
        exchange_a: Arc<dyn ExchangeClient>,
        exchange_b: Arc<dyn ExchangeClient>,
        simulator: ProfitSimulator,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            oracle: PriceOracle::new(pair.clone()),
            pair,
            exchange_a,
            exchange_b,
            simulator,
            executor: None,
            wallet: None,
            guard: Arc::new(ExecutionGuard::new()),
            config,
            last_cycle: RwLock::new(None),
        }
    }

    /// 开启链上执行
    pub fn with_executor(mut self, executor: Arc<dyn TradeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// 余额报告使用的钱包
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletReader>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn guard(&self) -> Arc<ExecutionGuard> {
        self.guard.clone()
    }

    pub fn execution_enabled(&self) -> bool {
        self.executor.is_some()
    }

    pub fn last_cycle(&self) -> Option<CycleSummary> {
        self.last_cycle.read().clone()
    }

    fn client(&self, exchange: ExchangeId) -> &dyn ExchangeClient {
        match exchange {
            ExchangeId::A => self.exchange_a.as_ref(),
            ExchangeId::B => self.exchange_b.as_ref(),
        }
    }

    /// 处理单个触发信号
    ///
    /// 已有评估在进行时立即返回 `Dropped`；否则跑完整条流水线后释放保护。
    pub async fn handle_trigger(&self, trigger: &SwapTrigger) -> CycleOutcome {
        let Some(_permit) = self.guard.try_acquire() else {
            self.guard.record_dropped(1);
            debug!(target: "strategy", "评估进行中，丢弃交易所 {} 的触发信号", trigger.exchange);
            return CycleOutcome::Dropped;
        };

        let client = self.client(trigger.exchange);
        info!(
            target: "strategy",
            "{} 发生 Swap，检查价格... (区块 {:?})",
            client.pool().name,
            trigger.block_number
        );

        let (outcome, prices) = self.run_cycle(trigger).await;

        match &outcome {
            CycleOutcome::Executed(_) => self.guard.record_executed(),
            CycleOutcome::ExecutionFailed(_) => self.guard.record_failed(),
            _ => {}
        }
        self.record_summary(trigger, &outcome, prices.as_ref());

        info!(target: "strategy", "本轮结束: {}", outcome.label());
        info!(target: "strategy", "-----------------------------------------");

        outcome
    }

    /// 工作循环: 逐个处理触发信号，评估期间积压的信号全部丢弃
    pub async fn run(self: Arc<Self>, mut trigger_rx: mpsc::Receiver<SwapTrigger>) {
        info!(
            "套利编排器启动: {} | {} vs {} | 阈值 {}% | 执行: {}",
            self.pair.label(),
            self.exchange_a.pool().name,
            self.exchange_b.pool().name,
            self.config.price_difference_pct,
            if self.execution_enabled() { "开启" } else { "关闭" }
        );
        info!("等待 Swap 事件...");

        while let Some(trigger) = trigger_rx.recv().await {
            self.handle_trigger(&trigger).await;

            // 评估结束后、清空前才到达的信号也会一并丢弃
            let mut drained = 0u64;
            while trigger_rx.try_recv().is_ok() {
                drained += 1;
            }
            if drained > 0 {
                self.guard.record_dropped(drained);
                debug!(target: "strategy", "丢弃评估期间积压的 {} 个触发信号", drained);
            }
        }

        info!("触发通道关闭，套利编排器退出");
    }

    async fn run_cycle(&self, trigger: &SwapTrigger) -> (CycleOutcome, Option<Prices>) {
        let precision = self.config.display_precision;

        // 1. 两边同时读取储备并报价，同时读取当前区块
        let (quote_a, quote_b, block_number) = tokio::join!(
            self.oracle.quote_price(self.exchange_a.as_ref(), None),
            self.oracle.quote_price(self.exchange_b.as_ref(), None),
            self.current_block(trigger),
        );
        let prices = match (quote_a, quote_b) {
            (Ok(mut a), Ok(mut b)) => {
                a.block_number = block_number;
                b.block_number = block_number;
                Prices { a, b, block_number }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(target: "strategy", "价格读取失败，放弃本轮: {}", e);
                return (CycleOutcome::ReadFailed(e.to_string()), None);
            }
        };

        let label = self.pair.label();
        info!(target: "strategy", "当前区块: {:?}", prices.block_number);
        info!(
            target: "strategy",
            "{:<10} | {} | {}",
            prices.a.exchange_name,
            label,
            format_fixed(prices.a.price, precision)
        );
        info!(
            target: "strategy",
            "{:<10} | {} | {}",
            prices.b.exchange_name,
            label,
            format_fixed(prices.b.price, precision)
        );

        // 2. 方向
        let Some(plan) = resolve_direction(prices.a.price, prices.b.price, self.config.price_difference_pct) else {
            let pct_diff = crate::direction::percentage_difference(prices.a.price, prices.b.price)
                .map(utils::round_percentage)
                .unwrap_or_default();
            info!(target: "strategy", "价差: {}%，暂无套利机会", pct_diff);
            return (CycleOutcome::NoOpportunity { pct_diff }, Some(prices));
        };

        let buy_name = self.client(plan.buy_on).pool().name.clone();
        let sell_name = self.client(plan.sell_on).pool().name.clone();
        info!(target: "strategy", "价差: {}%", plan.pct_diff_display);
        info!(target: "strategy", "潜在套利方向: 买入 --> {} | 卖出 --> {}", buy_name, sell_name);

        // 3. 模拟 (复用本轮读取的储备)
        let (buy_reserves, sell_reserves) = match plan.buy_on {
            ExchangeId::A => (prices.a.reserves, prices.b.reserves),
            ExchangeId::B => (prices.b.reserves, prices.a.reserves),
        };
        let outcome = self
            .simulator
            .simulate(
                &plan,
                Leg::new(self.client(plan.buy_on), buy_reserves),
                Leg::new(self.client(plan.sell_on), sell_reserves),
            )
            .await;

        let simulation = match outcome {
            SimulationOutcome::Accepted(simulation) => simulation,
            SimulationOutcome::Rejected(reason) => {
                info!(target: "strategy", "模拟未通过: {}，暂无套利机会", reason);
                return (CycleOutcome::Rejected(reason), Some(prices));
            }
        };

        info!(
            target: "arbitrage_opportunity",
            "💰 {} | 买入 {} 卖出 {} | 价差 {}% | 投入 {} 换回 {} gas {} 净利润 {} {}",
            label,
            buy_name,
            sell_name,
            plan.pct_diff_display,
            format_fixed(simulation.amount_in, precision),
            format_fixed(simulation.amount_out, precision),
            format_fixed(simulation.estimated_gas_cost, precision),
            format_fixed(simulation.net_profit, precision),
            self.pair.base.symbol
        );

        let before = self.wallet_snapshot().await;
        if let Some(before) = &before {
            match self.simulator.gas_cost_native() {
                Ok(gas_native) => {
                    let report = BalanceReport::projected(
                        before,
                        &simulation,
                        gas_native,
                        self.config.native_to_base_rate,
                    );
                    info!(target: "strategy", "预估余额变化:");
                    for line in report.lines(&self.pair, precision) {
                        info!(target: "strategy", "{}", line);
                    }
                }
                Err(e) => warn!(target: "strategy", "gas 成本换算失败: {}", e),
            }
        }

        // 4. 执行
        let Some(executor) = &self.executor else {
            info!(target: "strategy", "未开启执行 (EXECUTION_ENABLED=false)，跳过交易");
            return (CycleOutcome::ExecutionSkipped(simulation), Some(prices));
        };

        let request = TradeRequest {
            buy_on: plan.buy_on,
            sell_on: plan.sell_on,
            token0: self.pair.base.address,
            token1: self.pair.quote.address,
            amount_in: simulation.amount_in_raw,
            gas: self.config.gas,
        };

        info!(target: "trade_executor", "尝试套利: 在 {} 借入 {} {}", buy_name, format_fixed(simulation.amount_in, precision), self.pair.base.symbol);

        let receipt = match executor.execute_trade(&request).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(target: "trade_executor", "❌ 套利执行失败: {}", e);
                return (CycleOutcome::ExecutionFailed(e.to_string()), Some(prices));
            }
        };
        info!(target: "trade_executor", "✅ 交易已确认: {:?}", receipt.tx_hash);

        // 5. 实际余额变化
        if let (Some(before), Some(after)) = (before, self.wallet_snapshot().await) {
            let report = BalanceReport::realized(&before, &after, self.config.native_to_base_rate);
            for line in report.lines(&self.pair, precision) {
                info!(target: "trade_executor", "{}", line);
            }
        }

        (CycleOutcome::Executed(receipt), Some(prices))
    }

    /// 从触发所在节点读取区块高度，失败时退回事件日志的区块
    async fn current_block(&self, trigger: &SwapTrigger) -> Option<u64> {
        match self.client(trigger.exchange).block_number().await {
            Ok(block) => Some(block),
            Err(e) => {
                debug!(target: "strategy", "读取区块高度失败，使用事件区块 {:?}: {:#}", trigger.block_number, e);
                trigger.block_number
            }
        }
    }

    /// 读取钱包余额，失败只告警
    async fn wallet_snapshot(&self) -> Option<WalletSnapshot> {
        let wallet = self.wallet.as_ref()?;
        match WalletSnapshot::read(wallet.as_ref(), &self.pair).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(target: "strategy", "读取钱包余额失败: {:#}", e);
                None
            }
        }
    }

    fn record_summary(&self, trigger: &SwapTrigger, outcome: &CycleOutcome, prices: Option<&Prices>) {
        let detail = match outcome {
            CycleOutcome::ReadFailed(reason) | CycleOutcome::ExecutionFailed(reason) => Some(reason.clone()),
            CycleOutcome::Rejected(reason) => Some(reason.to_string()),
            CycleOutcome::Executed(receipt) => Some(format!("{:?}", receipt.tx_hash)),
            _ => None,
        };
        let pct_diff = prices.and_then(|p| {
            crate::direction::percentage_difference(p.a.price, p.b.price).map(utils::round_percentage)
        });

        *self.last_cycle.write() = Some(CycleSummary {
            trigger: trigger.exchange,
            outcome: outcome.label(),
            detail,
            price_a: prices.map(|p| p.a.price),
            price_b: prices.map(|p| p.b.price),
            pct_diff,
            block_number: prices.and_then(|p| p.block_number),
            finished_at: Utc::now(),
        });
    }
}
