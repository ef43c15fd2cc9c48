//! 应用启动引导模块
//!
//! 封装应用初始化、服务启动和关闭逻辑

use anyhow::{Context, Result};
use config_crate::AppConfig;
use dex::{resolve_token, ExchangeClient, UniswapV2Exchange};
use ethers::prelude::*;
use ethers::signers::LocalWallet;
use executor::SignedExecutor;
use models::{ExchangeId, GasParams, TokenPair};
use services::{ChainWallet, SwapWatcher, SwapWatcherConfig};
use std::str::FromStr;
use std::sync::Arc;
use strategies::{ArbitrageOrchestrator, OrchestratorConfig, ProfitSimulator, SimulatorConfig};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use ::utils::gwei_to_wei;

/// 应用程序实例
///
/// 管理监听器、套利工作协程和 API 服务的生命周期
pub struct Application {
    config: AppConfig,
    info: api::BotInfo,
    orchestrator: Arc<ArbitrageOrchestrator>,
    watcher: Arc<SwapWatcher>,

    // 后台任务句柄
    watcher_handle: JoinHandle<()>,
    worker_handle: JoinHandle<()>,
}

impl Application {
    /// 初始化并启动应用
    pub async fn start(config: AppConfig) -> Result<Self> {
        Self::log_config(&config);

        info!("初始化以太坊 Provider...");
        let provider = Provider::<Http>::try_from(config.network.rpc_url.as_str())
            .with_context(|| format!("无效的 RPC_URL: {}", config.network.rpc_url))?;
        let chain_id = provider
            .get_chainid()
            .await
            .context("读取 chain_id 失败")?
            .as_u64();
        info!("已连接链: chain_id={}", chain_id);
        let client = Arc::new(provider.clone());

        // 代币元数据
        let base_address = parse_address("ARB_FOR", &config.arbitrage.base_token)?;
        let quote_address = parse_address("ARB_AGAINST", &config.arbitrage.quote_token)?;
        let pair = TokenPair::new(
            resolve_token(client.clone(), base_address).await?,
            resolve_token(client.clone(), quote_address).await?,
        );
        info!(
            "交易对: {} (base={} {:?}, quote={} {:?})",
            pair.label(),
            pair.base.symbol,
            pair.base.address,
            pair.quote.symbol,
            pair.quote.address
        );

        // 两个交易所的池子
        let exchange_a = Self::discover_exchange(client.clone(), ExchangeId::A, &config.exchange_a, &pair).await?;
        let exchange_b = Self::discover_exchange(client.clone(), ExchangeId::B, &config.exchange_b, &pair).await?;
        let pools = vec![
            (ExchangeId::A, exchange_a.pool().pair_address),
            (ExchangeId::B, exchange_b.pool().pair_address),
        ];
        let info = api::BotInfo {
            pair: pair.label(),
            base_token: pair.base.address,
            quote_token: pair.quote.address,
            exchanges: vec![
                api::ExchangeInfo::from(exchange_a.pool()),
                api::ExchangeInfo::from(exchange_b.pool()),
            ],
            price_difference_pct: config.arbitrage.price_difference_pct,
            execution_enabled: config.arbitrage.execution_enabled,
        };

        let orchestrator = Arc::new(
            Self::build_orchestrator(&config, provider, chain_id, pair, exchange_a, exchange_b)?,
        );

        // 触发通道: 容量有限，满了由监听器丢弃
        let (trigger_tx, trigger_rx) = mpsc::channel(config.watcher.trigger_channel_capacity);

        let watcher = Arc::new(SwapWatcher::new(
            SwapWatcherConfig {
                ws_url: config.network.ws_url.clone(),
                reconnect_delay_secs: config.watcher.reconnect_delay_secs,
                pools,
            },
            trigger_tx,
        ));

        let watcher_handle = {
            let watcher = watcher.clone();
            tokio::spawn(async move {
                if let Err(e) = watcher.start().await {
                    error!("Swap 监听器错误: {}", e);
                }
            })
        };
        let worker_handle = tokio::spawn(orchestrator.clone().run(trigger_rx));

        Ok(Self {
            config,
            info,
            orchestrator,
            watcher,
            watcher_handle,
            worker_handle,
        })
    }

    /// 运行 API 服务器（阻塞，直到 Ctrl+C）
    pub async fn run_server(&self) -> Result<()> {
        let app_state = api::AppState::new(self.info.clone(), self.orchestrator.clone())
            .with_watcher(self.watcher.clone());
        let app = api::create_server(app_state);

        self.log_startup_complete();

        api::start_server(app, &self.config.api.host, self.config.api.port, shutdown_signal()).await
    }

    /// 停止所有服务
    pub async fn shutdown(self) -> Result<()> {
        info!("正在停止服务...");

        self.watcher.stop().await;
        self.watcher_handle.abort();
        self.worker_handle.abort();
        let _ = self.watcher_handle.await;
        let _ = self.worker_handle.await;

        let stats = self.orchestrator.guard().stats();
        info!(
            "累计检测 {} 轮, 丢弃触发 {} 次, 成功交易 {} 笔, 失败 {} 笔",
            stats.cycles_completed, stats.triggers_dropped, stats.trades_executed, stats.trades_failed
        );
        info!("系统已停止");
        Ok(())
    }

    // ========== 私有辅助方法 ==========

    fn log_config(config: &AppConfig) {
        info!("配置加载成功");
        info!("========================================");
        info!("RPC: {}", config.network.rpc_url);
        info!("WS:  {}", config.network.ws_url);
        info!("交易所 A: {} (factory={})", config.exchange_a.name, config.exchange_a.factory);
        info!("交易所 B: {} (factory={})", config.exchange_b.name, config.exchange_b.factory);
        info!("========================================");
        info!("价差阈值: {}%", config.arbitrage.price_difference_pct);
        info!("Gas: limit={}, price={} Gwei", config.arbitrage.gas_limit, config.arbitrage.gas_price_gwei);
        info!("原生币/base 汇率: {}", config.arbitrage.native_to_base_rate);
        info!("展示精度: {}", config.arbitrage.display_precision);
        info!("链上执行: {}", config.arbitrage.execution_enabled);
    }

    async fn discover_exchange(
        provider: Arc<Provider<Http>>,
        exchange: ExchangeId,
        config: &config_crate::ExchangeConfig,
        pair: &TokenPair,
    ) -> Result<Arc<UniswapV2Exchange<Provider<Http>>>> {
        let factory = parse_address("FACTORY", &config.factory)?;
        let router = parse_address("ROUTER", &config.router)?;
        let client = UniswapV2Exchange::discover(
            provider,
            exchange,
            &config.name,
            factory,
            router,
            pair.base.address,
            pair.quote.address,
        )
        .await?;
        Ok(Arc::new(client))
    }

    fn build_orchestrator(
        config: &AppConfig,
        provider: Provider<Http>,
        chain_id: u64,
        pair: TokenPair,
        exchange_a: Arc<UniswapV2Exchange<Provider<Http>>>,
        exchange_b: Arc<UniswapV2Exchange<Provider<Http>>>,
    ) -> Result<ArbitrageOrchestrator> {
        let arb = &config.arbitrage;

        let simulator = ProfitSimulator::new(
            pair.clone(),
            SimulatorConfig {
                gas_limit: arb.gas_limit,
                gas_price_gwei: arb.gas_price_gwei,
                native_to_base_rate: arb.native_to_base_rate,
                display_precision: arb.display_precision,
            },
        );
        let orchestrator_config = OrchestratorConfig {
            price_difference_pct: arb.price_difference_pct,
            display_precision: arb.display_precision,
            gas: GasParams {
                gas_limit: U256::from(arb.gas_limit),
                gas_price: gwei_to_wei(arb.gas_price_gwei)?,
            },
            native_to_base_rate: arb.native_to_base_rate,
        };

        let exchange_a: Arc<dyn ExchangeClient> = exchange_a;
        let exchange_b: Arc<dyn ExchangeClient> = exchange_b;
        let mut orchestrator =
            ArbitrageOrchestrator::new(pair, exchange_a, exchange_b, simulator, orchestrator_config);

        let Some(private_key) = config.wallet.private_key.as_deref() else {
            warn!("未配置 PRIVATE_KEY，仅做检测，不读取钱包余额");
            return Ok(orchestrator);
        };

        let wallet_address = private_key
            .trim()
            .parse::<LocalWallet>()
            .context("解析 PRIVATE_KEY 失败")?
            .address();
        info!("钱包地址: {:?}", wallet_address);
        orchestrator = orchestrator.with_wallet(Arc::new(ChainWallet::new(
            Arc::new(provider.clone()),
            wallet_address,
        )));

        if arb.execution_enabled {
            let contract = arb
                .arbitrage_contract
                .as_deref()
                .context("启用执行时必须配置 ARBITRAGE_CONTRACT")?;
            let contract_address = parse_address("ARBITRAGE_CONTRACT", contract)?;
            let executor = SignedExecutor::connect(provider, private_key, chain_id, contract_address)?;
            orchestrator = orchestrator.with_executor(Arc::new(executor));
            info!("✅ 链上执行已启用");
        } else {
            info!("链上执行未启用 (EXECUTION_ENABLED=false)，仅记录套利机会");
        }

        Ok(orchestrator)
    }

    fn log_startup_complete(&self) {
        info!("========================================");
        info!("  系统启动完成");
        info!(
            "  API 地址: http://{}:{}",
            self.config.api.host, self.config.api.port
        );
        info!("  交易对: {}", self.info.pair);
        for exchange in &self.info.exchanges {
            info!("  [{}] {}: {:?}", exchange.id, exchange.name, exchange.pair_address);
        }
        info!(
            "  链上执行: {}",
            if self.orchestrator.execution_enabled() {
                "已启用"
            } else {
                "未启用"
            }
        );
        info!("========================================");
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim()).with_context(|| format!("无效的地址 {}: {}", key, value))
}

/// 等待 Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("监听 Ctrl+C 失败: {}", e);
    }
    info!("收到停止信号");
}

/// 设置全局 panic hook
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("========================================");
        error!("!!! 系统发生 PANIC !!!");
        error!("========================================");
        if let Some(location) = panic_info.location() {
            error!(
                "发生位置: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            error!("Panic 消息: {}", s);
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            error!("Panic 消息: {}", s);
        }
        error!("========================================");
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let address = parse_address("ARB_FOR", " 0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2 ").unwrap();
        assert_eq!(
            address,
            Address::from_str("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2").unwrap()
        );

        let err = parse_address("ARB_AGAINST", "not-an-address").unwrap_err();
        assert!(err.to_string().contains("ARB_AGAINST"));
    }
}
