use chrono::{DateTime, Utc};
use ethers::types::Address;
use models::PoolHandle;
use rust_decimal::Decimal;
use serde::Serialize;
use services::SwapWatcher;
use std::sync::Arc;
use strategies::ArbitrageOrchestrator;

/// 交易所展示信息
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeInfo {
    pub id: String,
    pub name: String,
    pub pair_address: Address,
    pub router_address: Address,
}

impl From<&PoolHandle> for ExchangeInfo {
    fn from(pool: &PoolHandle) -> Self {
        Self {
            id: pool.exchange.to_string(),
            name: pool.name.clone(),
            pair_address: pool.pair_address,
            router_address: pool.router_address,
        }
    }
}

/// 启动时确定的静态信息
#[derive(Debug, Clone, Serialize)]
pub struct BotInfo {
    /// 交易对, 如 "SHIB/WETH"
    pub pair: String,
    pub base_token: Address,
    pub quote_token: Address,
    pub exchanges: Vec<ExchangeInfo>,
    pub price_difference_pct: Decimal,
    pub execution_enabled: bool,
}

/// API 应用状态
#[derive(Clone)]
pub struct AppState {
    pub info: Arc<BotInfo>,
    pub orchestrator: Arc<ArbitrageOrchestrator>,
    pub watcher: Option<Arc<SwapWatcher>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(info: BotInfo, orchestrator: Arc<ArbitrageOrchestrator>) -> Self {
        Self {
            info: Arc::new(info),
            orchestrator,
            watcher: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_watcher(mut self, watcher: Arc<SwapWatcher>) -> Self {
        self.watcher = Some(watcher);
        self
    }
}
