use anyhow::{bail, Result};
use dex::SWAP_EVENT_TOPIC;
use ethers::prelude::*;
use ethers::types::{Address, H256};
use futures_util::StreamExt;
use models::ExchangeId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

/// Swap 监听配置
#[derive(Debug, Clone)]
pub struct SwapWatcherConfig {
    pub ws_url: String,
    pub reconnect_delay_secs: u64,
    /// 监控的池子 (交易所, 交易对地址)
    pub pools: Vec<(ExchangeId, Address)>,
}

/// "某个池子发生了 Swap" 触发信号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapTrigger {
    pub exchange: ExchangeId,
    pub block_number: Option<u64>,
    pub tx_hash: Option<H256>,
}

/// 投递结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    /// 通道已满，事件被丢弃
    Dropped,
}

/// Swap 事件监听器
///
/// 订阅两个池子的 V2 Swap 日志，转换为 [`SwapTrigger`] 后用 `try_send` 投递，
/// 通道满时直接丢弃，不排队。
pub struct SwapWatcher {
    config: SwapWatcherConfig,
    trigger_tx: mpsc::Sender<SwapTrigger>,
    /// 是否正在运行
    running: RwLock<bool>,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl SwapWatcher {
    pub fn new(config: SwapWatcherConfig, trigger_tx: mpsc::Sender<SwapTrigger>) -> Self {
        Self {
            config,
            trigger_tx,
            running: RwLock::new(false),
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// 收到的 Swap 事件数
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// 因通道已满丢弃的事件数
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// 启动监听 (断线自动重连，直到 stop 或通道关闭)
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.write().await;
        if *running {
            return Ok(());
        }
        *running = true;
        drop(running);

        info!(
            "Swap 监听器启动: ws_url={}, 池子: {:?}",
            self.config.ws_url, self.config.pools
        );

        loop {
            if !*self.running.read().await {
                break;
            }

            match self.connect_and_subscribe().await {
                Ok(_) => {
                    info!("WebSocket 连接正常关闭");
                }
                Err(e) => {
                    error!("WebSocket 连接错误: {}", e);
                }
            }

            if self.trigger_tx.is_closed() {
                warn!("触发通道已关闭，Swap 监听器退出");
                break;
            }

            // 检查是否应该重连
            if !*self.running.read().await {
                break;
            }

            info!("{}秒后重新连接...", self.config.reconnect_delay_secs);
            tokio::time::sleep(tokio::time::Duration::from_secs(
                self.config.reconnect_delay_secs,
            ))
            .await;
        }

        info!("Swap 监听器停止");
        Ok(())
    }

    /// 停止监听
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// 连接并订阅
    async fn connect_and_subscribe(&self) -> Result<()> {
        let ws = Ws::connect(&self.config.ws_url).await?;
        let provider = Provider::new(ws);

        info!("WebSocket 已连接");

        let addresses: Vec<Address> = self.config.pools.iter().map(|(_, addr)| *addr).collect();
        let filter = Filter::new().topic0(*SWAP_EVENT_TOPIC).address(addresses);
        let mut log_stream = provider.subscribe_logs(&filter).await?;

        info!("已订阅 {} 个池子的 Swap 事件", self.config.pools.len());

        while let Some(log) = log_stream.next().await {
            if !*self.running.read().await {
                break;
            }

            let Some(trigger) = self.classify_log(&log) else {
                continue;
            };
            self.received.fetch_add(1, Ordering::Relaxed);

            info!(
                "🔄 Swap 事件: 交易所 {} | 区块 {:?} | tx {:?}",
                trigger.exchange, trigger.block_number, trigger.tx_hash
            );

            self.dispatch(trigger)?;
        }

        Ok(())
    }

    /// 识别日志属于哪个池子
    pub fn classify_log(&self, log: &Log) -> Option<SwapTrigger> {
        if log.topics.first() != Some(&*SWAP_EVENT_TOPIC) {
            return None;
        }

        let exchange = self
            .config
            .pools
            .iter()
            .find(|(_, addr)| *addr == log.address)
            .map(|(exchange, _)| *exchange)?;

        Some(SwapTrigger {
            exchange,
            block_number: log.block_number.map(|n| n.as_u64()),
            tx_hash: log.transaction_hash,
        })
    }

    /// 投递触发信号，通道满时丢弃; 通道关闭时返回错误
    pub fn dispatch(&self, trigger: SwapTrigger) -> Result<Dispatch> {
        match self.trigger_tx.try_send(trigger) {
            Ok(()) => Ok(Dispatch::Sent),
            Err(mpsc::error::TrySendError::Full(trigger)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!("触发通道已满，丢弃交易所 {} 的 Swap 事件", trigger.exchange);
                Ok(Dispatch::Dropped)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                bail!("触发通道已关闭")
            }
        }
    }
}

/// 可共享的 Swap 监听器
pub type SharedSwapWatcher = Arc<SwapWatcher>;
