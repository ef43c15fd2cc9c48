//! 套利执行器核心实现
//!
//! 通过公开 mempool 发送 `executeTrade`，使用配置中的固定 gas limit 与 legacy gas price，
//! 等待回执后返回。同一轮内不重试。

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::Address;
use models::{TradeReceipt, TradeRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::arbitrage_contract::ArbitrageContract;
use crate::types::ExecutionError;

/// 交易执行协作者
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// 发送套利交易并等待确认
    async fn execute_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, ExecutionError>;
}

/// 使用本地私钥签名的执行器
pub type SignedExecutor = ContractTradeExecutor<SignerMiddleware<Provider<Http>, LocalWallet>>;

/// 调用链上 Arbitrage 合约的执行器
pub struct ContractTradeExecutor<M: Middleware + 'static> {
    contract: ArbitrageContract<M>,
    from: Address,
    confirmation_timeout: Duration,
}

impl<M: Middleware + 'static> ContractTradeExecutor<M> {
    pub fn new(provider: Arc<M>, contract_address: Address, from: Address) -> Self {
        Self {
            contract: ArbitrageContract::new(contract_address, provider),
            from,
            confirmation_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn contract_address(&self) -> Address {
        self.contract.address()
    }
}

impl SignedExecutor {
    /// 用私钥包装 HTTP Provider 并创建执行器
    pub fn connect(
        provider: Provider<Http>,
        private_key: &str,
        chain_id: u64,
        contract_address: Address,
    ) -> Result<Self> {
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .context("解析 PRIVATE_KEY 失败")?
            .with_chain_id(chain_id);
        let from = wallet.address();

        info!("执行钱包: {:?}, 套利合约: {:?}", from, contract_address);

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        Ok(Self::new(client, contract_address, from))
    }
}

/// 回执 -> 执行结果; status=0 视为 revert
fn summarize_receipt(receipt: TransactionReceipt) -> Result<TradeReceipt, ExecutionError> {
    let block_number = receipt.block_number.map(|n| n.as_u64());

    if receipt.status != Some(U64::from(1)) {
        return Err(ExecutionError::Reverted {
            tx_hash: receipt.transaction_hash,
            block_number,
        });
    }

    Ok(TradeReceipt {
        tx_hash: receipt.transaction_hash,
        block_number,
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
    })
}

#[async_trait]
impl<M: Middleware + 'static> TradeExecutor for ContractTradeExecutor<M> {
    async fn execute_trade(&self, request: &TradeRequest) -> Result<TradeReceipt, ExecutionError> {
        info!(
            target: "trade_executor",
            "发送 executeTrade: start_on_a={} token0={:?} token1={:?} amount={} gas_limit={} gas_price={} wei",
            request.start_on_a(),
            request.token0,
            request.token1,
            request.amount_in,
            request.gas.gas_limit,
            request.gas.gas_price
        );

        let call = self
            .contract
            .execute_trade(request.start_on_a(), request.token0, request.token1, request.amount_in)
            .from(self.from)
            .gas(request.gas.gas_limit)
            .gas_price(request.gas.gas_price);

        let pending_tx = call
            .send()
            .await
            .map_err(|e| ExecutionError::SendFailed(format!("{:?}", e)))?;
        let tx_hash = pending_tx.tx_hash();
        info!(target: "trade_executor", "交易已发送: {:?}", tx_hash);

        let receipt = match tokio::time::timeout(self.confirmation_timeout, pending_tx).await {
            Err(_) => {
                return Err(ExecutionError::ConfirmationTimeout {
                    tx_hash,
                    waited: self.confirmation_timeout,
                })
            }
            Ok(Err(e)) => {
                return Err(ExecutionError::Provider {
                    tx_hash,
                    reason: e.to_string(),
                })
            }
            Ok(Ok(None)) => return Err(ExecutionError::Dropped(tx_hash)),
            Ok(Ok(Some(receipt))) => receipt,
        };
        debug!("交易回执: {:?}", receipt);

        match summarize_receipt(receipt) {
            Ok(summary) => {
                info!(
                    target: "trade_executor",
                    "交易确认成功: {:?} | Block: {:?} | Gas used: {:?}",
                    summary.tx_hash, summary.block_number, summary.gas_used
                );
                Ok(summary)
            }
            Err(e) => {
                error!(target: "trade_executor", "❌ 交易 Revert: {}", e);
                Err(e)
            }
        }
    }
}
