//! 执行器错误类型

use ethers::types::H256;
use std::time::Duration;
use thiserror::Error;

/// `executeTrade` 各阶段的失败
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// 交易未能发出 (eth_call 预检失败、nonce 或签名问题)
    #[error("executeTrade could not be sent: {0}")]
    SendFailed(String),

    /// 已上链但 status = 0
    #[error("executeTrade {tx_hash:?} reverted in block {block_number:?}")]
    Reverted {
        tx_hash: H256,
        block_number: Option<u64>,
    },

    /// 节点不再返回该交易
    #[error("executeTrade {0:?} dropped from mempool")]
    Dropped(H256),

    #[error("error while waiting for {tx_hash:?}: {reason}")]
    Provider { tx_hash: H256, reason: String },

    #[error("executeTrade {tx_hash:?} not confirmed within {waited:?}")]
    ConfirmationTimeout { tx_hash: H256, waited: Duration },
}

impl ExecutionError {
    /// 已发出的交易哈希 (未发出时为 None)
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            Self::SendFailed(_) => None,
            Self::Reverted { tx_hash, .. }
            | Self::Provider { tx_hash, .. }
            | Self::ConfirmationTimeout { tx_hash, .. } => Some(*tx_hash),
            Self::Dropped(tx_hash) => Some(*tx_hash),
        }
    }
}
