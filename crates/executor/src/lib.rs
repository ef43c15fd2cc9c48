//! 套利执行器模块
//!
//! 负责调用链上套利合约执行交易
//!
//! ## 模块结构
//!
//! - `executor`: `TradeExecutor` trait 与基于合约调用的实现
//! - `arbitrage_contract`: 套利合约 ABI 绑定
//! - `types`: 错误类型定义

mod arbitrage_contract;
mod executor;
mod types;

pub use arbitrage_contract::ArbitrageContract;
pub use executor::{ContractTradeExecutor, SignedExecutor, TradeExecutor};
pub use types::ExecutionError;
