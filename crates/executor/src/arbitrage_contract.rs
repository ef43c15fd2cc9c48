//! Arbitrage 合约 ABI 绑定
//!
//! 合约在 `_startOnUniswap` 一侧用闪电贷借入 `_token0`，买入 `_token1`，
//! 再在另一侧卖回 `_token0` 并归还借款。

use ethers::prelude::*;

abigen!(
    ArbitrageContract,
    r#"[
        {
            "inputs": [
                {"name": "_startOnUniswap", "type": "bool"},
                {"name": "_token0", "type": "address"},
                {"name": "_token1", "type": "address"},
                {"name": "_flashAmount", "type": "uint256"}
            ],
            "name": "executeTrade",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "owner",
            "outputs": [{"name": "", "type": "address"}],
            "stateMutability": "view",
            "type": "function"
        }
    ]"#
);
