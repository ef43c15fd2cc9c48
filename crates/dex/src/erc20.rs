use anyhow::{Context, Result};
use ethers::prelude::*;
use models::Token;
use std::sync::Arc;
use tracing::info;

abigen!(
    Erc20,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
        function decimals() external view returns (uint8)
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

/// 读取 ERC20 元数据 (symbol / name / decimals)
pub async fn resolve_token<M: Middleware + 'static>(provider: Arc<M>, address: Address) -> Result<Token> {
    let contract = Erc20::new(address, provider);

    let symbol = contract
        .symbol()
        .call()
        .await
        .with_context(|| format!("读取 symbol 失败: {:?}", address))?;
    let name = contract
        .name()
        .call()
        .await
        .with_context(|| format!("读取 name 失败: {:?}", address))?;
    let decimals = contract
        .decimals()
        .call()
        .await
        .with_context(|| format!("读取 decimals 失败: {:?}", address))?;

    info!("代币解析完成: {} ({}) {:?}, decimals={}", symbol, name, address, decimals);

    Ok(Token::new(address, symbol, name, decimals))
}
