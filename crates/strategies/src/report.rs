use anyhow::Result;
use models::{TokenPair, TradeSimulation};
use rust_decimal::Decimal;
use serde::Serialize;
use services::WalletReader;
use utils::{format_fixed, to_display};

/// 原生币精度
const NATIVE_DECIMALS: u8 = 18;

/// 某一时刻的钱包余额 (展示单位)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalletSnapshot {
    pub native: Decimal,
    pub base: Decimal,
    pub block_number: Option<u64>,
}

impl WalletSnapshot {
    pub async fn read(wallet: &dyn WalletReader, pair: &TokenPair) -> Result<Self> {
        let native_raw = wallet.native_balance().await?;
        let base_raw = wallet.token_balance(pair.base.address).await?;
        // 区块高度只用于展示
        let block_number = wallet.block_number().await.ok();

        Ok(Self {
            native: to_display(native_raw, NATIVE_DECIMALS)?,
            base: to_display(base_raw, pair.base.decimals)?,
            block_number,
        })
    }
}

/// 余额变化报告 (预估或实际)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceReport {
    pub native_before: Decimal,
    pub native_after: Decimal,
    /// gas 花费 (原生币)
    pub native_spent: Decimal,
    pub base_before: Decimal,
    pub base_after: Decimal,
    pub base_delta: Decimal,
    /// base 变化减去按汇率折算的 gas
    pub total: Decimal,
}

impl BalanceReport {
    /// 按模拟结果预估交易后的余额
    pub fn projected(
        before: &WalletSnapshot,
        simulation: &TradeSimulation,
        gas_cost_native: Decimal,
        native_to_base_rate: Decimal,
    ) -> Self {
        let base_delta = simulation.gross_profit();
        Self {
            native_before: before.native,
            native_after: before.native - gas_cost_native,
            native_spent: gas_cost_native,
            base_before: before.base,
            base_after: before.base + base_delta,
            base_delta,
            total: base_delta - gas_cost_native * native_to_base_rate,
        }
    }

    /// 交易确认后的实际余额变化
    pub fn realized(before: &WalletSnapshot, after: &WalletSnapshot, native_to_base_rate: Decimal) -> Self {
        let native_spent = before.native - after.native;
        let base_delta = after.base - before.base;
        Self {
            native_before: before.native,
            native_after: after.native,
            native_spent,
            base_before: before.base,
            base_after: after.base,
            base_delta,
            total: base_delta - native_spent * native_to_base_rate,
        }
    }

    /// 表格形式的日志行
    pub fn lines(&self, pair: &TokenPair, precision: u32) -> Vec<String> {
        let base = &pair.base.symbol;
        let row = |label: String, value: Decimal| format!("│ {:<28} │ {:>32} │", label, format_fixed(value, precision));

        vec![
            row("Native Balance Before".to_string(), self.native_before),
            row("Native Balance After".to_string(), self.native_after),
            row("Native Spent (gas)".to_string(), self.native_spent),
            row(format!("{} Balance Before", base), self.base_before),
            row(format!("{} Balance After", base), self.base_after),
            row(format!("{} Gained/Lost", base), self.base_delta),
            row("Total Gained/Lost".to_string(), self.total),
        ]
    }
}
