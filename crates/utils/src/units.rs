//! 链上整数单位与展示单位之间的定点换算
//!
//! 所有跨单位换算集中在此模块，调用方不得自行除以 10^decimals。
//!
//! | 函数 | 方向 | 舍入 |
//! |------|------|------|
//! | [`to_display`] | 链上 -> 展示 | 向零截断 (超过 28 位有效数字时丢弃低位) |
//! | [`to_on_chain_units`] | 展示 -> 链上 | 向零截断 |
//! | [`gwei_to_wei`] | gwei -> wei | 精确，不足 1 wei 报错 |
//! | [`gas_cost_in_native`] | gas * gwei -> 原生币 | 精确 |
//! | [`format_fixed`] / [`round_percentage`] | 展示 | 四舍五入 (远离零) |

use ethers::types::U256;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Decimal 最多 28 位有效数字
pub const MAX_DECIMAL_PRECISION: u32 = 28;

/// 1 gwei = 10^9 wei
const GWEI_DECIMALS: u8 = 9;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    #[error("unsupported token decimals: {0} (max 28)")]
    UnsupportedDecimals(u32),

    #[error("value {0} does not fit in a decimal")]
    Overflow(String),

    #[error("negative amount cannot be converted to on-chain units: {0}")]
    Negative(Decimal),

    #[error("{value} has more than {max_scale} fractional digits")]
    Inexact { value: Decimal, max_scale: u32 },
}

/// 10^exp, 溢出时返回 None
fn pow10(exp: u32) -> Option<Decimal> {
    let mut value = Decimal::ONE;
    for _ in 0..exp {
        value = value.checked_mul(Decimal::TEN)?;
    }
    Some(value)
}

/// 链上整数 -> 展示单位
///
/// 超出 28 位有效数字的低位被截断 (向零舍入)，18 位精度代币在 10^10 以内的数量不受影响。
pub fn to_display(raw: U256, decimals: u8) -> Result<Decimal, UnitsError> {
    let decimals = u32::from(decimals);
    if decimals > MAX_DECIMAL_PRECISION {
        return Err(UnitsError::UnsupportedDecimals(decimals));
    }

    let digits = raw.to_string();
    let excess = digits.len().saturating_sub(MAX_DECIMAL_PRECISION as usize);
    let kept = &digits[..digits.len() - excess];
    let mantissa: i128 = kept
        .parse()
        .map_err(|_| UnitsError::Overflow(digits.clone()))?;

    let excess = excess as u32;
    if excess <= decimals {
        Decimal::try_from_i128_with_scale(mantissa, decimals - excess)
            .map_err(|_| UnitsError::Overflow(digits))
    } else {
        let base = Decimal::try_from_i128_with_scale(mantissa, 0)
            .map_err(|_| UnitsError::Overflow(digits.clone()))?;
        pow10(excess - decimals)
            .and_then(|factor| base.checked_mul(factor))
            .ok_or(UnitsError::Overflow(digits))
    }
}

/// 展示单位 -> 链上整数
///
/// 超出 `decimals` 位的小数部分向零截断；负数返回错误。
pub fn to_on_chain_units(value: Decimal, decimals: u8) -> Result<U256, UnitsError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(UnitsError::Negative(value));
    }
    let decimals_u32 = u32::from(decimals);
    if decimals_u32 > MAX_DECIMAL_PRECISION {
        return Err(UnitsError::UnsupportedDecimals(decimals_u32));
    }

    let truncated = value.round_dp_with_strategy(decimals_u32, RoundingStrategy::ToZero);
    // 非负且已截断，mantissa 一定可以放入 u128
    let mantissa = U256::from(truncated.mantissa().unsigned_abs());
    let shift = decimals_u32 - truncated.scale();

    mantissa
        .checked_mul(U256::exp10(shift as usize))
        .ok_or_else(|| UnitsError::Overflow(value.to_string()))
}

/// gwei (可带小数) -> wei, 小数超过 9 位 (不足 1 wei) 时报错
pub fn gwei_to_wei(gwei: Decimal) -> Result<U256, UnitsError> {
    let max_scale = u32::from(GWEI_DECIMALS);
    if gwei.normalize().scale() > max_scale {
        return Err(UnitsError::Inexact { value: gwei, max_scale });
    }
    to_on_chain_units(gwei, GWEI_DECIMALS)
}

/// gas 成本 (原生币展示单位): gas_limit * gas_price_gwei / 1e9
pub fn gas_cost_in_native(gas_limit: u64, gas_price_gwei: Decimal) -> Result<Decimal, UnitsError> {
    let overflow = || UnitsError::Overflow(format!("{} * {}", gas_limit, gas_price_gwei));
    let gwei_total = Decimal::from(gas_limit)
        .checked_mul(gas_price_gwei)
        .ok_or_else(overflow)?;
    let divisor = pow10(u32::from(GWEI_DECIMALS)).ok_or_else(overflow)?;
    gwei_total.checked_div(divisor).ok_or_else(overflow)
}

/// 固定小数位展示 (四舍五入，远离零)
pub fn format_fixed(value: Decimal, precision: u32) -> String {
    let rounded = value.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", precision as usize, rounded)
}

/// 百分比展示值, 保留两位小数
pub fn round_percentage(pct: Decimal) -> Decimal {
    pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
