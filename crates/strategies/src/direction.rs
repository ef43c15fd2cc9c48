use models::{DirectionPlan, ExchangeId};
use rust_decimal::Decimal;
use utils::round_percentage;

/// 价差方向判断
///
/// `pct_diff = (price_a - price_b) / price_b * 100`，与阈值比较使用全精度，边界包含在内:
/// - `pct_diff >= threshold`: 在 B 买入，在 A 卖出
/// - `pct_diff <= -threshold`: 在 A 买入，在 B 卖出
///
/// 两边价格相同时不产生方向 (阈值为 0 时也一样)。
pub fn resolve_direction(price_a: Decimal, price_b: Decimal, threshold_pct: Decimal) -> Option<DirectionPlan> {
    let pct_diff = percentage_difference(price_a, price_b)?;
    if pct_diff.is_zero() {
        return None;
    }

    let (buy_on, sell_on) = if pct_diff >= threshold_pct {
        (ExchangeId::B, ExchangeId::A)
    } else if pct_diff <= -threshold_pct {
        (ExchangeId::A, ExchangeId::B)
    } else {
        return None;
    };

    Some(DirectionPlan {
        buy_on,
        sell_on,
        pct_diff,
        pct_diff_display: round_percentage(pct_diff),
    })
}

/// (price_a - price_b) / price_b * 100, price_b 为零或溢出时返回 None
pub fn percentage_difference(price_a: Decimal, price_b: Decimal) -> Option<Decimal> {
    price_a
        .checked_sub(price_b)?
        .checked_div(price_b)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
