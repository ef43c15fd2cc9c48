use chrono::Utc;
use dex::ExchangeClient;
use models::{PoolHandle, PriceQuote, Reserves, TokenPair};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;
use utils::{to_display, UnitsError};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("[{exchange}] 储备量读取失败: {reason}")]
    ReservesUnavailable { exchange: String, reason: String },

    #[error("[{0}] 池子储备为零，无法定价")]
    EmptyReserves(String),

    #[error(transparent)]
    Units(#[from] UnitsError),
}

/// 现货价格: 每个 quote 值多少 base (按各自代币精度换算)
///
/// 价格只跟 base/quote 角色走，与池子内 token0/token1 的地址排序无关。
/// 价格越高说明 quote 在该池子越贵，应在价低的池子买入 quote。
pub struct PriceOracle {
    pair: TokenPair,
}

impl PriceOracle {
    pub fn new(pair: TokenPair) -> Self {
        Self { pair }
    }

    /// 由储备快照计算价格，不发起任何调用
    pub fn price_from_reserves(&self, pool: &PoolHandle, reserves: &Reserves) -> Result<Decimal, OracleError> {
        if reserves.is_empty() {
            return Err(OracleError::EmptyReserves(pool.name.clone()));
        }

        let (base_raw, quote_raw) = reserves.oriented(pool.token0, self.pair.base.address);
        let base = to_display(base_raw, self.pair.base.decimals)?;
        let quote = to_display(quote_raw, self.pair.quote.decimals)?;

        let price = base
            .checked_div(quote)
            .ok_or_else(|| UnitsError::Overflow(format!("{} / {}", base, quote)))?;

        // 截断后仍可能为零 (例如 1 wei / 10^28)
        if price.is_zero() {
            return Err(OracleError::EmptyReserves(pool.name.clone()));
        }

        Ok(price)
    }

    /// 读取最新储备并报价，失败不重试
    pub async fn quote_price(
        &self,
        client: &dyn ExchangeClient,
        block_number: Option<u64>,
    ) -> Result<PriceQuote, OracleError> {
        let pool = client.pool();
        let reserves = client
            .get_reserves()
            .await
            .map_err(|e| OracleError::ReservesUnavailable {
                exchange: pool.name.clone(),
                reason: format!("{:#}", e),
            })?;

        let price = self.price_from_reserves(pool, &reserves)?;
        debug!(
            "[{}] reserve0={} reserve1={} price={}",
            pool.name, reserves.reserve0, reserves.reserve1, price
        );

        Ok(PriceQuote {
            exchange: pool.exchange,
            exchange_name: pool.name.clone(),
            price,
            reserves,
            block_number,
            sampled_at: Utc::now(),
        })
    }
}
