use anyhow::{anyhow, bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Uniswap V2 (Ethereum Mainnet)
const UNISWAP_V2_FACTORY: &str = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f";
const UNISWAP_V2_ROUTER: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";
/// SushiSwap (Ethereum Mainnet)
const SUSHISWAP_FACTORY: &str = "0xC0AEe478e3658e2610c5F7A4A2E1777cE9e4f2Ac";
const SUSHISWAP_ROUTER: &str = "0xd9e1cE17f2641f24aE83637ab66a2cca9C378B9F";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub exchange_a: ExchangeConfig,
    pub exchange_b: ExchangeConfig,
    pub arbitrage: ArbitrageConfig,
    pub wallet: WalletConfig,
    pub watcher: WatcherConfig,
    pub api: ApiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub ws_url: String,
}

/// 单个 V2 风格交易所 (Factory + Router)
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    pub name: String,
    pub factory: String,
    pub router: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrageConfig {
    /// 利润结算代币 (ARB_FOR)
    pub base_token: String,
    /// 对手代币 (ARB_AGAINST)
    pub quote_token: String,
    /// 价格展示精度 (UNITS)
    pub display_precision: u32,
    /// 触发套利的价差阈值 (百分比, 如 0.5 = 0.5%)
    pub price_difference_pct: Decimal,
    pub gas_limit: u64,
    /// Gas 价格 (Gwei) - 支持小数
    pub gas_price_gwei: Decimal,
    /// 1 个原生币折合多少 base 代币 (base 为 WETH 时为 1)
    pub native_to_base_rate: Decimal,
    /// 是否真正发送交易 (false 时只做检测)
    pub execution_enabled: bool,
    pub arbitrage_contract: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// 触发事件通道容量
    pub trigger_channel_capacity: usize,
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
}

/// 读取可选变量，空字符串视为未设置
fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    optional(lookup, key).ok_or_else(|| anyhow!("{} not set", key))
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = optional(lookup, key).unwrap_or_else(|| default.to_string());
    raw.parse::<T>()
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Invalid {}: {}", key, raw))
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // 加载 .env 文件
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意 key-value 来源构建配置 (测试时不依赖进程环境变量)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let network = NetworkConfig {
            rpc_url: required(&lookup, "RPC_URL")?,
            ws_url: required(&lookup, "WS_URL")?,
        };

        let exchange_a = ExchangeConfig {
            name: optional(&lookup, "EXCHANGE_A_NAME").unwrap_or_else(|| "Uniswap".to_string()),
            factory: optional(&lookup, "EXCHANGE_A_FACTORY")
                .unwrap_or_else(|| UNISWAP_V2_FACTORY.to_string()),
            router: optional(&lookup, "EXCHANGE_A_ROUTER")
                .unwrap_or_else(|| UNISWAP_V2_ROUTER.to_string()),
        };

        let exchange_b = ExchangeConfig {
            name: optional(&lookup, "EXCHANGE_B_NAME").unwrap_or_else(|| "Sushiswap".to_string()),
            factory: optional(&lookup, "EXCHANGE_B_FACTORY")
                .unwrap_or_else(|| SUSHISWAP_FACTORY.to_string()),
            router: optional(&lookup, "EXCHANGE_B_ROUTER")
                .unwrap_or_else(|| SUSHISWAP_ROUTER.to_string()),
        };

        // 套利配置
        let arbitrage = ArbitrageConfig {
            base_token: required(&lookup, "ARB_FOR")?,
            quote_token: required(&lookup, "ARB_AGAINST")?,
            display_precision: parse_or(&lookup, "UNITS", "6")?,
            price_difference_pct: parse_or(&lookup, "PRICE_DIFFERENCE", "0.50")?,
            gas_limit: parse_or(&lookup, "GAS_LIMIT", "400000")?,
            gas_price_gwei: parse_or(&lookup, "GAS_PRICE", "20")?,
            native_to_base_rate: parse_or(&lookup, "NATIVE_TO_BASE_RATE", "1")?,
            execution_enabled: parse_or(&lookup, "EXECUTION_ENABLED", "false")?,
            arbitrage_contract: optional(&lookup, "ARBITRAGE_CONTRACT"),
        };

        let wallet = WalletConfig {
            private_key: optional(&lookup, "PRIVATE_KEY"),
        };

        let watcher = WatcherConfig {
            trigger_channel_capacity: parse_or(&lookup, "TRIGGER_CHANNEL_CAPACITY", "16")?,
            reconnect_delay_secs: parse_or(&lookup, "WS_RECONNECT_DELAY_SECS", "5")?,
        };

        // API 配置
        let api = ApiConfig {
            host: optional(&lookup, "SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", "5000")?,
        };

        // 日志配置
        let log = LogConfig {
            level: optional(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
            dir: optional(&lookup, "LOG_DIR").unwrap_or_else(|| "./logs".to_string()),
        };

        let config = Self {
            network,
            exchange_a,
            exchange_b,
            arbitrage,
            wallet,
            watcher,
            api,
            log,
        };
        config.validate()?;
        Ok(config)
    }

    /// 启动前校验，任何错误都会终止进程
    pub fn validate(&self) -> Result<()> {
        let arb = &self.arbitrage;

        if arb.price_difference_pct.is_sign_negative() {
            bail!("PRICE_DIFFERENCE must not be negative: {}", arb.price_difference_pct);
        }
        if arb.gas_limit == 0 {
            bail!("GAS_LIMIT must be greater than zero");
        }
        if arb.gas_price_gwei.is_sign_negative() {
            bail!("GAS_PRICE must not be negative: {}", arb.gas_price_gwei);
        }
        // 1 wei = 10^-9 gwei
        if arb.gas_price_gwei.normalize().scale() > 9 {
            bail!("GAS_PRICE must not be finer than 1 wei (9 decimals in gwei): {}", arb.gas_price_gwei);
        }
        if arb.native_to_base_rate <= Decimal::ZERO {
            bail!("NATIVE_TO_BASE_RATE must be positive: {}", arb.native_to_base_rate);
        }
        if arb.display_precision > 28 {
            bail!("UNITS must be at most 28: {}", arb.display_precision);
        }
        if arb.base_token.eq_ignore_ascii_case(&arb.quote_token) {
            bail!("ARB_FOR and ARB_AGAINST must be different tokens");
        }
        if self.watcher.trigger_channel_capacity == 0 {
            bail!("TRIGGER_CHANNEL_CAPACITY must be greater than zero");
        }
        if arb.execution_enabled {
            if self.wallet.private_key.is_none() {
                bail!("PRIVATE_KEY is required when EXECUTION_ENABLED=true");
            }
            if arb.arbitrage_contract.is_none() {
                bail!("ARBITRAGE_CONTRACT is required when EXECUTION_ENABLED=true");
            }
        }

        Ok(())
    }
}
