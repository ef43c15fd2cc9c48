use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Token 信息 (启动时解析一次，之后不可变)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: String, name: String, decimals: u8) -> Self {
        Self {
            address,
            symbol,
            name,
            decimals,
        }
    }
}

/// 套利交易对
///
/// `base` 为利润结算代币 (ARB_FOR)，`quote` 为对手代币 (ARB_AGAINST)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub base: Token,
    pub quote: Token,
}

impl TokenPair {
    pub fn new(base: Token, quote: Token) -> Self {
        Self { base, quote }
    }

    /// 买入路径: base -> quote
    pub fn buy_path(&self) -> [Address; 2] {
        [self.base.address, self.quote.address]
    }

    /// 卖出路径: quote -> base
    pub fn sell_path(&self) -> [Address; 2] {
        [self.quote.address, self.base.address]
    }

    /// 用于日志的交易对名称, 如 "SHIB/WETH"
    pub fn label(&self) -> String {
        format!("{}/{}", self.quote.symbol, self.base.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(byte: u8, symbol: &str) -> Token {
        Token::new(Address::repeat_byte(byte), symbol.to_string(), symbol.to_string(), 18)
    }

    #[test]
    fn test_paths_are_mirrored() {
        let pair = TokenPair::new(token(1, "WETH"), token(2, "SHIB"));

        assert_eq!(pair.buy_path(), [Address::repeat_byte(1), Address::repeat_byte(2)]);
        assert_eq!(pair.sell_path(), [Address::repeat_byte(2), Address::repeat_byte(1)]);
        assert_eq!(pair.label(), "SHIB/WETH");
    }
}
