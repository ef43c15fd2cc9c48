pub mod common;
pub mod erc20;
pub mod uniswap;

pub use common::ExchangeClient;
pub use erc20::{resolve_token, Erc20};
pub use uniswap::{
    calculate_amount_in, calculate_amount_out, quote_amounts_in, quote_amounts_out,
    UniswapV2Exchange, SWAP_EVENT_TOPIC,
};
