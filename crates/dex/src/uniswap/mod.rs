pub mod v2;

pub use v2::{
    calculate_amount_in, calculate_amount_out, quote_amounts_in, quote_amounts_out,
    UniswapV2Exchange, SWAP_EVENT_TOPIC,
};
