mod logger;
pub mod units;

pub use logger::LoggerManager;
pub use units::{
    format_fixed, gas_cost_in_native, gwei_to_wei, round_percentage, to_display,
    to_on_chain_units, UnitsError, MAX_DECIMAL_PRECISION,
};
