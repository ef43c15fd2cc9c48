mod token;
mod pool;
mod arbitrage;
mod transaction;

pub use token::*;
pub use pool::*;
pub use arbitrage::*;
pub use transaction::*;
