mod swap_watcher;
mod wallet;

pub use swap_watcher::*;
pub use wallet::*;
