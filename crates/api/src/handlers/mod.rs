mod health;
mod status;

pub use health::*;
pub use status::*;
