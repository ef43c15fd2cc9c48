mod handlers;
mod routes;
mod state;

pub use routes::{create_server, start_server};
pub use state::{AppState, BotInfo, ExchangeInfo};
