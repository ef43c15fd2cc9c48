use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use strategies::{CycleSummary, GuardStats};

use crate::state::{AppState, BotInfo};

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Serialize)]
pub struct WatcherStatus {
    pub swaps_received: u64,
    pub swaps_dropped: u64,
}

#[derive(Serialize)]
pub struct BotStatus {
    #[serde(flatten)]
    pub info: BotInfo,
    pub cycles: GuardStats,
    pub last_cycle: Option<CycleSummary>,
    pub watcher: Option<WatcherStatus>,
    pub uptime_seconds: i64,
    pub version: String,
}

/// 获取运行状态
pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<BotStatus>> {
    let watcher = state.watcher.as_ref().map(|w| WatcherStatus {
        swaps_received: w.received(),
        swaps_dropped: w.dropped(),
    });

    Json(ApiResponse::success(BotStatus {
        info: state.info.as_ref().clone(),
        cycles: state.orchestrator.guard().stats(),
        last_cycle: state.orchestrator.last_cycle(),
        watcher,
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}
