use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// 创建 API 路由
pub fn create_server(state: AppState) -> Router {
    // CORS 配置
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // 健康检查
        .route("/health", get(handlers::health_check))
        // 运行状态
        .route("/api/status", get(handlers::get_status))
        .layer(cors)
        .with_state(state)
}

/// 启动服务器，直到 shutdown 完成
pub async fn start_server(
    app: Router,
    host: &str,
    port: u16,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法绑定地址 {}", addr))?;

    info!("API 服务器启动: http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API 服务器异常退出")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BotInfo, ExchangeInfo};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use dex::UniswapV2Exchange;
    use ethers::providers::{Http, Provider};
    use ethers::types::{Address, U256};
    use models::{ExchangeId, GasParams, PoolHandle, Token, TokenPair};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use strategies::{ArbitrageOrchestrator, OrchestratorConfig, ProfitSimulator, SimulatorConfig};
    use tower::ServiceExt;

    fn pool(exchange: ExchangeId, name: &str) -> PoolHandle {
        PoolHandle {
            exchange,
            name: name.to_string(),
            pair_address: Address::repeat_byte(0x10),
            router_address: Address::repeat_byte(0x20),
            token0: Address::repeat_byte(0x01),
            token1: Address::repeat_byte(0x02),
        }
    }

    /// 不会发起任何链上调用 (没有触发信号)
    fn state() -> AppState {
        let provider = Arc::new(Provider::<Http>::try_from("http://127.0.0.1:8545").unwrap());
        let pair = TokenPair::new(
            Token::new(Address::repeat_byte(0x01), "WETH".into(), "Wrapped Ether".into(), 18),
            Token::new(Address::repeat_byte(0x02), "SHIB".into(), "SHIBA INU".into(), 18),
        );
        let pool_a = pool(ExchangeId::A, "Uniswap");
        let pool_b = pool(ExchangeId::B, "Sushiswap");

        let simulator = ProfitSimulator::new(
            pair.clone(),
            SimulatorConfig {
                gas_limit: 400_000,
                gas_price_gwei: dec!(20),
                native_to_base_rate: Decimal::ONE,
                display_precision: 6,
            },
        );
        let orchestrator = ArbitrageOrchestrator::new(
            pair.clone(),
            Arc::new(UniswapV2Exchange::new(provider.clone(), pool_a.clone())),
            Arc::new(UniswapV2Exchange::new(provider, pool_b.clone())),
            simulator,
            OrchestratorConfig {
                price_difference_pct: dec!(0.5),
                display_precision: 6,
                gas: GasParams {
                    gas_limit: U256::from(400_000),
                    gas_price: U256::from(20_000_000_000u64),
                },
                native_to_base_rate: Decimal::ONE,
            },
        );

        let info = BotInfo {
            pair: pair.label(),
            base_token: pair.base.address,
            quote_token: pair.quote.address,
            exchanges: vec![ExchangeInfo::from(&pool_a), ExchangeInfo::from(&pool_b)],
            price_difference_pct: dec!(0.5),
            execution_enabled: false,
        };
        AppState::new(info, Arc::new(orchestrator))
    }

    async fn get_json(path: &str) -> (StatusCode, serde_json::Value) {
        let app = create_server(state());
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["evaluating"], false);
    }

    #[tokio::test]
    async fn test_status() {
        let (status, body) = get_json("/api/status").await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(body["success"], true);
        assert_eq!(data["pair"], "SHIB/WETH");
        assert_eq!(data["exchanges"][1]["name"], "Sushiswap");
        assert_eq!(data["execution_enabled"], false);
        assert_eq!(data["cycles"]["cycles_started"], 0);
        assert_eq!(data["cycles"]["evaluating"], false);
        assert!(data["last_cycle"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_server(state());
        let response = app
            .oneshot(Request::builder().uri("/api/trades").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
