use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::balances::monitor::BalanceMonitor;
use crate::balances::types::{BalanceResult, ProviderInfo, TrackedAddress};
use crate::types::chain::ChainType;

/// Tracked pair together with its latest observation
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BalanceSnapshot {
    tracked: TrackedAddress,
    latest: Option<BalanceResult>,
}

/// Provider endpoints available for one chain
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ApiSources {
    chain: ChainType,
    current: Option<String>,
    providers: Vec<ProviderInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DetectChainQuery {
    address: String,
}

/// Chain guessed from an address format
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DetectedChain {
    address: String,
    chain: ChainType,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SetRefreshIntervalRequest {
    milliseconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SetApiSourceRequest {
    chain: ChainType,
    endpoint: String,
}

/// HTTP routes over the monitor's inbound interface
pub(crate) fn router(monitor: BalanceMonitor) -> Router {
    let cors = CorsLayer::new().allow_origin(Any);

    Router::new()
        .route("/api/balance", get(get_balance))
        .route("/api/address", get(get_address).put(set_address))
        .route("/api/detect", get(detect_chain))
        .route("/api/refresh", post(refresh))
        .route("/api/refresh_interval", put(set_refresh_interval))
        .route("/api/sources", get(get_api_sources).put(set_api_source))
        .layer(cors)
        .with_state(monitor)
}

/// HTTP handler for GET `/api/balance`
async fn get_balance(State(monitor): State<BalanceMonitor>) -> Json<BalanceSnapshot> {
    Json(BalanceSnapshot {
        tracked: monitor.address().await,
        latest: monitor.latest_balance().await,
    })
}

/// HTTP handler for GET `/api/address`
async fn get_address(State(monitor): State<BalanceMonitor>) -> Json<TrackedAddress> {
    Json(monitor.address().await)
}

/// HTTP handler for PUT `/api/address`
async fn set_address(
    State(monitor): State<BalanceMonitor>,
    Json(request): Json<TrackedAddress>,
) -> StatusCode {
    monitor.set_address(request.chain, request.address).await;
    StatusCode::NO_CONTENT
}

/// HTTP handler for GET `/api/detect?address=...`
async fn detect_chain(Query(query): Query<DetectChainQuery>) -> Json<DetectedChain> {
    Json(DetectedChain {
        chain: ChainType::detect(&query.address),
        address: query.address,
    })
}

/// HTTP handler for POST `/api/refresh`
async fn refresh(State(monitor): State<BalanceMonitor>) -> StatusCode {
    monitor.refresh().await;
    StatusCode::ACCEPTED
}

/// HTTP handler for PUT `/api/refresh_interval`
async fn set_refresh_interval(
    State(monitor): State<BalanceMonitor>,
    Json(request): Json<SetRefreshIntervalRequest>,
) -> StatusCode {
    match monitor.set_refresh_interval(request.milliseconds).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// HTTP handler for GET `/api/sources`
async fn get_api_sources(State(monitor): State<BalanceMonitor>) -> Json<Vec<ApiSources>> {
    let sources: Vec<ApiSources> = monitor
        .supported_chains()
        .into_iter()
        .map(|chain| ApiSources {
            chain,
            current: monitor.current_api_source(chain),
            providers: monitor.api_sources(chain),
        })
        .collect();

    Json(sources)
}

/// HTTP handler for PUT `/api/sources`
async fn set_api_source(
    State(monitor): State<BalanceMonitor>,
    Json(request): Json<SetApiSourceRequest>,
) -> StatusCode {
    monitor.set_preferred_api_source(request.chain, &request.endpoint);
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::providers::bitcoin::{BLOCKSTREAM_API, MEMPOOL_SPACE_API};
    use crate::balances::types::MonitorEvent;
    use crate::config::MonitorConfig;
    use serde_json::json;
    use tokio::net::TcpListener;

    async fn serve(monitor: BalanceMonitor) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(monitor)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_sources_routes() {
        let monitor = BalanceMonitor::new(&MonitorConfig::default()).unwrap();
        let base = serve(monitor.clone()).await;
        let client = reqwest::Client::new();

        let sources: Vec<ApiSources> = client
            .get(format!("{base}/api/sources"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].chain, ChainType::Bitcoin);
        assert_eq!(sources[0].current.as_deref(), Some(MEMPOOL_SPACE_API));
        let bitcoin = &sources[0].providers;
        assert_eq!(bitcoin.len(), 2);
        assert_eq!(bitcoin[0].endpoint, MEMPOOL_SPACE_API);
        assert_eq!(bitcoin[0].name, "mempool.space");
        assert_eq!(bitcoin[0].description, "Open-source explorer with mempool visualization");
        assert_eq!(bitcoin[1].endpoint, BLOCKSTREAM_API);

        let status = client
            .put(format!("{base}/api/sources"))
            .json(&json!({ "chain": "BITCOIN", "endpoint": BLOCKSTREAM_API }))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::NO_CONTENT);
        assert_eq!(
            monitor.current_api_source(ChainType::Bitcoin).as_deref(),
            Some(BLOCKSTREAM_API)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_address_and_balance_routes() {
        let monitor = BalanceMonitor::new(&MonitorConfig::default()).unwrap();
        let mut rx = monitor.subscribe();
        let base = serve(monitor.clone()).await;
        let client = reqwest::Client::new();

        // no BNB Chain handler, so nothing goes over the network
        let status = client
            .put(format!("{base}/api/address"))
            .json(&json!({ "chain": "BNBCHAIN", "address": "0xabc" }))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::NO_CONTENT);

        loop {
            if let MonitorEvent::BalanceUpdated(_) = rx.recv().await.unwrap() {
                break;
            }
        }

        let snapshot: BalanceSnapshot = client
            .get(format!("{base}/api/balance"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot.tracked, TrackedAddress::new(ChainType::Bnbchain, "0xabc"));
        let latest = snapshot.latest.unwrap();
        assert!(!latest.success);
        assert_eq!(latest.error_message, "No handler registered for this chain");

        let tracked: TrackedAddress = client
            .get(format!("{base}/api/address"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(tracked.chain, ChainType::Bnbchain);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_detect_route() {
        let monitor = BalanceMonitor::new(&MonitorConfig::default()).unwrap();
        let base = serve(monitor).await;
        let client = reqwest::Client::new();

        let detected: DetectedChain = client
            .get(format!(
                "{base}/api/detect?address=0x78697a9cfc48c1e9d1040172d51833ef78083b10"
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(detected.chain, ChainType::Ethereum);

        let detected: DetectedChain = client
            .get(format!("{base}/api/detect?address=not-an-address"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(detected.chain, ChainType::Unknown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_refresh_interval_route() {
        let monitor = BalanceMonitor::new(&MonitorConfig::default()).unwrap();
        let base = serve(monitor.clone()).await;
        let client = reqwest::Client::new();

        let status = client
            .put(format!("{base}/api/refresh_interval"))
            .json(&json!({ "milliseconds": 1500 }))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::NO_CONTENT);
        assert_eq!(
            monitor.refresh_interval().await,
            std::time::Duration::from_millis(1500)
        );

        let status = client
            .put(format!("{base}/api/refresh_interval"))
            .json(&json!({ "milliseconds": 0 }))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::UNPROCESSABLE_ENTITY);

        // idle monitor accepts and ignores a refresh
        let status = client
            .post(format!("{base}/api/refresh"))
            .send()
            .await
            .unwrap()
            .status();
        assert_eq!(status, reqwest::StatusCode::ACCEPTED);
    }
}
