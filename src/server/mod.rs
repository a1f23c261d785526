use std::sync::Arc;

use anyhow::Result;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::{aggregator::Aggregator, logging, util::http::HttpClient};

/// TradingView 交易想法
pub mod feed;
/// 股票搜尋 (尚未提供)
pub mod search;
/// 股票報價
pub mod stock;

/// 所有 handler 共用的狀態
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub http: HttpClient,
    pub tradingview_feed_url: Arc<str>,
}

impl AppState {
    pub fn new(aggregator: Aggregator, http: HttpClient, tradingview_feed_url: &str) -> Self {
        AppState {
            aggregator: Arc::new(aggregator),
            http,
            tradingview_feed_url: Arc::from(tradingview_feed_url),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/stock", get(stock::get_stock))
        .route("/search", get(search::search_stocks))
        .route("/tradingview-feed", get(feed::get_tradingview_feed));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(cors_layer())
        .with_state(state)
}

/// 前端可能掛在任何網域下
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// 啟動 HTTP 服務，收到 Ctrl+C 後結束
pub async fn start(state: AppState, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    logging::info_file_async(format!("HTTP server listening on {}", addr));
    logging::info_console(format!("HTTP server listening on {}", addr));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    logging::info_file_async("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(why) = tokio::signal::ctrl_c().await {
        logging::error_file_async(format!("Failed to listen for shutdown signal because {:?}", why));
    }
}
