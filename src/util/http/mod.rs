use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;

use crate::{error::FetchError, logging::Logger, util};

pub mod user_agent;

/// 沒有設定 UA 時自動產生的數量
const GENERATED_USER_AGENTS: usize = 16;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// HTTP client shared by every upstream source.
///
/// The user-agent pool is fixed at construction; each request picks one of
/// them at random. Cloning is cheap, both fields are reference counted.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agents: Arc<[String]>,
}

impl HttpClient {
    /// Builds the client. An empty `user_agents` list is replaced by a
    /// generated pool.
    pub fn new(user_agents: Vec<String>, timeout: Duration) -> Result<Self> {
        util::ensure_rustls_crypto_provider();

        let user_agents: Arc<[String]> = if user_agents.is_empty() {
            user_agent::gen_pool(GENERATED_USER_AGENTS).into()
        } else {
            user_agents.into()
        };

        let client = Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(timeout)
            .timeout(timeout)
            // ===== TCP 優化 =====
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            // ===== 連接池 =====
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))?;

        Ok(HttpClient {
            client,
            user_agents,
        })
    }

    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or("Mozilla/5.0")
    }

    /// Sends a GET request and returns the raw response, whatever its status.
    ///
    /// `headers` are applied after the default `User-Agent` / `Accept`, so a
    /// caller can override either of them.
    pub async fn get(
        &self,
        url: &str,
        headers: Option<header::HeaderMap>,
    ) -> Result<Response, FetchError> {
        let visit_log = format!("GET:{url}");
        let mut rb = self
            .client
            .get(url)
            .header(header::USER_AGENT, self.pick_user_agent())
            .header(header::ACCEPT, "*/*");

        if let Some(h) = headers {
            rb = rb.headers(h);
        }

        let start = Instant::now();
        let res = rb.send().await;
        let elapsed = start.elapsed().as_millis();

        match res {
            Ok(response) => {
                LOGGER.info(format!("{} {} {} ms", visit_log, response.status(), elapsed));
                Ok(response)
            }
            Err(why) => {
                LOGGER.error(format!("{} failed because {:?}. {} ms", visit_log, why, elapsed));
                Err(why.into())
            }
        }
    }

    /// Performs a GET request and deserializes a successful JSON body.
    ///
    /// Non-success statuses become `FetchError::Status`, undecodable bodies
    /// `FetchError::Payload`.
    pub async fn get_json<RES: DeserializeOwned>(&self, url: &str) -> Result<RES, FetchError> {
        let response = self.get(url, None).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| FetchError::Payload(format!("{} from {}", e, url)))
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde::Deserialize;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::util::testing;

    #[derive(Deserialize, Debug)]
    struct Echo {
        ua: String,
    }

    async fn echo_user_agent(headers: HeaderMap) -> Json<serde_json::Value> {
        let ua = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({ "ua": ua }))
    }

    fn client(agents: Vec<String>) -> HttpClient {
        HttpClient::new(agents, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_empty_user_agents_generates_pool() {
        let http = client(vec![]);
        assert_eq!(http.user_agents().len(), GENERATED_USER_AGENTS);
    }

    #[tokio::test]
    async fn test_get_json_sends_injected_user_agent() {
        let base = testing::spawn_server(Router::new().route("/ua", get(echo_user_agent))).await;
        let http = client(vec!["quote-test-agent/1.0".to_string()]);

        let echo = assert_ok!(http.get_json::<Echo>(&format!("{base}/ua")).await);
        assert_eq!(echo.ua, "quote-test-agent/1.0");
    }

    #[tokio::test]
    async fn test_get_json_maps_status_and_payload_errors() {
        let router = Router::new()
            .route(
                "/down",
                get(|| async { (axum::http::StatusCode::SERVICE_UNAVAILABLE, "busy") }),
            )
            .route("/html", get(|| async { "<html></html>" }));
        let base = testing::spawn_server(router).await;
        let http = client(vec!["ua".to_string()]);

        let down = assert_err!(http.get_json::<Echo>(&format!("{base}/down")).await);
        assert!(matches!(down, FetchError::Status { status: 503, .. }));

        let html = assert_err!(http.get_json::<Echo>(&format!("{base}/html")).await);
        assert!(matches!(html, FetchError::Payload(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let base = testing::unreachable_base_url().await;
        let http = client(vec!["ua".to_string()]);

        let why = assert_err!(http.get_json::<Echo>(&format!("{base}/ua")).await);
        assert!(why.is_transport());
        assert!(matches!(why, FetchError::Transport(_)));
    }
}
