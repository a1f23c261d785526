//! # Yahoo 財經報價模組
//!
//! 三種取得報價的方式，依序為：
//!
//! - **完整報價 (`quote`)**：`/v7/finance/quote`，有名稱、市值、交易所與漲跌。
//! - **快速報價 (`chart`)**：`/v8/finance/chart` 的 meta 區塊，只有價格。
//! - **歷史日K (`history`)**：`/v8/finance/chart` 最近五個交易日，用收盤價推算。
//!
//! ## 站點資訊
//!
//! - 主要主機：`query1.finance.yahoo.com`，失敗時改用 `query2.finance.yahoo.com`
//! - 抓取技術：HTTP GET 取得 JSON

use std::{sync::Arc, time::Duration};

use concat_string::concat_string;
use serde::de::DeserializeOwned;
use strum::IntoEnumIterator;
use tokio::time;

use crate::{
    crawler::{QuoteSource, Sources},
    declare::Tier,
    error::FetchError,
    logging,
    util::http::HttpClient,
};

/// v8 chart 的 meta 區塊
pub mod chart;
/// v8 chart 的日K
pub mod history;
/// v7 quote
pub mod quote;

/// Yahoo 財經採集器
///
/// Holds the shared HTTP client and the ordered list of hosts. Every tier
/// wraps a clone of it.
#[derive(Clone)]
pub struct Yahoo {
    http: HttpClient,
    base_urls: Arc<[String]>,
    /// 每台主機分到的時間，加總不超過一個 tier 的逾時
    host_timeout: Duration,
}

impl Yahoo {
    /// `base_urls` 依序為主要、備援主機 (不含結尾的 `/`)
    ///
    /// `tier_timeout` is split evenly between the hosts so a stalled primary
    /// still leaves time for the secondary.
    pub fn new(http: HttpClient, base_urls: Vec<String>, tier_timeout: Duration) -> Self {
        let hosts = u32::try_from(base_urls.len()).unwrap_or(u32::MAX).max(1);

        Yahoo {
            http,
            base_urls: base_urls.into(),
            host_timeout: tier_timeout / hosts,
        }
    }

    /// 依 `Tier` 的宣告順序建立所有報價來源
    pub fn sources(&self) -> Sources {
        Tier::iter().map(|tier| self.source(tier)).collect()
    }

    pub fn source(&self, tier: Tier) -> Arc<dyn QuoteSource> {
        match tier {
            Tier::Detailed => Arc::new(quote::DetailedQuote(self.clone())),
            Tier::Fast => Arc::new(chart::FastPrice(self.clone())),
            Tier::History => Arc::new(history::DailyHistory(self.clone())),
        }
    }

    /// GETs `path_and_query` from the primary host, moving on to the next
    /// host when the request cannot connect, stalls past its share of the
    /// tier timeout or comes back with a non-success status. Payload errors
    /// are returned at once.
    async fn get_json<RES: DeserializeOwned>(&self, path_and_query: &str) -> Result<RES, FetchError> {
        let mut last_error = FetchError::Transport("no Yahoo host configured".to_string());

        for base_url in self.base_urls.iter() {
            let url = concat_string!(base_url, path_and_query);
            let outcome = time::timeout(self.host_timeout, self.http.get_json::<RES>(&url))
                .await
                .unwrap_or(Err(FetchError::Timeout(self.host_timeout)));
            match outcome {
                Ok(res) => return Ok(res),
                Err(why) if why.should_try_next_host() => {
                    logging::warn_file_async(format!("Failed to get {} because {}", url, why));
                    last_error = why;
                }
                Err(why) => return Err(why),
            }
        }

        Err(last_error)
    }
}

/// 代號放進 URL 前先編碼，`^NSEI` 之類的指數代號才不會出錯
fn encode_symbol(symbol: &str) -> String {
    urlencoding::encode(symbol).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::util::testing;

    pub(crate) fn yahoo(base_urls: Vec<String>) -> Yahoo {
        let http = HttpClient::new(vec!["quote-test".to_string()], Duration::from_secs(2)).unwrap();
        Yahoo::new(http, base_urls, Duration::from_secs(2))
    }

    #[test]
    fn test_encode_symbol() {
        assert_eq!(encode_symbol("^NSEI"), "%5ENSEI");
        assert_eq!(encode_symbol("RELIANCE.NS"), "RELIANCE.NS");
        assert_eq!(encode_symbol("BRK B"), "BRK%20B");
    }

    #[test]
    fn test_sources_follow_tier_order() {
        let tiers: Vec<Tier> = yahoo(vec![]).sources().iter().map(|s| s.tier()).collect();
        assert_eq!(tiers, vec![Tier::Detailed, Tier::Fast, Tier::History]);
    }

    #[tokio::test]
    async fn test_falls_back_to_secondary_on_bad_status() {
        let primary = testing::spawn_server(
            Router::new().route("/ping", get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") })),
        )
        .await;
        let secondary = testing::spawn_server(
            Router::new().route("/ping", get(|| async { Json(json!({ "host": "secondary" })) })),
        )
        .await;

        let body: Value = yahoo(vec![primary, secondary]).get_json("/ping").await.unwrap();
        assert_eq!(body["host"], "secondary");
    }

    #[tokio::test]
    async fn test_falls_back_to_secondary_when_primary_unreachable() {
        let primary = testing::unreachable_base_url().await;
        let secondary = testing::spawn_server(
            Router::new().route("/ping", get(|| async { Json(json!({ "host": "secondary" })) })),
        )
        .await;

        let body: Value = yahoo(vec![primary, secondary]).get_json("/ping").await.unwrap();
        assert_eq!(body["host"], "secondary");
    }

    #[tokio::test]
    async fn test_stalled_primary_leaves_time_for_secondary() {
        let primary = testing::spawn_server(Router::new().route(
            "/v7/finance/quote",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({ "quoteResponse": { "result": [] } }))
            }),
        ))
        .await;
        let secondary = testing::spawn_server(Router::new().route(
            "/v7/finance/quote",
            get(|| async {
                Json(json!({
                    "quoteResponse": { "result": [{ "symbol": "AAPL", "regularMarketPrice": 150.0 }] }
                }))
            }),
        ))
        .await;

        let sources = vec![yahoo(vec![primary, secondary]).source(Tier::Detailed)];
        let (tier, record) =
            crate::crawler::fetch_quote_from_remote_site(&sources, "AAPL", Duration::from_secs(2))
                .await
                .unwrap();
        assert_eq!(tier, Tier::Detailed);
        assert_eq!(record.current_price, 150.0);
    }

    #[test]
    fn test_tier_timeout_is_split_between_hosts() {
        let http = HttpClient::new(vec!["quote-test".to_string()], Duration::from_secs(2)).unwrap();
        let two = Yahoo::new(http.clone(), vec!["a".into(), "b".into()], Duration::from_secs(8));
        assert_eq!(two.host_timeout, Duration::from_secs(4));
        let none = Yahoo::new(http, vec![], Duration::from_secs(8));
        assert_eq!(none.host_timeout, Duration::from_secs(8));
    }

    #[tokio::test]
    async fn test_malformed_payload_does_not_retry() {
        let primary = testing::spawn_server(
            Router::new().route("/ping", get(|| async { "<html>consent</html>" })),
        )
        .await;
        let secondary = testing::spawn_server(
            Router::new().route("/ping", get(|| async { Json(json!({ "host": "secondary" })) })),
        )
        .await;

        let why = yahoo(vec![primary, secondary])
            .get_json::<Value>("/ping")
            .await
            .unwrap_err();
        assert!(matches!(why, FetchError::Payload(_)));
    }

    #[tokio::test]
    async fn test_both_hosts_failing_returns_last_error() {
        let primary = testing::unreachable_base_url().await;
        let secondary = testing::spawn_server(
            Router::new().route("/ping", get(|| async { (StatusCode::BAD_GATEWAY, "down") })),
        )
        .await;

        let why = yahoo(vec![primary, secondary])
            .get_json::<Value>("/ping")
            .await
            .unwrap_err();
        assert!(matches!(why, FetchError::Status { status: 502, .. }));
        assert!(why.is_transport());
    }
}
