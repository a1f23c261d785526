use std::{env, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{declare::CachePolicy, logging};

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct App {
    pub server: Server,
    pub quote: Quote,
    pub tradingview: TradingView,
}

const SERVER_HOST: &str = "SERVER_HOST";
const SERVER_PORT: &str = "SERVER_PORT";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

const QUOTE_CONCURRENCY: &str = "QUOTE_CONCURRENCY";
const QUOTE_TIMEOUT_SECS: &str = "QUOTE_TIMEOUT_SECS";
const QUOTE_CACHE_MAX_AGE_SECS: &str = "QUOTE_CACHE_MAX_AGE_SECS";
const QUOTE_PRIMARY_BASE_URL: &str = "QUOTE_PRIMARY_BASE_URL";
const QUOTE_SECONDARY_BASE_URL: &str = "QUOTE_SECONDARY_BASE_URL";
const QUOTE_USER_AGENTS: &str = "QUOTE_USER_AGENTS";

/// 報價抓取相關設定
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Quote {
    /// 同時向上游抓取的股票數量上限
    pub concurrency: usize,
    /// 每一層 (tier) 抓取的逾時秒數
    pub timeout_secs: u64,
    /// 0 表示 no-cache
    pub cache_max_age_secs: u32,
    pub primary_base_url: String,
    pub secondary_base_url: String,
    /// 空的話由 user_agent 模組產生
    pub user_agents: Vec<String>,
}

impl Default for Quote {
    fn default() -> Self {
        Quote {
            concurrency: 16,
            timeout_secs: 8,
            cache_max_age_secs: 10,
            primary_base_url: "https://query1.finance.yahoo.com".to_string(),
            secondary_base_url: "https://query2.finance.yahoo.com".to_string(),
            user_agents: Vec::new(),
        }
    }
}

impl Quote {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn cache_policy(&self) -> CachePolicy {
        match self.cache_max_age_secs {
            0 => CachePolicy::NoCache,
            secs => CachePolicy::MaxAge(secs),
        }
    }

    /// 主機依序嘗試：主要 → 備援
    pub fn base_urls(&self) -> Vec<String> {
        [&self.primary_base_url, &self.secondary_base_url]
            .into_iter()
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .collect()
    }
}

const TRADINGVIEW_FEED_URL: &str = "TRADINGVIEW_FEED_URL";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct TradingView {
    pub feed_url: String,
}

impl Default for TradingView {
    fn default() -> Self {
        TradingView {
            feed_url: "https://in.tradingview.com/ideas/feed/".to_string(),
        }
    }
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| {
    App::get().unwrap_or_else(|why| {
        logging::error_file_async(format!(
            "I can't read the config context because {:?}",
            why
        ));
        App::default().override_with_env()
    })
});

impl App {
    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(host) = env::var(SERVER_HOST) {
            self.server.host = host;
        }

        if let Ok(port) = env::var(SERVER_PORT) {
            self.server.port = u16::from_str(&port).unwrap_or(self.server.port);
        }

        if let Ok(concurrency) = env::var(QUOTE_CONCURRENCY) {
            self.quote.concurrency =
                usize::from_str(&concurrency).unwrap_or(self.quote.concurrency);
        }

        if let Ok(secs) = env::var(QUOTE_TIMEOUT_SECS) {
            self.quote.timeout_secs = u64::from_str(&secs).unwrap_or(self.quote.timeout_secs);
        }

        if let Ok(secs) = env::var(QUOTE_CACHE_MAX_AGE_SECS) {
            self.quote.cache_max_age_secs =
                u32::from_str(&secs).unwrap_or(self.quote.cache_max_age_secs);
        }

        if let Ok(url) = env::var(QUOTE_PRIMARY_BASE_URL) {
            self.quote.primary_base_url = url;
        }

        if let Ok(url) = env::var(QUOTE_SECONDARY_BASE_URL) {
            self.quote.secondary_base_url = url;
        }

        if let Ok(agents) = env::var(QUOTE_USER_AGENTS) {
            self.quote.user_agents = agents
                .split('|')
                .map(str::trim)
                .filter(|ua| !ua.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Ok(url) = env::var(TRADINGVIEW_FEED_URL) {
            self.tradingview.feed_url = url;
        }

        self
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let app = App::default();
        assert_eq!(app.server.port, 3001);
        assert_eq!(app.quote.concurrency, 16);
        assert_eq!(app.quote.timeout(), Duration::from_secs(8));
        assert_eq!(app.quote.cache_policy(), CachePolicy::MaxAge(10));
        assert_eq!(
            app.quote.base_urls(),
            vec![
                "https://query1.finance.yahoo.com".to_string(),
                "https://query2.finance.yahoo.com".to_string()
            ]
        );
    }

    #[test]
    fn test_zero_max_age_means_no_cache() {
        let quote = Quote {
            cache_max_age_secs: 0,
            ..Default::default()
        };
        assert_eq!(quote.cache_policy(), CachePolicy::NoCache);
    }

    #[test]
    fn test_base_urls_skip_blank_and_trim_slash() {
        let quote = Quote {
            primary_base_url: "http://127.0.0.1:9000/".to_string(),
            secondary_base_url: "".to_string(),
            ..Default::default()
        };
        assert_eq!(quote.base_urls(), vec!["http://127.0.0.1:9000".to_string()]);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let app: App = serde_json::from_str(r#"{"quote":{"concurrency":4}}"#).unwrap();
        assert_eq!(app.quote.concurrency, 4);
        assert_eq!(app.quote.timeout_secs, 8);
        assert_eq!(app.server.host, "0.0.0.0");
    }
}
