use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::{error::QuoteError, util::text};

/// 報價來源的層級，宣告順序即為嘗試順序
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    /// 完整的報價資料 (名稱、市值、交易所、漲跌)
    Detailed,
    /// 只有價格欄位的快速查詢
    Fast,
    /// 最近五個交易日的日K
    History,
}

/// Cache-Control 策略，套用在所有成功的回應上
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CachePolicy {
    MaxAge(u32),
    NoCache,
}

impl CachePolicy {
    pub fn header_value(&self) -> String {
        match self {
            CachePolicy::MaxAge(secs) => format!("public, max-age={secs}, s-maxage={secs}"),
            CachePolicy::NoCache => "no-cache, no-store, must-revalidate".to_string(),
        }
    }
}

/// 一次請求要查詢的股票代號，已去除重複並保留原始順序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    symbols: Vec<String>,
}

impl QuoteRequest {
    /// Parses a comma and/or whitespace separated symbol list.
    ///
    /// Duplicates are dropped case-insensitively, keeping the first spelling.
    /// An input without any symbol is rejected before anything goes upstream.
    pub fn parse(input: &str) -> Result<Self, QuoteError> {
        let symbols = text::split_symbols(input);
        if symbols.is_empty() {
            return Err(QuoteError::InvalidInput);
        }

        Ok(QuoteRequest { symbols })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// 上游某一層回傳的原始報價，欄位都可能缺
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamQuote {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
}

impl UpstreamQuote {
    /// 有可用的價格 (非零且為有限值)
    pub fn has_price(&self) -> bool {
        usable_price(self.current_price).is_some()
    }
}

/// 回傳給前端的報價
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub symbol: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub change: f64,
    pub change_percent: f64,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
}

impl QuoteRecord {
    /// Normalizes an upstream quote, or `None` when it carries no usable price.
    ///
    /// Explicit upstream `change` / `change_percent` win over derived values.
    /// A missing previous close falls back to the current price, but the
    /// derived percentage stays 0 in that case.
    pub fn from_upstream(quote: UpstreamQuote) -> Option<Self> {
        let current_price = usable_price(quote.current_price)?;
        let reported_close = quote.previous_close.filter(|p| p.is_finite());
        let previous_close = reported_close.unwrap_or(current_price);
        let change = quote
            .change
            .filter(|c| c.is_finite())
            .unwrap_or(current_price - previous_close);
        let change_percent = quote
            .change_percent
            .filter(|p| p.is_finite())
            .unwrap_or_else(|| percent_of(change, reported_close.unwrap_or(0.0)));

        Some(QuoteRecord {
            symbol: quote.symbol,
            current_price,
            previous_close,
            open: quote.open,
            day_high: quote.day_high,
            day_low: quote.day_low,
            change,
            change_percent,
            volume: quote.volume,
            market_cap: quote.market_cap,
            short_name: quote.short_name,
            long_name: quote.long_name,
            currency: quote.currency,
            exchange: quote.exchange,
        })
    }
}

/// 漲幅 = 漲跌 / 前一交易日收盤價 * 100，分母為零時回傳 0
fn percent_of(change: f64, previous_close: f64) -> f64 {
    if previous_close == 0.0 {
        return 0.0;
    }

    let pct = change / previous_close * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

fn usable_price(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p != 0.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub results: Vec<QuoteRecord>,
    #[serde(skip)]
    pub cache_policy: CachePolicy,
}
