use async_trait::async_trait;
use concat_string::concat_string;
use serde::Deserialize;

use crate::{
    crawler::{
        yahoo::{encode_symbol, Yahoo},
        QuoteSource,
    },
    declare::{Tier, UpstreamQuote},
    error::FetchError,
};

#[derive(Deserialize, Debug)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResult,
}

#[derive(Deserialize, Debug)]
struct QuoteResult {
    #[serde(default)]
    result: Option<Vec<QuoteItem>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct QuoteItem {
    symbol: String,
    regular_market_price: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    /// 偶爾會是浮點數
    regular_market_volume: Option<f64>,
    market_cap: Option<f64>,
    short_name: Option<String>,
    long_name: Option<String>,
    currency: Option<String>,
    exchange: Option<String>,
}

impl From<QuoteItem> for UpstreamQuote {
    fn from(item: QuoteItem) -> Self {
        UpstreamQuote {
            symbol: item.symbol,
            current_price: item.regular_market_price,
            previous_close: item.regular_market_previous_close,
            open: item.regular_market_open,
            day_high: item.regular_market_day_high,
            day_low: item.regular_market_day_low,
            change: item.regular_market_change,
            change_percent: item.regular_market_change_percent,
            volume: item
                .regular_market_volume
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64),
            market_cap: item.market_cap,
            short_name: item.short_name,
            long_name: item.long_name,
            currency: item.currency,
            exchange: item.exchange,
        }
    }
}

/// 完整報價
pub struct DetailedQuote(pub(super) Yahoo);

#[async_trait]
impl QuoteSource for DetailedQuote {
    fn tier(&self) -> Tier {
        Tier::Detailed
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<UpstreamQuote, FetchError> {
        let path = concat_string!("/v7/finance/quote?symbols=", encode_symbol(symbol));
        let envelope: QuoteEnvelope = self.0.get_json(&path).await?;
        let mut items = envelope.quote_response.result.unwrap_or_default();

        // 正常只會有一筆；多筆時挑代號相符的那筆
        let index = items
            .iter()
            .position(|item| item.symbol.eq_ignore_ascii_case(symbol))
            .unwrap_or(0);
        if index >= items.len() {
            return Err(FetchError::NoPrice(symbol.to_string()));
        }

        let mut item = items.swap_remove(index);
        if item.symbol.is_empty() {
            item.symbol = symbol.to_string();
        }

        Ok(item.into())
    }
}
