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
pub(super) struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize, Debug)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(super) struct ChartResult {
    pub(super) meta: ChartMeta,
    #[serde(default)]
    pub(super) indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct ChartMeta {
    pub(super) symbol: String,
    pub(super) currency: Option<String>,
    pub(super) exchange_name: Option<String>,
    pub(super) regular_market_price: Option<f64>,
    pub(super) previous_close: Option<f64>,
    pub(super) chart_previous_close: Option<f64>,
    pub(super) regular_market_day_high: Option<f64>,
    pub(super) regular_market_day_low: Option<f64>,
    pub(super) regular_market_volume: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub(super) struct Indicators {
    quote: Vec<Bars>,
}

/// 日K，每個欄位是一條序列，停牌的日子是 null
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub(super) struct Bars {
    pub(super) open: Vec<Option<f64>>,
    pub(super) high: Vec<Option<f64>>,
    pub(super) low: Vec<Option<f64>>,
    pub(super) close: Vec<Option<f64>>,
    pub(super) volume: Vec<Option<f64>>,
}

impl ChartEnvelope {
    /// 取出第一筆結果；Yahoo 找不到代號時 result 為 null 並附上 error
    pub(super) fn into_result(self, symbol: &str) -> Result<ChartResult, FetchError> {
        if let Some(why) = self.chart.error {
            return Err(FetchError::NoPrice(format!(
                "{} ({}: {})",
                symbol,
                why.code.unwrap_or_default(),
                why.description.unwrap_or_default()
            )));
        }

        self.chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FetchError::NoPrice(symbol.to_string()))
    }
}

impl ChartResult {
    pub(super) fn bars(&mut self) -> Bars {
        self.indicators
            .take()
            .and_then(|indicators| indicators.quote.into_iter().next())
            .unwrap_or_default()
    }
}

/// 序列中第 `index` 個有限值
pub(super) fn value_at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten().filter(|v| v.is_finite())
}

pub(super) fn to_volume(value: Option<f64>) -> Option<u64> {
    value.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64)
}

/// 讀取 chart API，空的 symbol 以查詢的代號補上
pub(super) async fn fetch_chart(
    yahoo: &Yahoo,
    symbol: &str,
    range: &str,
) -> Result<ChartResult, FetchError> {
    let path = concat_string!(
        "/v8/finance/chart/",
        encode_symbol(symbol),
        "?range=",
        range,
        "&interval=1d"
    );
    let envelope: ChartEnvelope = yahoo.get_json(&path).await?;
    let mut result = envelope.into_result(symbol)?;
    if result.meta.symbol.is_empty() {
        result.meta.symbol = symbol.to_string();
    }

    Ok(result)
}

/// 快速報價
pub struct FastPrice(pub(super) Yahoo);

#[async_trait]
impl QuoteSource for FastPrice {
    fn tier(&self) -> Tier {
        Tier::Fast
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<UpstreamQuote, FetchError> {
        let mut result = fetch_chart(&self.0, symbol, "1d").await?;
        let bars = result.bars();
        let meta = result.meta;

        Ok(UpstreamQuote {
            symbol: meta.symbol,
            current_price: meta.regular_market_price,
            previous_close: meta.previous_close.or(meta.chart_previous_close),
            open: bars.open.iter().rev().find_map(|v| v.filter(|o| o.is_finite())),
            day_high: meta.regular_market_day_high,
            day_low: meta.regular_market_day_low,
            volume: to_volume(meta.regular_market_volume),
            currency: meta.currency,
            exchange: meta.exchange_name,
            ..Default::default()
        })
    }
}
