use async_trait::async_trait;

use crate::{
    crawler::{
        yahoo::{
            chart::{self, Bars, ChartMeta},
            Yahoo,
        },
        QuoteSource,
    },
    declare::{Tier, UpstreamQuote},
    error::FetchError,
};

/// 一根有收盤價的日K
#[derive(Debug, Clone, Copy, PartialEq)]
struct DailyBar {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: f64,
    volume: Option<f64>,
}

/// 略過沒有收盤價的日子 (停牌或資料缺漏)
fn daily_bars(bars: &Bars) -> Vec<DailyBar> {
    (0..bars.close.len())
        .filter_map(|i| {
            let close = chart::value_at(&bars.close, i).filter(|c| *c != 0.0)?;
            Some(DailyBar {
                open: chart::value_at(&bars.open, i),
                high: chart::value_at(&bars.high, i),
                low: chart::value_at(&bars.low, i),
                close,
                volume: chart::value_at(&bars.volume, i),
            })
        })
        .collect()
}

/// Builds a quote from the most recent bars.
///
/// The last close is the current price and the close before it the previous
/// close. With a single bar the previous close is that bar's open.
fn quote_from_bars(meta: ChartMeta, bars: &Bars) -> Result<UpstreamQuote, FetchError> {
    let days = daily_bars(bars);
    let last = days
        .last()
        .ok_or_else(|| FetchError::NoPrice(meta.symbol.clone()))?;
    let previous_close = match days.len() {
        0 | 1 => last.open,
        n => Some(days[n - 2].close),
    };

    Ok(UpstreamQuote {
        symbol: meta.symbol,
        current_price: Some(last.close),
        previous_close,
        open: last.open,
        day_high: last.high,
        day_low: last.low,
        volume: chart::to_volume(last.volume),
        currency: meta.currency,
        exchange: meta.exchange_name,
        ..Default::default()
    })
}

/// 最近五個交易日的日K
pub struct DailyHistory(pub(super) Yahoo);

#[async_trait]
impl QuoteSource for DailyHistory {
    fn tier(&self) -> Tier {
        Tier::History
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<UpstreamQuote, FetchError> {
        let mut result = chart::fetch_chart(&self.0, symbol, "5d").await?;
        let bars = result.bars();

        quote_from_bars(result.meta, &bars)
    }
}
