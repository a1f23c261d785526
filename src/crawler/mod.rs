use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time;

use crate::{
    declare::{QuoteRecord, Tier, UpstreamQuote},
    error::FetchError,
    logging,
};

/// TradingView 交易想法 RSS
pub mod tradingview;
/// 雅虎財經
pub mod yahoo;

#[cfg(test)]
pub(crate) mod mock;

/// 一種取得報價的方式 (一個 tier)
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn tier(&self) -> Tier;
    async fn fetch_quote(&self, symbol: &str) -> Result<UpstreamQuote, FetchError>;
}

/// 依優先順序排好的報價來源
pub type Sources = Vec<Arc<dyn QuoteSource>>;

/// 某一層失敗的原因
#[derive(Debug, Clone, PartialEq)]
pub struct TierFailure {
    pub tier: Tier,
    pub error: FetchError,
}

/// 取得股票目前的報價
///
/// Walks `sources` in order and stops at the first tier that yields a
/// non-zero price. Every tier gets its own `timeout`; running out of time
/// counts as that tier failing. When nothing works the failures of every
/// tier are returned for the caller to classify.
pub async fn fetch_quote_from_remote_site(
    sources: &[Arc<dyn QuoteSource>],
    symbol: &str,
    timeout: Duration,
) -> Result<(Tier, QuoteRecord), Vec<TierFailure>> {
    let mut failures = Vec::with_capacity(sources.len());

    for source in sources {
        let tier = source.tier();
        let outcome = match time::timeout(timeout, source.fetch_quote(symbol)).await {
            Ok(Ok(quote)) => {
                QuoteRecord::from_upstream(quote).ok_or_else(|| FetchError::NoPrice(symbol.to_string()))
            }
            Ok(Err(why)) => Err(why),
            Err(_) => Err(FetchError::Timeout(timeout)),
        };

        match outcome {
            Ok(record) => return Ok((tier, record)),
            Err(error) => {
                logging::warn_file_async(format!(
                    "Failed to fetch {} from the {} tier because {}",
                    symbol, tier, error
                ));
                failures.push(TierFailure { tier, error });
            }
        }
    }

    Err(failures)
}
