//! In-memory quote source for exercising the tier chain and the aggregator.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use hashbrown::HashMap;

use crate::{
    crawler::QuoteSource,
    declare::{Tier, UpstreamQuote},
    error::FetchError,
};

pub(crate) struct MockSource {
    tier: Tier,
    latency: Duration,
    quotes: HashMap<String, Result<UpstreamQuote, FetchError>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// 沒有設定的代號一律回傳 `NoPrice`
    pub(crate) fn new(tier: Tier) -> Self {
        MockSource {
            tier,
            latency: Duration::ZERO,
            quotes: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn price(self, symbol: &str, current: f64, previous: f64) -> Self {
        self.quote(UpstreamQuote {
            symbol: symbol.to_string(),
            current_price: Some(current),
            previous_close: Some(previous),
            ..Default::default()
        })
    }

    /// 以 `quote.symbol` 當作查詢的代號
    pub(crate) fn quote(self, quote: UpstreamQuote) -> Self {
        let symbol = quote.symbol.clone();
        self.answer(&symbol, quote)
    }

    /// 查詢 `symbol` 時回傳 `quote`，兩者的代號可以不同
    pub(crate) fn answer(mut self, symbol: &str, quote: UpstreamQuote) -> Self {
        self.quotes.insert(symbol.to_string(), Ok(quote));
        self
    }

    pub(crate) fn fail(mut self, symbol: &str, error: FetchError) -> Self {
        self.quotes.insert(symbol.to_string(), Err(error));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteSource for MockSource {
    fn tier(&self) -> Tier {
        self.tier
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<UpstreamQuote, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.quotes
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::NoPrice(symbol.to_string())))
    }
}
