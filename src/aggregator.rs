use std::time::Duration;

use futures::{stream::FuturesUnordered, StreamExt};
use hashbrown::HashSet;
use tokio::sync::Semaphore;

use crate::{
    config,
    crawler::{self, Sources, TierFailure},
    declare::{CachePolicy, QuoteRecord, QuoteRequest, QuoteResponse},
    error::QuoteError,
    logging,
};

/// 聚合器的參數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorOptions {
    /// 同時查詢的股票數上限
    pub concurrency: usize,
    /// 每一層的逾時
    pub timeout: Duration,
    pub cache_policy: CachePolicy,
}

impl From<&config::Quote> for AggregatorOptions {
    fn from(quote: &config::Quote) -> Self {
        AggregatorOptions {
            concurrency: quote.concurrency,
            timeout: quote.timeout(),
            cache_policy: quote.cache_policy(),
        }
    }
}

/// Resolves every symbol of a request concurrently through the tier chain.
///
/// At most `concurrency` symbols are in flight at once, across all requests
/// sharing this aggregator. Results are collected in completion order.
pub struct Aggregator {
    sources: Sources,
    limiter: Semaphore,
    timeout: Duration,
    cache_policy: CachePolicy,
}

impl Aggregator {
    pub fn new(sources: Sources, options: AggregatorOptions) -> Self {
        Aggregator {
            sources,
            limiter: Semaphore::new(options.concurrency.clamp(1, Semaphore::MAX_PERMITS)),
            timeout: options.timeout,
            cache_policy: options.cache_policy,
        }
    }

    pub async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<QuoteResponse, QuoteError> {
        let mut pending = request
            .symbols()
            .iter()
            .map(|symbol| self.resolve(symbol))
            .collect::<FuturesUnordered<_>>();

        let mut outcomes = Vec::with_capacity(request.len());
        while let Some(outcome) = pending.next().await {
            outcomes.push(outcome);
        }

        self.assemble(request, outcomes)
    }

    async fn resolve(&self, symbol: &str) -> Result<QuoteRecord, Vec<TierFailure>> {
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(why) => {
                logging::error_file_async(format!("Failed to acquire a permit for {} because {}", symbol, why));
                return Err(Vec::new());
            }
        };

        match crawler::fetch_quote_from_remote_site(&self.sources, symbol, self.timeout).await {
            Ok((tier, record)) => {
                logging::debug_file_async(format!("{} resolved by the {} tier", symbol, tier));
                Ok(record)
            }
            Err(failures) => {
                logging::warn_file_async(format!(
                    "No quote for {} after {} tier(s)",
                    symbol,
                    failures.len()
                ));
                Err(failures)
            }
        }
    }

    /// Merges per-symbol outcomes into the response.
    ///
    /// Two inputs resolving to the same upstream symbol keep only the first
    /// record to complete. With no record at all the request is a 404, unless
    /// every attempt failed at the transport level, which makes it a 502.
    fn assemble(
        &self,
        request: &QuoteRequest,
        outcomes: Vec<Result<QuoteRecord, Vec<TierFailure>>>,
    ) -> Result<QuoteResponse, QuoteError> {
        let mut seen = HashSet::with_capacity(outcomes.len());
        let mut results = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(record) => {
                    if seen.insert(record.symbol.to_ascii_uppercase()) {
                        results.push(record);
                    } else {
                        logging::debug_file_async(format!("Dropped duplicate quote for {}", record.symbol));
                    }
                }
                Err(f) => failures.extend(f),
            }
        }

        if !results.is_empty() {
            return Ok(QuoteResponse {
                results,
                cache_policy: self.cache_policy,
            });
        }

        let symbols = request.symbols().join(",");
        if !failures.is_empty() && failures.iter().all(|f| f.error.is_transport()) {
            let detail = failures
                .last()
                .map(|f| f.error.to_string())
                .unwrap_or_default();
            logging::error_file_async(format!("Upstream unreachable for {} because {}", symbols, detail));
            return Err(QuoteError::Upstream(detail));
        }

        Err(QuoteError::NotFound(symbols))
    }
}
