use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::{
    declare::{QuoteRequest, QuoteResponse},
    error::QuoteError,
    logging,
    server::AppState,
};

/// `symbol` 與 `symbols` 擇一，兩者都有時以 `symbol` 為主
#[derive(Deserialize, Debug, Default)]
pub struct StockQuery {
    pub symbol: Option<String>,
    pub symbols: Option<String>,
}

impl StockQuery {
    /// 第一個非空白的參數
    fn raw_symbols(&self) -> &str {
        [&self.symbol, &self.symbols]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or_default()
    }
}

/// GET /api/stock?symbol=AAPL 或 /api/stock?symbols=AAPL,MSFT
pub async fn get_stock(State(state): State<AppState>, Query(query): Query<StockQuery>) -> Response {
    match fetch(&state, &query).await {
        Ok(response) => (
            [(header::CACHE_CONTROL, response.cache_policy.header_value())],
            Json(response),
        )
            .into_response(),
        Err(why) => {
            logging::warn_file_async(format!(
                "GET /api/stock {:?} failed because {}",
                query.raw_symbols(),
                why
            ));
            why.into_response()
        }
    }
}

async fn fetch(state: &AppState, query: &StockQuery) -> Result<QuoteResponse, QuoteError> {
    let request = QuoteRequest::parse(query.raw_symbols())?;
    state.aggregator.fetch_quotes(&request).await
}
