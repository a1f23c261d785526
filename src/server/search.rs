use axum::{extract::Query, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::logging;

#[derive(Deserialize, Debug, Default)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// GET /api/search，目前只回傳固定訊息
pub async fn search_stocks(Query(query): Query<SearchQuery>) -> Json<Value> {
    logging::debug_file_async(format!("GET /api/search q={:?}", query.q));

    Json(json!({ "message": "Search functionality not implemented" }))
}
