use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{crawler::tradingview, logging, server::AppState};

/// GET /api/tradingview-feed
pub async fn get_tradingview_feed(State(state): State<AppState>) -> Response {
    match tradingview::fetch_ideas_feed(&state.http, &state.tradingview_feed_url).await {
        Ok(feed) => ([(header::CONTENT_TYPE, "application/xml")], feed.into_body()).into_response(),
        Err(why) => {
            logging::error_file_async(format!("Failed to fetch the TradingView feed because {}", why));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch TradingView feed",
                    "message": why.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{routing::get, Router};
    use serde_json::Value;

    use super::*;
    use crate::{server::tests::state, util::testing};

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_rss_is_served_as_xml() {
        let base = testing::spawn_server(Router::new().route(
            "/ideas/feed/",
            get(|| async { "<rss version=\"2.0\"><channel></channel></rss>" }),
        ))
        .await;

        let response =
            get_tradingview_feed(State(state(vec![], &format!("{base}/ideas/feed/")))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/xml");
        assert_eq!(text(response).await, "<rss version=\"2.0\"><channel></channel></rss>");
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_server_error() {
        let base = testing::unreachable_base_url().await;

        let response =
            get_tradingview_feed(State(state(vec![], &format!("{base}/ideas/feed/")))).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(body["error"], "Failed to fetch TradingView feed");
        assert!(body["message"].as_str().unwrap().contains("Transport"));
    }
}
