use anyhow::Result;

use crate::{
    aggregator::{Aggregator, AggregatorOptions},
    crawler::yahoo::Yahoo,
    server::AppState,
    util::http::HttpClient,
};

pub mod aggregator;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod error;
pub mod logging;
pub mod server;
pub mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let settings = &*config::SETTINGS;
    let http = HttpClient::new(settings.quote.user_agents.clone(), settings.quote.timeout())?;
    let yahoo = Yahoo::new(
        http.clone(),
        settings.quote.base_urls(),
        settings.quote.timeout(),
    );
    let aggregator = Aggregator::new(yahoo.sources(), AggregatorOptions::from(&settings.quote));

    logging::info_file_async(format!(
        "Quoting from {:?} with {} symbol(s) in flight and {} user agent(s)",
        settings.quote.base_urls(),
        settings.quote.concurrency,
        http.user_agents().len()
    ));

    let state = AppState::new(aggregator, http, &settings.tradingview.feed_url);

    if let Err(why) = server::start(state, &settings.server.host, settings.server.port).await {
        logging::error_console(format!("HTTP server exited because {:?}", why));
        return Err(why);
    }

    Ok(())
}
