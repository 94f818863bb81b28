use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};
use url::Url;

use crate::{db, fetch::Fetcher, parser, urls};

pub const DEFAULT_BASE_URL: &str =
    "https://www.intel.com/content/www/us/en/products/details/processors.html";

pub struct CrawlConfig {
    pub base_urls: Vec<String>,
    pub delay: Duration,
    pub max_pages: usize,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_urls: vec![DEFAULT_BASE_URL.to_string()],
            delay: Duration::from_secs(1),
            max_pages: 10,
            timeout: Duration::from_secs(30),
            user_agent: crate::fetch::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CrawlStats {
    pub discovered: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Crawl listing pages, then fetch and store each discovered product page.
///
/// Pages are fetched sequentially with an enforced delay; one bad page is
/// counted and skipped, never fatal. The stop flag is honored between pages
/// so an interrupt loses at most the page in flight.
pub async fn crawl(
    conn: &Connection,
    config: &CrawlConfig,
    stop: Arc<AtomicBool>,
) -> Result<CrawlStats> {
    let fetcher = Fetcher::new(&config.user_agent, config.timeout)?;
    let mut stats = CrawlStats::default();

    for base_url in &config.base_urls {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        info!("Crawling base URL: {}", base_url);

        let spec_urls = match discover(&fetcher, base_url).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!("Failed to process base URL {}: {}", base_url, e);
                continue;
            }
        };
        stats.discovered += spec_urls.len();

        let spec_urls: Vec<String> = if config.max_pages > 0 {
            spec_urls.into_iter().take(config.max_pages).collect()
        } else {
            spec_urls
        };
        info!("Processing {} product URLs", spec_urls.len());

        let pb = ProgressBar::new(spec_urls.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
                .progress_chars("=> "),
        );

        let total = spec_urls.len();
        for (i, url) in spec_urls.into_iter().enumerate() {
            if stop.load(Ordering::SeqCst) {
                info!("Stop requested, finishing crawl early");
                break;
            }

            match db::url_exists(conn, &url) {
                Ok(true) => {
                    stats.duplicates += 1;
                    pb.inc(1);
                    continue;
                }
                Ok(false) => {}
                Err(e) => return Err(e),
            }

            match scrape_one(&fetcher, conn, &url).await {
                Ok(true) => stats.inserted += 1,
                Ok(false) => stats.duplicates += 1,
                Err(e) => {
                    warn!("Error processing {}: {}", url, e);
                    stats.failed += 1;
                }
            }
            pb.inc(1);

            if i + 1 < total {
                tokio::time::sleep(config.delay).await;
            }
        }
        pb.finish_and_clear();
    }

    info!(
        "Crawl complete: {} inserted, {} duplicates, {} failed",
        stats.inserted, stats.duplicates, stats.failed
    );
    Ok(stats)
}

async fn discover(fetcher: &Fetcher, base_url: &str) -> Result<Vec<String>> {
    let base = Url::parse(base_url)?;
    let body = fetcher.fetch(base_url).await?;
    // Parsed documents hold non-Send internals, so parsing stays inside a
    // sync scope between awaits
    let found = {
        let doc = scraper::Html::parse_document(&body);
        urls::extract_spec_urls(&doc, &base)
    };
    Ok(found)
}

async fn scrape_one(fetcher: &Fetcher, conn: &Connection, url: &str) -> Result<bool> {
    let body = fetcher.fetch(url).await?;
    let record = parser::parse_page(&body, url, chrono::Utc::now());
    db::insert(conn, &record)
}
