use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::models::{KeywordExtraction, SearchOutcome, WebResult};

const CLASSIFY_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const CLASSIFY_CAPACITY: usize = 200;
const GITHUB_TTL: Duration = Duration::from_secs(60 * 60);
const GITHUB_CAPACITY: usize = 100;
const WEB_TTL: Duration = Duration::from_secs(30 * 60);
const WEB_CAPACITY: usize = 100;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub http_client: reqwest::Client,
    pub classify_cache: Arc<TtlCache<KeywordExtraction>>,
    pub github_cache: Arc<TtlCache<SearchOutcome>>,
    pub web_cache: Arc<TtlCache<Vec<WebResult>>>,
    pub analyze_semaphore: Arc<tokio::sync::Semaphore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let max_concurrent = config.max_concurrent_analyses;

        Ok(Self {
            config,
            http_client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()?,
            classify_cache: Arc::new(TtlCache::new(CLASSIFY_TTL, CLASSIFY_CAPACITY)),
            github_cache: Arc::new(TtlCache::new(GITHUB_TTL, GITHUB_CAPACITY)),
            web_cache: Arc::new(TtlCache::new(WEB_TTL, WEB_CAPACITY)),
            analyze_semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent)),
        })
    }
}
