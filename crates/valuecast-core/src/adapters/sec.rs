//! SEC EDGAR company-facts retrieval.
//!
//! [`SecFactsClient`] owns its cache, rate limiter and retry policy; nothing
//! is process-global, so independent clients (and tests) never interfere.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::cache::{CacheMode, FactsCache};
use crate::domain::{CompanyProfile, Symbol};
use crate::facts::CompanyFacts;
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::throttling::MinIntervalLimiter;
use crate::SourceError;

pub const TICKER_CIK_URL: &str = "https://www.sec.gov/files/company_tickers.json";
pub const COMPANY_FACTS_URL: &str = "https://data.sec.gov/api/xbrl/companyfacts";
pub const DEFAULT_USER_AGENT: &str =
    "valuecast (educational; contact: support@example.com)";
pub const DEFAULT_CACHE_DIR: &str = ".cache";

const TICKER_CACHE_ENTRY: &str = "ticker_cik.json";
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct FactsClientConfig {
    pub user_agent: String,
    pub cache_dir: PathBuf,
    pub cache_mode: CacheMode,
    /// Serve from cache only; a miss fails instead of fetching.
    pub offline: bool,
    pub min_interval: Duration,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for FactsClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            cache_mode: CacheMode::Use,
            offline: false,
            min_interval: Duration::from_millis(200),
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

impl FactsClientConfig {
    /// Applies `VALUECAST_SEC_USER_AGENT` and `VALUECAST_CACHE_DIR` when set.
    pub fn with_env(mut self) -> Self {
        if let Some(agent) = non_empty_var("VALUECAST_SEC_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Some(dir) = non_empty_var("VALUECAST_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CikField {
    Number(u64),
    Text(String),
}

impl CikField {
    fn padded(&self) -> String {
        match self {
            Self::Number(cik) => format!("{cik:010}"),
            Self::Text(cik) => format!("{:0>10}", cik.trim()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerEntry {
    cik_str: CikField,
    ticker: String,
    title: String,
}

/// Ticker → registrant lookup built from the SEC mapping file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerIndex {
    profiles: Vec<CompanyProfile>,
    by_ticker: HashMap<String, usize>,
}

impl TickerIndex {
    /// Parses the mapping document (`{"0": {cik_str, ticker, title}, ...}`).
    ///
    /// Entries keep document order; the first occurrence of a ticker wins.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, TickerEntry> = serde_json::from_str(body)?;
        let mut entries: Vec<(String, TickerEntry)> = raw.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| {
            match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        });
        Ok(Self::from_profiles(entries.into_iter().map(|(_, entry)| CompanyProfile {
            cik: entry.cik_str.padded(),
            ticker: entry.ticker.to_uppercase(),
            title: entry.title,
        })))
    }

    pub fn from_profiles<I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = CompanyProfile>,
    {
        let mut index = Self::default();
        for profile in profiles {
            if index.by_ticker.contains_key(&profile.ticker) {
                continue;
            }
            index
                .by_ticker
                .insert(profile.ticker.clone(), index.profiles.len());
            index.profiles.push(profile);
        }
        index
    }

    pub fn get(&self, ticker: &str) -> Option<&CompanyProfile> {
        self.by_ticker
            .get(&ticker.to_uppercase())
            .map(|position| &self.profiles[*position])
    }

    /// Profiles whose ticker contains `query` (case-insensitive), in index order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<CompanyProfile> {
        let query = query.trim().to_uppercase();
        self.profiles
            .iter()
            .filter(|profile| profile.ticker.contains(&query))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Value plus whether it was served from the local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub cache_hit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyFactsFetch {
    pub profile: CompanyProfile,
    pub facts: CompanyFacts,
    pub cache_hit: bool,
}

#[derive(Clone)]
pub struct SecFactsClient {
    config: FactsClientConfig,
    http_client: Arc<dyn HttpClient>,
    limiter: MinIntervalLimiter,
    cache: FactsCache,
}

impl SecFactsClient {
    pub fn new(config: FactsClientConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let limiter = MinIntervalLimiter::new(config.min_interval);
        let cache = FactsCache::new(config.cache_dir.clone(), config.cache_mode);
        Self {
            config,
            http_client,
            limiter,
            cache,
        }
    }

    /// Client backed by the reqwest transport.
    pub fn with_reqwest(config: FactsClientConfig) -> Self {
        Self::new(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn config(&self) -> &FactsClientConfig {
        &self.config
    }

    pub async fn ticker_index(&self) -> Result<Fetched<TickerIndex>, SourceError> {
        let body = self.cached_get(TICKER_CACHE_ENTRY, TICKER_CIK_URL).await?;
        let index = TickerIndex::from_json(&body.value).map_err(|error| {
            SourceError::internal(format!("malformed ticker mapping: {error}"))
        })?;
        Ok(Fetched {
            value: index,
            cache_hit: body.cache_hit,
        })
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Fetched<Vec<CompanyProfile>>, SourceError> {
        let index = self.ticker_index().await?;
        Ok(Fetched {
            value: index.value.search(query, limit),
            cache_hit: index.cache_hit,
        })
    }

    /// Company facts for a zero-padded CIK.
    pub async fn company_facts(&self, cik: &str) -> Result<Fetched<CompanyFacts>, SourceError> {
        let entry = format!("companyfacts_{cik}.json");
        let url = format!("{COMPANY_FACTS_URL}/CIK{cik}.json");
        let body = self.cached_get(&entry, &url).await?;
        let facts = serde_json::from_str(&body.value).map_err(|error| {
            SourceError::internal(format!("malformed company facts for CIK {cik}: {error}"))
        })?;
        Ok(Fetched {
            value: facts,
            cache_hit: body.cache_hit,
        })
    }

    /// Resolves `ticker` and fetches its facts; unknown tickers are `NotFound`.
    pub async fn facts_by_ticker(&self, ticker: &Symbol) -> Result<CompanyFactsFetch, SourceError> {
        let index = self.ticker_index().await?;
        let profile = index
            .value
            .get(ticker.as_str())
            .cloned()
            .ok_or_else(|| {
                SourceError::not_found(format!("ticker {ticker} not found in SEC mapping"))
            })?;
        let facts = self.company_facts(&profile.cik).await?;
        Ok(CompanyFactsFetch {
            profile,
            facts: facts.value,
            cache_hit: index.cache_hit && facts.cache_hit,
        })
    }

    async fn cached_get(&self, entry: &str, url: &str) -> Result<Fetched<String>, SourceError> {
        let cached = if self.config.offline {
            self.cache.peek(entry).await
        } else {
            self.cache.get(entry).await
        };
        match cached {
            Ok(Some(body)) => {
                info!(entry, "serving cached response");
                return Ok(Fetched {
                    value: body,
                    cache_hit: true,
                });
            }
            Ok(None) => {}
            Err(error) => warn!(entry, %error, "cache read failed; fetching"),
        }

        if self.config.offline {
            return Err(SourceError::unavailable(format!(
                "offline mode and no cached entry {entry}"
            )));
        }

        let body = self.fetch(url).await?;
        if let Err(error) = self.cache.put(entry, &body).await {
            warn!(entry, %error, "cache write failed");
        }
        Ok(Fetched {
            value: body,
            cache_hit: false,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        self.config
            .retry
            .run("sec.fetch", |attempt| async move {
                self.limiter.acquire().await;
                info!(url, attempt = attempt + 1, "fetching");
                let request = HttpRequest::get(url)
                    .with_header("user-agent", self.config.user_agent.as_str())
                    .with_header("accept", "application/json")
                    .with_timeout(self.config.request_timeout);
                let response = self.http_client.execute(request).await?;
                if response.is_success() {
                    Ok(response.body)
                } else {
                    Err(response.status_error(url))
                }
            })
            .await
    }
}

impl std::fmt::Debug for SecFactsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecFactsClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
