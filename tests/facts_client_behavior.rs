//! Behavior-driven tests for the SEC facts client
//!
//! These tests verify HOW the client combines its on-disk cache, retry
//! policy and offline mode, using a scripted in-process transport.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use valuecast_core::{
    flatten_company_facts, normalize, CacheMode, FactsClientConfig, HttpError, HttpResponse,
    RetryConfig, ScriptedHttpClient, SecFactsClient, SourceErrorKind, Statement, Symbol,
};

const MAPPING: &str = r#"{
    "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
    "1": {"cik_str": 1652044, "ticker": "GOOGL", "title": "Alphabet Inc."},
    "2": {"cik_str": 789019, "ticker": "MSFT", "title": "Microsoft Corp"}
}"#;

const FACTS: &str = r#"{
    "cik": 320193,
    "entityName": "Apple Inc.",
    "facts": {
        "us-gaap": {
            "Revenues": {"units": {"USD": [
                {"val": 1000.0, "fy": 2023, "fp": "FY", "form": "10-K"},
                {"val": 250.0, "fy": 2023, "fp": "Q1", "form": "10-Q"}
            ]}},
            "Assets": {"units": {"USD": [
                {"val": 500.0, "fy": 2023, "fp": "FY", "form": "10-K"}
            ]}}
        }
    }
}"#;

fn config(cache: &TempDir) -> FactsClientConfig {
    FactsClientConfig {
        cache_dir: cache.path().to_path_buf(),
        min_interval: Duration::ZERO,
        retry: RetryConfig::fixed(Duration::ZERO, 3),
        ..FactsClientConfig::default()
    }
}

fn client(config: FactsClientConfig, http: &ScriptedHttpClient) -> SecFactsClient {
    SecFactsClient::new(config, Arc::new(http.clone()))
}

// =============================================================================
// Facts Client: Cache Behavior
// =============================================================================

#[tokio::test]
async fn when_entry_is_cached_system_replays_it_without_network() {
    // Given: A client whose first ticker lookup populates the cache
    let cache = TempDir::new().expect("tempdir");
    let http = ScriptedHttpClient::new([Ok(HttpResponse::ok_json(MAPPING))]);
    let first = client(config(&cache), &http).search("a", 10).await.expect("first search");

    // When: A second client over the same cache searches again
    let second = client(config(&cache), &http).search("a", 10).await.expect("second search");

    // Then: Only one request reached the transport and the replay is flagged
    assert_eq!(http.request_count(), 1);
    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.value, second.value);
}

#[tokio::test]
async fn when_refresh_is_requested_system_refetches_and_overwrites() {
    // Given: A warm cache holding a one-ticker mapping
    let cache = TempDir::new().expect("tempdir");
    let stale = r#"{"0": {"cik_str": 1, "ticker": "OLD", "title": "Old Co"}}"#;
    let http = ScriptedHttpClient::new([Ok(HttpResponse::ok_json(stale)), Ok(HttpResponse::ok_json(MAPPING))]);
    client(config(&cache), &http).ticker_index().await.expect("warm cache");

    // When: A refreshing client loads the index
    let refreshing = FactsClientConfig {
        cache_mode: CacheMode::Refresh,
        ..config(&cache)
    };
    let refreshed = client(refreshing, &http).ticker_index().await.expect("refresh");

    // Then: The new body is served and persisted for later readers
    assert_eq!(http.request_count(), 2);
    assert_eq!(refreshed.value.len(), 3);
    let reread = client(config(&cache), &http).ticker_index().await.expect("reread");
    assert!(reread.cache_hit);
    assert!(reread.value.get("MSFT").is_some());
}

#[tokio::test]
async fn when_offline_and_cache_is_cold_system_fails_without_network() {
    // Given: An offline client with an empty cache
    let cache = TempDir::new().expect("tempdir");
    let http = ScriptedHttpClient::new([Ok(HttpResponse::ok_json(MAPPING))]);
    let offline = FactsClientConfig {
        offline: true,
        ..config(&cache)
    };

    // When: It searches
    let error = client(offline, &http).search("AAPL", 5).await.expect_err("cold cache");

    // Then: The miss is reported as unavailable and nothing was fetched
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(http.request_count(), 0);
}

// =============================================================================
// Facts Client: Retry Behavior
// =============================================================================

#[tokio::test]
async fn when_transport_fails_transiently_system_retries_until_success() {
    // Given: Two transient failures before a good response
    let cache = TempDir::new().expect("tempdir");
    let http = ScriptedHttpClient::new([
        Err(HttpError::new("connection reset")),
        Ok(HttpResponse::with_status(503, "busy")),
        Ok(HttpResponse::ok_json(MAPPING)),
    ]);

    // When: The ticker index is loaded
    let index = client(config(&cache), &http).ticker_index().await.expect("third attempt succeeds");

    // Then: All three attempts were made with the configured user agent
    assert_eq!(http.request_count(), 3);
    assert_eq!(index.value.len(), 3);
    let requests = http.requests();
    assert!(requests.iter().all(|request| request.headers.contains_key("user-agent")));
}

#[tokio::test]
async fn when_failures_outlast_attempts_system_surfaces_the_last_error() {
    // Given: More transient failures than the policy allows
    let cache = TempDir::new().expect("tempdir");
    let http = ScriptedHttpClient::new((0..5).map(|_| Ok(HttpResponse::with_status(429, ""))));

    // When: The index is loaded
    let error = client(config(&cache), &http).ticker_index().await.expect_err("exhausted");

    // Then: Exactly max_attempts requests were made
    assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    assert_eq!(http.request_count(), 3);
}

#[tokio::test]
async fn when_resource_is_missing_system_does_not_retry() {
    // Given: A transport answering 404
    let cache = TempDir::new().expect("tempdir");
    let http = ScriptedHttpClient::new([Ok(HttpResponse::with_status(404, ""))]);

    // When: The index is loaded
    let error = client(config(&cache), &http).ticker_index().await.expect_err("missing");

    // Then: One attempt only
    assert_eq!(error.kind(), SourceErrorKind::NotFound);
    assert_eq!(http.request_count(), 1);
}

// =============================================================================
// Facts Client: Ticker Resolution
// =============================================================================

#[tokio::test]
async fn when_ticker_is_known_system_fetches_facts_by_padded_cik() {
    // Given: A mapping and a facts document
    let cache = TempDir::new().expect("tempdir");
    let http = ScriptedHttpClient::new([Ok(HttpResponse::ok_json(MAPPING)), Ok(HttpResponse::ok_json(FACTS))]);
    let ticker = Symbol::parse("aapl").expect("valid");

    // When: Facts are requested by ticker
    let fetched = client(config(&cache), &http).facts_by_ticker(&ticker).await.expect("facts");

    // Then: The CIK is zero-padded in the URL and the facts normalize
    assert_eq!(fetched.profile.cik, "0000320193");
    assert!(http.requests()[1].url.ends_with("/CIK0000320193.json"));
    let rows = normalize(&flatten_company_facts(&fetched.facts));
    assert!(rows.iter().any(|row| row.statement == Statement::Balance && row.value == 500.0));
}

#[tokio::test]
async fn when_ticker_is_unknown_system_reports_not_found_after_one_lookup() {
    // Given: A mapping that lacks the ticker
    let cache = TempDir::new().expect("tempdir");
    let http = ScriptedHttpClient::new([Ok(HttpResponse::ok_json(MAPPING))]);
    let ticker = Symbol::parse("ZZZZ").expect("valid");

    // When: Facts are requested
    let error = client(config(&cache), &http).facts_by_ticker(&ticker).await.expect_err("unknown");

    // Then: NotFound, and no facts request was attempted
    assert_eq!(error.kind(), SourceErrorKind::NotFound);
    assert_eq!(http.request_count(), 1);
}
