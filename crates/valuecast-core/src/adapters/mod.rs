mod openai;
mod sec;

pub use openai::{EnhancerConfig, OpenAiEnhancer, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use sec::{
    CompanyFactsFetch, FactsClientConfig, Fetched, SecFactsClient, TickerIndex,
    COMPANY_FACTS_URL, DEFAULT_CACHE_DIR, DEFAULT_SEARCH_LIMIT, DEFAULT_USER_AGENT,
    TICKER_CIK_URL,
};
