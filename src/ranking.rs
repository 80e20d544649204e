//! Client for the external keyword-ranking provider.
//!
//! Three live endpoints, HTTP Basic auth, scoped to a single market
//! (France / French). The client returns the provider's raw item shapes and
//! never interprets scores; any transport or provider-side failure propagates
//! to the orchestrator, which owns the fallback decision.

use crate::config::Config;
use crate::error::{AppError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

const RANKED_KEYWORDS_ENDPOINT: &str = "/v3/dataforseo_labs/google/ranked_keywords/live";
const COMPETITORS_ENDPOINT: &str = "/v3/dataforseo_labs/google/competitors_domain/live";
const SUGGESTIONS_ENDPOINT: &str = "/v3/dataforseo_labs/google/keyword_suggestions/live";

/// The provider's "task OK" status code.
const PROVIDER_OK: u32 = 20000;

/// Response envelope: every field optional, because the provider omits keys
/// liberally and a malformed answer must surface as an error, not a panic.
#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ProviderResponse<T> {
    #[serde(default)]
    pub tasks: Vec<ProviderTask<T>>,
}

#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ProviderTask<T> {
    pub status_code: Option<u32>,
    pub status_message: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<ProviderResult<T>>>,
}

#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ProviderResult<T> {
    #[serde(default)]
    pub items: Option<Vec<T>>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct KeywordInfo {
    pub search_volume: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct KeywordProperties {
    pub keyword_difficulty: Option<i64>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct KeywordData {
    pub keyword: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct SerpItem {
    pub rank_group: Option<u32>,
    pub rank_absolute: Option<u32>,
}

#[derive(Deserialize, Debug, Clone)]
pub(crate) struct RankedSerpElement {
    pub serp_item: Option<SerpItem>,
}

/// One keyword the domain already ranks for.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct RankedKeywordItem {
    pub keyword_data: Option<KeywordData>,
    pub ranked_serp_element: Option<RankedSerpElement>,
}

impl RankedKeywordItem {
    pub(crate) fn keyword(&self) -> Option<&str> {
        self.keyword_data.as_ref().and_then(|d| d.keyword.as_deref())
    }

    /// The SERP rank, preferring the grouped rank over the absolute one.
    pub(crate) fn rank_position(&self) -> Option<u32> {
        self.ranked_serp_element
            .as_ref()
            .and_then(|e| e.serp_item.as_ref())
            .and_then(|s| s.rank_group.or(s.rank_absolute))
    }
}

/// A competing domain in the same organic results.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct CompetitorItem {
    pub domain: Option<String>,
}

impl CompetitorItem {
    pub(crate) fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
}

/// A keyword the suggestion engine associates with the seed's niche.
#[derive(Deserialize, Debug, Clone)]
pub(crate) struct SuggestionItem {
    pub keyword: Option<String>,
    pub keyword_info: Option<KeywordInfo>,
    pub keyword_properties: Option<KeywordProperties>,
}

impl SuggestionItem {
    pub(crate) fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub(crate) fn search_volume(&self) -> Option<i64> {
        self.keyword_info.as_ref().and_then(|i| i.search_volume)
    }

    pub(crate) fn difficulty(&self) -> Option<i64> {
        self.keyword_properties
            .as_ref()
            .and_then(|p| p.keyword_difficulty)
    }
}

/// Everything the positioning scorer needs, gathered in one round of calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct RankingSnapshot {
    pub ranked: Vec<RankedKeywordItem>,
    pub competitors: Vec<CompetitorItem>,
    pub suggestions: Vec<SuggestionItem>,
}

#[derive(Debug, Clone)]
pub(crate) struct RankingClient {
    http: Client,
    config: Arc<Config>,
}

impl RankingClient {
    pub(crate) fn new(config: Arc<Config>) -> Result<Self> {
        let http = Client::builder().timeout(config.provider_timeout).build()?;
        Ok(Self { http, config })
    }

    /// Gathers the full ranking snapshot for a domain.
    ///
    /// Task graph: ranked-keywords and competitors are independent and run
    /// concurrently; the suggestions call is seeded by the top ranked keyword
    /// and therefore issued only after ranked-keywords resolves. With no
    /// ranked keyword there is no seed, so suggestions are skipped.
    pub(crate) async fn snapshot(&self, domain: &str) -> Result<RankingSnapshot> {
        let (ranked, competitors) =
            futures::join!(self.ranked_keywords(domain), self.competitors(domain));
        let ranked = ranked?;
        let competitors = competitors?;

        let seed = ranked
            .first()
            .and_then(|item| item.keyword())
            .map(str::to_string);

        let suggestions = match seed {
            Some(seed) => self.keyword_suggestions(&seed).await?,
            None => {
                tracing::debug!(target: "ranking_task",
                    "No ranked keyword for {}, skipping suggestions call", domain
                );
                Vec::new()
            }
        };

        tracing::info!(target: "ranking_task",
            "Snapshot for {}: {} ranked keywords, {} competitors, {} suggestions",
            domain, ranked.len(), competitors.len(), suggestions.len()
        );
        if let Some(top) = competitors.first().and_then(|c| c.domain()) {
            tracing::debug!(target: "ranking_task", "Top competitor of {}: {}", domain, top);
        }

        Ok(RankingSnapshot {
            ranked,
            competitors,
            suggestions,
        })
    }

    /// Keywords the domain currently ranks for, by search volume descending.
    pub(crate) async fn ranked_keywords(&self, domain: &str) -> Result<Vec<RankedKeywordItem>> {
        let payload = json!([{
            "target": domain,
            "location_code": self.config.location_code,
            "language_code": self.config.language_code,
            "limit": self.config.ranked_keywords_limit,
            "order_by": ["keyword_data.keyword_info.search_volume,desc"],
        }]);
        self.call(RANKED_KEYWORDS_ENDPOINT, payload).await
    }

    /// Domains sharing the most organic results, by result count descending.
    pub(crate) async fn competitors(&self, domain: &str) -> Result<Vec<CompetitorItem>> {
        let payload = json!([{
            "target": domain,
            "location_code": self.config.location_code,
            "language_code": self.config.language_code,
            "limit": self.config.competitors_limit,
            "order_by": ["metrics.organic.count,desc"],
        }]);
        self.call(COMPETITORS_ENDPOINT, payload).await
    }

    /// Keyword ideas around a seed keyword, by search volume descending.
    pub(crate) async fn keyword_suggestions(&self, seed: &str) -> Result<Vec<SuggestionItem>> {
        let payload = json!([{
            "keyword": seed,
            "location_code": self.config.location_code,
            "language_code": self.config.language_code,
            "limit": self.config.suggestions_limit,
            "order_by": ["keyword_info.search_volume,desc"],
        }]);
        self.call(SUGGESTIONS_ENDPOINT, payload).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: serde_json::Value,
    ) -> Result<Vec<T>> {
        let url = format!(
            "{}{}",
            self.config.provider_base_url.trim_end_matches('/'),
            endpoint
        );
        tracing::debug!(target: "ranking_task", "POST {}", url);

        let response = self
            .http
            .post(&url)
            .basic_auth(
                &self.config.provider_login,
                Some(&self.config.provider_password),
            )
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let envelope: ProviderResponse<T> = response.json().await?;
        unwrap_items(endpoint, envelope)
    }
}

/// Peels the provider envelope down to its items, surfacing task-level
/// failures as errors. A missing result list is a valid empty answer.
fn unwrap_items<T>(endpoint: &str, envelope: ProviderResponse<T>) -> Result<Vec<T>> {
    let task = envelope
        .tasks
        .into_iter()
        .next()
        .ok_or_else(|| AppError::EmptyProviderResponse(endpoint.to_string()))?;

    let code = task.status_code.unwrap_or(0);
    if code != PROVIDER_OK {
        return Err(AppError::Provider {
            code,
            message: task
                .status_message
                .unwrap_or_else(|| "unknown provider failure".to_string()),
        });
    }

    Ok(task
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|r| r.items)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_items_parses_ranked_keywords() {
        let body = r#"{
            "version": "0.1.20240801",
            "status_code": 20000,
            "tasks": [{
                "id": "08061234-1535-0387-0000-abcdef012345",
                "status_code": 20000,
                "status_message": "Ok.",
                "result": [{
                    "total_count": 2,
                    "items": [
                        {
                            "keyword_data": {
                                "keyword": "agence web paris",
                                "keyword_info": { "search_volume": 5400 }
                            },
                            "ranked_serp_element": {
                                "serp_item": { "rank_group": 7, "rank_absolute": 9 }
                            }
                        },
                        {
                            "keyword_data": { "keyword": "création site internet" }
                        }
                    ]
                }]
            }]
        }"#;
        let envelope: ProviderResponse<RankedKeywordItem> = serde_json::from_str(body).unwrap();
        let items = unwrap_items(RANKED_KEYWORDS_ENDPOINT, envelope).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].keyword(), Some("agence web paris"));
        assert_eq!(items[0].rank_position(), Some(7));
        // Second item has no SERP element at all.
        assert_eq!(items[1].rank_position(), None);
    }

    #[test]
    fn test_unwrap_items_rejects_failed_task() {
        let body = r#"{
            "tasks": [{
                "status_code": 40101,
                "status_message": "Auth error."
            }]
        }"#;
        let envelope: ProviderResponse<SuggestionItem> = serde_json::from_str(body).unwrap();
        let err = unwrap_items(SUGGESTIONS_ENDPOINT, envelope).unwrap_err();
        match err {
            AppError::Provider { code, message } => {
                assert_eq!(code, 40101);
                assert_eq!(message, "Auth error.");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unwrap_items_rejects_empty_envelope() {
        let envelope: ProviderResponse<CompetitorItem> =
            serde_json::from_str(r#"{"tasks": []}"#).unwrap();
        assert!(matches!(
            unwrap_items(COMPETITORS_ENDPOINT, envelope),
            Err(AppError::EmptyProviderResponse(_))
        ));
    }

    #[test]
    fn test_unwrap_items_missing_result_is_empty_answer() {
        let body = r#"{"tasks": [{"status_code": 20000, "status_message": "Ok."}]}"#;
        let envelope: ProviderResponse<SuggestionItem> = serde_json::from_str(body).unwrap();
        let items = unwrap_items(SUGGESTIONS_ENDPOINT, envelope).unwrap();
        assert!(items.is_empty());
    }
}
