//! # Retrievers
//!
//! Search backends behind one enum. Selection is an ordered walk over
//! a credential table - the first configured backend wins - with a
//! no-key DuckDuckGo fallback, never an error.

use serde::Serialize;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::error::StormError;

/// One search hit, shaped the same regardless of backend.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Priority order for credential-based selection. Iterated in order;
/// the first entry whose credential is configured wins.
pub const RETRIEVER_PRIORITY: &[(&str, &str)] = &[
    ("you", "YDC_API_KEY"),
    ("bing", "BING_SEARCH_API_KEY"),
    ("brave", "BRAVE_API_KEY"),
    ("serper", "SERPER_API_KEY"),
    ("tavily", "TAVILY_API_KEY"),
    ("searxng", "SEARXNG_API_KEY"),
    ("azure_ai_search", "AZURE_AI_SEARCH_API_KEY"),
];

/// A configured search backend.
#[derive(Debug, Clone)]
pub enum Retriever {
    You { api_key: String },
    Bing { api_key: String },
    Brave { api_key: String },
    Serper { api_key: String },
    Tavily { api_key: String },
    Searxng { api_key: String, base_url: String },
    AzureAiSearch { api_key: String, endpoint: String, index: String },
    DuckDuckGo,
}

impl Retriever {
    /// First-available-key-wins selection over [`RETRIEVER_PRIORITY`].
    pub fn by_priority(search: &SearchConfig) -> Retriever {
        for (name, env_key) in RETRIEVER_PRIORITY {
            if search.credential(env_key).is_some() {
                if let Some(retriever) = Self::build(name, search) {
                    return retriever;
                }
            }
        }
        Retriever::DuckDuckGo
    }

    /// Selection by explicit name. Unknown names log a warning and
    /// fall back to priority selection.
    pub fn by_name(name: &str, search: &SearchConfig) -> Retriever {
        if name == "duckduckgo" {
            return Retriever::DuckDuckGo;
        }
        match Self::build(name, search) {
            Some(retriever) => retriever,
            None => {
                tracing::warn!("unknown or unconfigured retriever: {name}; selecting by priority");
                Self::by_priority(search)
            }
        }
    }

    fn build(name: &str, search: &SearchConfig) -> Option<Retriever> {
        let retriever = match name {
            "you" => Retriever::You {
                api_key: search.ydc_api_key.clone()?,
            },
            "bing" => Retriever::Bing {
                api_key: search.bing_search_api_key.clone()?,
            },
            "brave" => Retriever::Brave {
                api_key: search.brave_api_key.clone()?,
            },
            "serper" => Retriever::Serper {
                api_key: search.serper_api_key.clone()?,
            },
            "tavily" => Retriever::Tavily {
                api_key: search.tavily_api_key.clone()?,
            },
            "searxng" => Retriever::Searxng {
                api_key: search.searxng_api_key.clone()?,
                base_url: search
                    .searxng_url
                    .clone()
                    .unwrap_or_else(|| "http://localhost:8888".to_string()),
            },
            "azure_ai_search" => Retriever::AzureAiSearch {
                api_key: search.azure_ai_search_api_key.clone()?,
                endpoint: search.azure_ai_search_endpoint.clone()?,
                index: search.azure_ai_search_index.clone()?,
            },
            _ => return None,
        };
        Some(retriever)
    }

    /// Wire name, as reported by `/status`.
    pub fn name(&self) -> &'static str {
        match self {
            Retriever::You { .. } => "you",
            Retriever::Bing { .. } => "bing",
            Retriever::Brave { .. } => "brave",
            Retriever::Serper { .. } => "serper",
            Retriever::Tavily { .. } => "tavily",
            Retriever::Searxng { .. } => "searxng",
            Retriever::AzureAiSearch { .. } => "azure_ai_search",
            Retriever::DuckDuckGo => "duckduckgo",
        }
    }

    /// Run one search, returning up to `k` results.
    pub async fn search(
        &self,
        http: &reqwest::Client,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>, StormError> {
        let body: Value = match self {
            Retriever::You { api_key } => {
                http.get("https://api.ydc-index.io/search")
                    .query(&[("query", query)])
                    .header("X-API-Key", api_key)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            Retriever::Bing { api_key } => {
                http.get("https://api.bing.microsoft.com/v7.0/search")
                    .query(&[("q", query), ("count", &k.to_string())])
                    .header("Ocp-Apim-Subscription-Key", api_key)
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            Retriever::Brave { api_key } => {
                http.get("https://api.search.brave.com/res/v1/web/search")
                    .query(&[("q", query)])
                    .header("X-Subscription-Token", api_key)
                    .header("Accept", "application/json")
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            Retriever::Serper { api_key } => {
                http.post("https://google.serper.dev/search")
                    .header("X-API-KEY", api_key)
                    .json(&serde_json::json!({
                        "q": query,
                        "autocorrect": true,
                        "num": 10,
                        "page": 1,
                    }))
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            Retriever::Tavily { api_key } => {
                http.post("https://api.tavily.com/search")
                    .json(&serde_json::json!({
                        "api_key": api_key,
                        "query": query,
                        "max_results": k,
                        "include_raw_content": true,
                    }))
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            Retriever::Searxng { api_key, base_url } => {
                http.get(format!("{}/search", base_url.trim_end_matches('/')))
                    .query(&[("q", query), ("format", "json")])
                    .header("Authorization", format!("Bearer {api_key}"))
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            Retriever::AzureAiSearch { api_key, endpoint, index } => {
                http.post(format!(
                    "{}/indexes/{}/docs/search?api-version=2023-11-01",
                    endpoint.trim_end_matches('/'),
                    index,
                ))
                .header("api-key", api_key)
                .json(&serde_json::json!({"search": query, "top": k}))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?
            }
            Retriever::DuckDuckGo => {
                http.get("https://api.duckduckgo.com/")
                    .query(&[("q", query), ("format", "json"), ("no_html", "1"), ("kp", "1")])
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
        };

        Ok(self.parse_results(&body, k))
    }

    fn parse_results(&self, body: &Value, k: usize) -> Vec<SearchResult> {
        let (items, title_key, url_key, snippet_key) = match self {
            Retriever::You { .. } => (&body["hits"], "title", "url", "description"),
            Retriever::Bing { .. } => (&body["webPages"]["value"], "name", "url", "snippet"),
            Retriever::Brave { .. } => (&body["web"]["results"], "title", "url", "description"),
            Retriever::Serper { .. } => (&body["organic"], "title", "link", "snippet"),
            Retriever::Tavily { .. } => (&body["results"], "title", "url", "content"),
            Retriever::Searxng { .. } => (&body["results"], "title", "url", "content"),
            Retriever::AzureAiSearch { .. } => (&body["value"], "title", "url", "content"),
            Retriever::DuckDuckGo => (&body["RelatedTopics"], "Text", "FirstURL", "Text"),
        };

        items
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter_map(|item| {
                        let url = item[url_key].as_str()?;
                        Some(SearchResult {
                            title: item[title_key].as_str().unwrap_or_default().to_string(),
                            url: url.to_string(),
                            snippet: item[snippet_key].as_str().unwrap_or_default().to_string(),
                        })
                    })
                    .take(k)
                    .collect()
            })
            .unwrap_or_default()
    }
}
