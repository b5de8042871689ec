//! # Configuration
//!
//! Environment-backed configuration, resolved once at startup and
//! passed by reference into request handlers - never read ad hoc per
//! call.

use serde::Serialize;

/// Which chat-completion backend serves language-model calls.
///
/// Anything other than an explicit `openai` selects Azure, matching the
/// service's historical behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LmApiType {
    OpenAi,
    Azure,
}

impl LmApiType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LmApiType::OpenAi => "openai",
            LmApiType::Azure => "azure",
        }
    }
}

/// Language-model backend settings.
#[derive(Debug, Clone)]
pub struct LmConfig {
    pub api_type: LmApiType,
    pub openai_api_key: Option<String>,
    pub azure_api_base: Option<String>,
    pub azure_api_version: Option<String>,
    pub gpt_35_deployment: Option<String>,
    pub gpt_4o_deployment: Option<String>,
}

/// Credentials and endpoints for the search retrievers.
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub ydc_api_key: Option<String>,
    pub bing_search_api_key: Option<String>,
    pub brave_api_key: Option<String>,
    pub serper_api_key: Option<String>,
    pub tavily_api_key: Option<String>,
    pub searxng_api_key: Option<String>,
    pub searxng_url: Option<String>,
    pub azure_ai_search_api_key: Option<String>,
    pub azure_ai_search_endpoint: Option<String>,
    pub azure_ai_search_index: Option<String>,
}

impl SearchConfig {
    /// Look a credential up by its environment-variable name. Drives
    /// the ordered retriever-priority table.
    pub fn credential(&self, env_key: &str) -> Option<&str> {
        match env_key {
            "YDC_API_KEY" => self.ydc_api_key.as_deref(),
            "BING_SEARCH_API_KEY" => self.bing_search_api_key.as_deref(),
            "BRAVE_API_KEY" => self.brave_api_key.as_deref(),
            "SERPER_API_KEY" => self.serper_api_key.as_deref(),
            "TAVILY_API_KEY" => self.tavily_api_key.as_deref(),
            "SEARXNG_API_KEY" => self.searxng_api_key.as_deref(),
            "AZURE_AI_SEARCH_API_KEY" => self.azure_ai_search_api_key.as_deref(),
            _ => None,
        }
    }
}

/// Application configuration, resolved once.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub lm: LmConfig,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Read everything from the process environment. `.env` loading
    /// (dotenvy) is the binary's job and happens before this call.
    pub fn from_env() -> Self {
        let api_type = match env_opt("OPENAI_API_TYPE").as_deref() {
            Some("openai") => LmApiType::OpenAi,
            _ => LmApiType::Azure,
        };
        Self {
            lm: LmConfig {
                api_type,
                openai_api_key: env_opt("OPENAI_API_KEY"),
                azure_api_base: env_opt("AZURE_API_BASE"),
                azure_api_version: env_opt("AZURE_API_VERSION"),
                gpt_35_deployment: env_opt("GPT_3_5_DEPLOYMENT_NAME"),
                gpt_4o_deployment: env_opt("GPT_4O_DEPLOYMENT_NAME"),
            },
            search: SearchConfig {
                ydc_api_key: env_opt("YDC_API_KEY"),
                bing_search_api_key: env_opt("BING_SEARCH_API_KEY"),
                brave_api_key: env_opt("BRAVE_API_KEY"),
                serper_api_key: env_opt("SERPER_API_KEY"),
                tavily_api_key: env_opt("TAVILY_API_KEY"),
                searxng_api_key: env_opt("SEARXNG_API_KEY"),
                searxng_url: env_opt("SEARXNG_URL"),
                azure_ai_search_api_key: env_opt("AZURE_AI_SEARCH_API_KEY"),
                azure_ai_search_endpoint: env_opt("AZURE_AI_SEARCH_ENDPOINT"),
                azure_ai_search_index: env_opt("AZURE_AI_SEARCH_INDEX"),
            },
        }
    }

    /// Which credentials are configured. Booleans only, never values.
    pub fn credential_status(&self) -> CredentialStatus {
        CredentialStatus {
            openai: self.lm.openai_api_key.is_some(),
            you: self.search.ydc_api_key.is_some(),
            bing: self.search.bing_search_api_key.is_some(),
            brave: self.search.brave_api_key.is_some(),
            serper: self.search.serper_api_key.is_some(),
            tavily: self.search.tavily_api_key.is_some(),
            searxng: self.search.searxng_api_key.is_some(),
            azure_ai_search: self.search.azure_ai_search_api_key.is_some(),
        }
    }
}

/// `/status` report of configured credentials.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatus {
    pub openai: bool,
    pub you: bool,
    pub bing: bool,
    pub brave: bool,
    pub serper: bool,
    pub tavily: bool,
    pub searxng: bool,
    pub azure_ai_search: bool,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
