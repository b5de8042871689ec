//! # Language-Model Client
//!
//! Thin chat-completion client over the OpenAI or Azure OpenAI REST
//! APIs. Which backend is active comes from the startup configuration,
//! never from per-call environment reads.

use serde_json::{json, Value};

use crate::config::{LmApiType, LmConfig};
use crate::error::StormError;

const OPENAI_BASE: &str = "https://api.openai.com/v1";
const TEMPERATURE: f64 = 1.0;
const TOP_P: f64 = 0.9;

/// Which class of model a call wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Conversation simulation and question asking (gpt-3.5-turbo).
    Fast,
    /// Outline, article, and polish generation (gpt-4o).
    Strong,
}

/// Chat-completion client bound to one backend.
#[derive(Clone)]
pub struct LmClient {
    http: reqwest::Client,
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    OpenAi {
        api_key: String,
    },
    Azure {
        api_key: String,
        endpoint: String,
        api_version: String,
        fast_deployment: String,
        strong_deployment: String,
    },
}

impl LmClient {
    /// Build a client from resolved configuration. Fails fast when the
    /// selected backend is missing its credentials.
    pub fn from_config(config: &LmConfig, http: reqwest::Client) -> Result<Self, StormError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| StormError::Config("OPENAI_API_KEY is not set".into()))?;

        let backend = match config.api_type {
            LmApiType::OpenAi => Backend::OpenAi { api_key },
            LmApiType::Azure => Backend::Azure {
                api_key,
                endpoint: require(&config.azure_api_base, "AZURE_API_BASE")?,
                api_version: require(&config.azure_api_version, "AZURE_API_VERSION")?,
                fast_deployment: config
                    .gpt_35_deployment
                    .clone()
                    .unwrap_or_else(|| "gpt-35-turbo".to_string()),
                strong_deployment: config
                    .gpt_4o_deployment
                    .clone()
                    .unwrap_or_else(|| "gpt-4o".to_string()),
            },
        };
        Ok(Self { http, backend })
    }

    /// One chat completion. Returns the assistant message content.
    pub async fn complete(
        &self,
        tier: ModelTier,
        system: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, StormError> {
        let body = json!({
            "model": self.model_name(tier),
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
            "max_tokens": max_tokens,
        });

        let request = match &self.backend {
            Backend::OpenAi { api_key } => self
                .http
                .post(format!("{OPENAI_BASE}/chat/completions"))
                .bearer_auth(api_key),
            Backend::Azure {
                api_key,
                endpoint,
                api_version,
                ..
            } => self
                .http
                .post(format!(
                    "{}/openai/deployments/{}/chat/completions?api-version={}",
                    endpoint.trim_end_matches('/'),
                    self.model_name(tier),
                    api_version,
                ))
                .header("api-key", api_key),
        };

        let response: Value = request.json(&body).send().await?.error_for_status()?.json().await?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| StormError::Upstream("chat completion had no message content".into()))
    }

    fn model_name(&self, tier: ModelTier) -> &str {
        match (&self.backend, tier) {
            (Backend::OpenAi { .. }, ModelTier::Fast) => "gpt-3.5-turbo",
            (Backend::OpenAi { .. }, ModelTier::Strong) => "gpt-4o",
            (Backend::Azure { fast_deployment, .. }, ModelTier::Fast) => fast_deployment,
            (Backend::Azure { strong_deployment, .. }, ModelTier::Strong) => strong_deployment,
        }
    }
}

fn require(value: &Option<String>, name: &str) -> Result<String, StormError> {
    value
        .clone()
        .ok_or_else(|| StormError::Config(format!("{name} is not set")))
}
