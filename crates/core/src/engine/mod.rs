//! # Article Engine
//!
//! The seam where the article-generation pipeline plugs in. The HTTP
//! layer and the adapter only ever see [`ArticleEngine`] and
//! [`ArtifactSink`]; the production [`StormEngine`] runs the staged
//! research / outline / article / polish flow against the configured
//! LM backend and retriever.

pub mod lm;
pub mod retriever;
pub mod runner;

pub use lm::{LmClient, ModelTier};
pub use retriever::{Retriever, SearchResult, RETRIEVER_PRIORITY};
pub use runner::StormEngine;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StormError;
use crate::events::ArtifactKey;

/// One pipeline invocation's parameters.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub topic: String,
    pub max_conv_turn: u32,
    pub max_perspective: u32,
    pub search_top_k: u32,
    pub max_thread_num: u32,
    /// Explicit retriever name; `None` selects by credential priority.
    pub retriever: Option<String>,
    pub do_research: bool,
    pub do_generate_outline: bool,
    pub do_generate_article: bool,
    pub do_polish_article: bool,
}

impl RunRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            max_conv_turn: 3,
            max_perspective: 3,
            search_top_k: 3,
            max_thread_num: 3,
            retriever: None,
            do_research: true,
            do_generate_outline: true,
            do_generate_article: true,
            do_polish_article: true,
        }
    }
}

/// Returned by a sink whose consumer went away. The engine treats this
/// as cancellation and stops doing work nobody will see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Where the engine publishes artifacts as it finishes them.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn publish(&self, key: ArtifactKey, content: Value) -> Result<(), SinkClosed>;
}

/// The external pipeline, invoked exactly once per request.
#[async_trait]
pub trait ArticleEngine: Send + Sync {
    /// Run the requested stages, publishing each artifact to `sink` as
    /// it completes. Returning `Err(StormError::Cancelled)` means the
    /// consumer disconnected mid-run; anything else is an upstream
    /// failure.
    async fn run(&self, request: &RunRequest, sink: &dyn ArtifactSink) -> Result<(), StormError>;
}
