//! # Stage Runner
//!
//! The production [`ArticleEngine`]: research, outline, article, and
//! polish stages, each gated by its request flag and published to the
//! sink the moment it finishes. Stages run in a fixed order; a skipped
//! stage simply publishes nothing.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::{json, Map, Value};

use crate::config::AppConfig;
use crate::error::StormError;
use crate::events::ArtifactKey;

use super::lm::{LmClient, ModelTier};
use super::retriever::{Retriever, SearchResult};
use super::{ArticleEngine, ArtifactSink, RunRequest};

const CONV_MAX_TOKENS: u32 = 500;
const OUTLINE_MAX_TOKENS: u32 = 2500;
const ARTICLE_MAX_TOKENS: u32 = 2500;
const POLISH_MAX_TOKENS: u32 = 4000;

/// Staged article pipeline over the configured LM backend and
/// retriever. One instance is shared by all requests; each run owns
/// its own state.
pub struct StormEngine {
    config: Arc<AppConfig>,
    http: reqwest::Client,
}

impl StormEngine {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ArticleEngine for StormEngine {
    async fn run(&self, request: &RunRequest, sink: &dyn ArtifactSink) -> Result<(), StormError> {
        let lm = LmClient::from_config(&self.config.lm, self.http.clone())?;
        let retriever = match request.retriever.as_deref() {
            Some(name) => Retriever::by_name(name, &self.config.search),
            None => Retriever::by_priority(&self.config.search),
        };
        tracing::info!(topic = %request.topic, retriever = retriever.name(), "pipeline run starting");

        let mut research = ResearchNotes::default();
        if request.do_research {
            research = self.research(request, &lm, &retriever).await?;
            publish(sink, ArtifactKey::ConversationLog, research.conversation_log.clone()).await?;
            publish(sink, ArtifactKey::RawSearchResults, research.raw_search_results.clone())
                .await?;
            publish(sink, ArtifactKey::UrlToInfo, research.url_to_info.clone()).await?;
        }

        let mut outline = None;
        if request.do_generate_outline {
            let direct = lm
                .complete(
                    ModelTier::Strong,
                    "You write wiki outlines.",
                    &format!(
                        "Write a hierarchical outline for a wiki article about \"{}\". \
                         Use markdown headings only.",
                        request.topic
                    ),
                    OUTLINE_MAX_TOKENS,
                )
                .await?;
            publish(sink, ArtifactKey::DirectGenOutline, Value::String(direct)).await?;

            let refined = lm
                .complete(
                    ModelTier::Strong,
                    "You write wiki outlines.",
                    &format!(
                        "Refine an outline for a wiki article about \"{}\" using these research \
                         notes:\n{}\nUse markdown headings only.",
                        request.topic,
                        research.digest(),
                    ),
                    OUTLINE_MAX_TOKENS,
                )
                .await?;
            publish(sink, ArtifactKey::StormGenOutline, Value::String(refined.clone())).await?;
            outline = Some(refined);
        }

        let mut article = None;
        if request.do_generate_article {
            let draft = lm
                .complete(
                    ModelTier::Strong,
                    "You write wiki articles with inline citations.",
                    &format!(
                        "Write a wiki article about \"{}\".\nOutline:\n{}\nSources:\n{}",
                        request.topic,
                        outline.as_deref().unwrap_or("(none)"),
                        research.digest(),
                    ),
                    ARTICLE_MAX_TOKENS,
                )
                .await?;
            publish(sink, ArtifactKey::StormGenArticle, Value::String(draft.clone())).await?;
            article = Some(draft);
        }

        if request.do_polish_article {
            let base = match &article {
                Some(draft) => draft.clone(),
                // Polish without a draft can only restate the topic.
                None => format!("A wiki article about {}.", request.topic),
            };
            let polished = lm
                .complete(
                    ModelTier::Strong,
                    "You polish wiki articles: add a lead summary, remove repetition, keep citations.",
                    &base,
                    POLISH_MAX_TOKENS,
                )
                .await?;
            publish(sink, ArtifactKey::StormGenArticlePolished, Value::String(polished)).await?;
        }

        tracing::info!(topic = %request.topic, "pipeline run finished");
        Ok(())
    }
}

impl StormEngine {
    /// Simulated multi-perspective research: for each perspective, ask
    /// questions for up to `max_conv_turn` turns and search each one.
    /// Interviews run concurrently, at most `max_thread_num` at a time,
    /// and are merged back in perspective order.
    async fn research(
        &self,
        request: &RunRequest,
        lm: &LmClient,
        retriever: &Retriever,
    ) -> Result<ResearchNotes, StormError> {
        let perspectives_raw = lm
            .complete(
                ModelTier::Fast,
                "You identify perspectives for researching a topic.",
                &format!(
                    "List up to {} distinct perspectives for researching \"{}\". \
                     One short phrase per line, no numbering.",
                    request.max_perspective, request.topic
                ),
                CONV_MAX_TOKENS,
            )
            .await?;
        let perspectives: Vec<&str> = perspectives_raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(request.max_perspective as usize)
            .collect();

        let interview_futures: Vec<_> = perspectives
            .into_iter()
            .map(|perspective| self.interview(request, lm, retriever, perspective))
            .collect();
        let interviews: Vec<PerspectiveNotes> = stream::iter(interview_futures)
            .buffered(concurrency_width(request.max_thread_num))
            .try_collect()
            .await?;

        let mut notes = ResearchNotes::default();
        let mut conversation = Vec::new();
        let mut raw_results = Vec::new();
        let mut url_to_info = Map::new();
        for interview in interviews {
            conversation.push(interview.dialogue);
            raw_results.extend(interview.raw_results);
            for (url, info) in interview.url_entries {
                url_to_info.insert(url, info);
            }
            notes.snippets.extend(interview.snippets);
        }

        notes.conversation_log = Value::Array(conversation);
        notes.raw_search_results = Value::Array(raw_results);
        notes.url_to_info = Value::Object(url_to_info);
        Ok(notes)
    }

    /// One perspective's conversation: question, search, record, repeat.
    async fn interview(
        &self,
        request: &RunRequest,
        lm: &LmClient,
        retriever: &Retriever,
        perspective: &str,
    ) -> Result<PerspectiveNotes, StormError> {
        let mut turns = Vec::new();
        let mut raw_results = Vec::new();
        let mut url_entries = Vec::new();
        let mut snippets = Vec::new();

        for turn in 0..request.max_conv_turn {
            let question = lm
                .complete(
                    ModelTier::Fast,
                    "You ask one focused research question.",
                    &format!(
                        "Topic: {}\nPerspective: {}\nTurn {} of {}. Ask one new question.",
                        request.topic,
                        perspective,
                        turn + 1,
                        request.max_conv_turn,
                    ),
                    CONV_MAX_TOKENS,
                )
                .await?;
            let question = question.trim().to_string();

            // A single failed search skips the turn, not the run.
            let results = match retriever
                .search(&self.http, &question, request.search_top_k as usize)
                .await
            {
                Ok(results) => results,
                Err(err) => {
                    tracing::warn!(%question, "search failed: {err}; skipping turn");
                    Vec::new()
                }
            };

            for result in &results {
                url_entries.push((
                    result.url.clone(),
                    json!({"title": result.title, "snippet": result.snippet}),
                ));
            }
            raw_results.push(json!({"query": &question, "results": &results}));
            snippets.extend(results.iter().map(result_line));
            turns.push(json!({
                "user_utterance": question,
                "search_results": results,
            }));
        }

        Ok(PerspectiveNotes {
            dialogue: json!({"perspective": perspective, "dlg_turns": turns}),
            raw_results,
            url_entries,
            snippets,
        })
    }
}

/// What one interview contributed, merged into [`ResearchNotes`] in
/// perspective order regardless of completion order.
struct PerspectiveNotes {
    dialogue: Value,
    raw_results: Vec<Value>,
    url_entries: Vec<(String, Value)>,
    snippets: Vec<String>,
}

fn concurrency_width(max_thread_num: u32) -> usize {
    max_thread_num.max(1) as usize
}

/// Everything the research stage learned, kept for later stages.
#[derive(Debug, Default)]
struct ResearchNotes {
    conversation_log: Value,
    raw_search_results: Value,
    url_to_info: Value,
    snippets: Vec<String>,
}

impl ResearchNotes {
    fn digest(&self) -> String {
        if self.snippets.is_empty() {
            "(no research notes)".to_string()
        } else {
            self.snippets.join("\n")
        }
    }
}

fn result_line(result: &SearchResult) -> String {
    format!("- {} ({}): {}", result.title, result.url, result.snippet)
}

async fn publish(
    sink: &dyn ArtifactSink,
    key: ArtifactKey,
    content: Value,
) -> Result<(), StormError> {
    sink.publish(key, content).await.map_err(|_| StormError::Cancelled)
}
