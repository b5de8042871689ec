//! # Pipeline Adapter
//!
//! Bridges an [`ArticleEngine`] run to the two consumption shapes the
//! HTTP layer needs: a collected [`ResultBundle`] and a live
//! [`StreamEvent`] channel. All artifact content passes through
//! [`normalize_value`] at the boundary, so nothing downstream ever
//! sees the raw engine output.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use crate::encoding::normalize_value;
use crate::engine::{ArticleEngine, ArtifactSink, RunRequest, SinkClosed};
use crate::error::StormError;
use crate::events::{ArtifactKey, ResultBundle, StreamEvent};

/// Events buffered between the engine task and a slow SSE consumer.
const STREAM_BUFFER: usize = 100;

#[derive(Clone)]
pub struct PipelineAdapter {
    engine: Arc<dyn ArticleEngine>,
}

impl PipelineAdapter {
    pub fn new(engine: Arc<dyn ArticleEngine>) -> Self {
        Self { engine }
    }

    /// Run the pipeline to completion and hand back every artifact in
    /// one bundle.
    pub async fn collect(&self, request: &RunRequest) -> Result<ResultBundle, StormError> {
        let sink = CollectSink::default();
        self.engine.run(request, &sink).await?;
        let mut bundle = sink.bundle.into_inner();
        bundle.topic = Some(request.topic.clone());
        Ok(bundle)
    }

    /// Run the pipeline in a background task and stream artifacts as
    /// they are published. The stream always ends with exactly one
    /// terminal event; dropping the receiver cancels the run.
    pub fn stream(&self, request: RunRequest) -> ReceiverStream<StreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let engine = Arc::clone(&self.engine);
        tokio::spawn(async move {
            let sink = ChannelSink { tx: tx.clone() };
            let terminal = match engine.run(&request, &sink).await {
                Ok(()) => StreamEvent::complete(),
                Err(StormError::Cancelled) => {
                    tracing::debug!(topic = %request.topic, "stream consumer went away, run cancelled");
                    return;
                }
                Err(err) => {
                    tracing::error!(topic = %request.topic, "pipeline run failed: {err}");
                    StreamEvent::error(err.to_string())
                }
            };
            let _ = tx.send(terminal).await;
        });
        ReceiverStream::new(rx)
    }
}

/// Accumulates artifacts into a [`ResultBundle`]; never refuses one.
#[derive(Default)]
struct CollectSink {
    bundle: Mutex<ResultBundle>,
}

#[async_trait]
impl ArtifactSink for CollectSink {
    async fn publish(&self, key: ArtifactKey, content: Value) -> Result<(), SinkClosed> {
        self.bundle.lock().await.insert(key, normalize_value(content));
        Ok(())
    }
}

/// Forwards artifacts into the stream channel; reports closure so the
/// engine can stop early.
struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

#[async_trait]
impl ArtifactSink for ChannelSink {
    async fn publish(&self, key: ArtifactKey, content: Value) -> Result<(), SinkClosed> {
        let event = StreamEvent::artifact(key, normalize_value(content));
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Phase;
    use serde_json::json;
    use tokio_stream::StreamExt;

    /// Publishes a fixed script of artifacts, then returns the given
    /// outcome.
    struct ScriptedEngine {
        artifacts: Vec<(ArtifactKey, Value)>,
        outcome: Result<(), StormError>,
    }

    #[async_trait]
    impl ArticleEngine for ScriptedEngine {
        async fn run(
            &self,
            _request: &RunRequest,
            sink: &dyn ArtifactSink,
        ) -> Result<(), StormError> {
            for (key, content) in &self.artifacts {
                if sink.publish(*key, content.clone()).await.is_err() {
                    return Err(StormError::Cancelled);
                }
            }
            match &self.outcome {
                Ok(()) => Ok(()),
                Err(err) => Err(StormError::Upstream(err.to_string())),
            }
        }
    }

    fn adapter(artifacts: Vec<(ArtifactKey, Value)>, outcome: Result<(), StormError>) -> PipelineAdapter {
        PipelineAdapter::new(Arc::new(ScriptedEngine { artifacts, outcome }))
    }

    #[tokio::test]
    async fn test_collect_gathers_artifacts_and_topic() {
        let adapter = adapter(
            vec![
                (ArtifactKey::StormGenArticle, json!("Draft about caf\u{e9}s")),
                (ArtifactKey::UrlToInfo, json!({"https://a": {"title": "A"}})),
            ],
            Ok(()),
        );
        let bundle = adapter.collect(&RunRequest::new("Rust")).await.unwrap();
        assert_eq!(bundle.topic.as_deref(), Some("Rust"));
        // Normalization runs at the boundary: é is swept to a space.
        assert_eq!(bundle.storm_gen_article.as_deref(), Some("Draft about caf s"));
        assert!(bundle.url_to_info.is_some());
        assert!(bundle.storm_gen_article_polished.is_none());
    }

    #[tokio::test]
    async fn test_collect_propagates_engine_error() {
        let adapter = adapter(vec![], Err(StormError::Upstream("lm down".into())));
        let err = adapter.collect(&RunRequest::new("Rust")).await.unwrap_err();
        assert!(matches!(err, StormError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_stream_ends_with_single_complete() {
        let adapter = adapter(
            vec![(ArtifactKey::StormGenOutline, json!("# Outline"))],
            Ok(()),
        );
        let events: Vec<_> = adapter.stream(RunRequest::new("Rust")).collect().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].phase, Phase::StormGenOutline);
        assert_eq!(events[1].phase, Phase::Complete);
        assert_eq!(events.iter().filter(|e| e.phase.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_stream_failure_ends_with_error_event() {
        let adapter = adapter(
            vec![(ArtifactKey::ConversationLog, json!([]))],
            Err(StormError::Upstream("boom".into())),
        );
        let events: Vec<_> = adapter.stream(RunRequest::new("Rust")).collect().await;
        let last = events.last().unwrap();
        assert_eq!(last.phase, Phase::Error);
        assert!(last.content.as_str().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_dropped_receiver_cancels_run() {
        let counted = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        struct EndlessEngine {
            published: Arc<std::sync::atomic::AtomicUsize>,
        }

        #[async_trait]
        impl ArticleEngine for EndlessEngine {
            async fn run(
                &self,
                _request: &RunRequest,
                sink: &dyn ArtifactSink,
            ) -> Result<(), StormError> {
                loop {
                    if sink
                        .publish(ArtifactKey::ConversationLog, json!([]))
                        .await
                        .is_err()
                    {
                        return Err(StormError::Cancelled);
                    }
                    self.published
                        .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            }
        }

        let adapter = PipelineAdapter::new(Arc::new(EndlessEngine {
            published: Arc::clone(&counted),
        }));
        let mut stream = adapter.stream(RunRequest::new("Rust"));
        assert!(stream.next().await.is_some());
        drop(stream);

        // Once the channel drains, the next publish fails and the run
        // stops. Give the task a few polls to get there.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let seen = counted.load(std::sync::atomic::Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(counted.load(std::sync::atomic::Ordering::SeqCst) <= seen + STREAM_BUFFER + 1);
    }
}
