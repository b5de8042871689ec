//! # Storm Core
//!
//! The "Brain" of the STORM article service - everything the HTTP layer
//! delegates to lives here.
//!
//! ## Architecture
//!
//! - `encoding/` - text normalization and JSON-safe serialization
//! - `stream/` - simulated chunk-by-chunk streaming of finished articles
//! - `engine/` - the article pipeline seam (LM backends, retrievers, stage runner)
//! - `adapter` - collect/stream invocation of the engine
//! - `config` - environment-backed configuration, resolved once at startup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storm_core::adapter::PipelineAdapter;
//! use storm_core::engine::{RunRequest, StormEngine};
//!
//! let engine = Arc::new(StormEngine::new(config));
//! let adapter = PipelineAdapter::new(engine);
//! let bundle = adapter.collect(&RunRequest::new("Rust programming")).await?;
//! ```

pub mod adapter;
pub mod config;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod events;
pub mod stream;

pub use adapter::PipelineAdapter;
pub use config::AppConfig;
pub use error::StormError;
pub use events::{ArtifactKey, Phase, ResultBundle, StreamEvent};
