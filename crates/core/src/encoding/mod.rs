//! # Encoding
//!
//! Text normalization and JSON-safe serialization. Upstream text
//! producers emit whatever Unicode they like; everything that crosses
//! the JSON boundary goes through here first.

pub mod normalize;
pub mod serialize;

pub use normalize::{normalize_text, normalize_value};
pub use serialize::safe_json_serialize;
