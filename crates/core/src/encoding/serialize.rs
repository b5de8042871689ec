//! # Safe Serialization
//!
//! JSON encoding that prefers to keep non-ASCII characters intact and
//! only normalizes when direct encoding fails.

use serde::Serialize;
use serde_json::Value;

use super::normalize::normalize_value;

/// Serialize a value to JSON without ever panicking.
///
/// Direct encoding first (non-ASCII preserved, not escaped). On
/// failure the value is routed through the normalizer and retried. A
/// value that cannot be stringified at all collapses to a JSON string
/// describing the failure - logged, never silently dropped.
pub fn safe_json_serialize<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(err) => {
            tracing::warn!("JSON serialization error: {err}. Attempting to normalize data.");
            match serde_json::to_value(value) {
                Ok(tree) => match serde_json::to_string(&normalize_value(tree)) {
                    Ok(encoded) => encoded,
                    Err(err) => fallback(err),
                },
                Err(err) => fallback(err),
            }
        }
    }
}

fn fallback(err: serde_json::Error) -> String {
    tracing::error!("serialization failed even after normalization: {err}");
    Value::String(format!("serialization error: {err}")).to_string()
}
