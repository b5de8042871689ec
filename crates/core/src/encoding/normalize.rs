//! # Text Normalization
//!
//! Replaces problematic Unicode with close ASCII equivalents so that
//! any artifact serializes cleanly everywhere downstream.
//!
//! The transform is lossy and one-way: there is no decode counterpart,
//! and normalizing an already-normalized string is a no-op.

use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Explicit substitutions for common "smart" typography, currency, and
/// symbol glyphs. Applied after NFKC, before the catch-all sweep.
const SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{20b9}', "Rs"),          // Indian Rupee
    ('\u{20ac}', "EUR"),         // Euro
    ('\u{00a3}', "GBP"),         // British Pound
    ('\u{00a5}', "JPY"),         // Japanese Yen
    ('\u{00a2}', "cents"),       // Cent
    ('\u{00a9}', "(c)"),         // Copyright
    ('\u{00ae}', "(R)"),         // Registered
    ('\u{2122}', "(TM)"),        // Trademark
    ('\u{2022}', "-"),           // Bullet
    ('\u{2013}', "-"),           // En dash
    ('\u{2014}', "-"),           // Em dash
    ('\u{2018}', "'"),           // Left single quote
    ('\u{2019}', "'"),           // Right single quote
    ('\u{201c}', "\""),          // Left double quote
    ('\u{201d}', "\""),          // Right double quote
    ('\u{00b0}', " degrees"),    // Degree symbol
    ('\u{2026}', "..."),         // Ellipsis
    ('\u{2030}', " per mille"),  // Per mille
    ('\u{2192}', "->"),          // Right arrow
    ('\u{2190}', "<-"),          // Left arrow
    ('\u{2191}', "^"),           // Up arrow
    ('\u{2193}', "v"),           // Down arrow
    ('\u{25cf}', "*"),           // Black circle
    ('\u{2605}', "*"),           // Black star
    ('\u{2606}', "*"),           // White star
    ('\u{2713}', "check"),       // Check mark
    ('\u{2717}', "x"),           // Cross mark
];

/// Normalize a string to its JSON-safe, mostly-ASCII form.
///
/// Three passes, fused into one scan: NFKC compatibility
/// normalization, the explicit substitution table, then a catch-all
/// that turns any remaining BMP code point at or above U+0080 into a
/// single space. Astral code points pass through untouched.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.nfkc() {
        if let Some((_, replacement)) = SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            out.push_str(replacement);
        } else if (0x80..=0xFFFF).contains(&(c as u32)) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// Normalize every string leaf of a JSON value.
///
/// Structure is preserved exactly: mappings keep their keys, sequences
/// keep their order and length, and non-string scalars pass through
/// unchanged. Never fails.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, item)| (key, normalize_value(item)))
                .collect(),
        ),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_currency_substitution() {
        assert_eq!(normalize_text("Price: \u{20b9}100"), "Price: Rs100");
        assert_eq!(normalize_text("\u{20ac}5 or \u{00a3}4"), "EUR5 or GBP4");
    }

    #[test]
    fn test_smart_typography() {
        assert_eq!(
            normalize_text("\u{201c}Hello\u{201d} \u{2014} it\u{2019}s fine\u{2026}"),
            "\"Hello\" - it's fine...",
        );
    }

    #[test]
    fn test_symbols_and_arrows() {
        assert_eq!(normalize_text("a \u{2192} b \u{2713}"), "a -> b check");
        // NFKC decomposes U+2122 to plain "TM" before the table fires.
        assert_eq!(normalize_text("Storm\u{2122} \u{00a9}2024"), "StormTM (c)2024");
    }

    #[test]
    fn test_remaining_bmp_becomes_space() {
        // Cyrillic and CJK are not in the table; each char becomes a space.
        assert_eq!(normalize_text("a\u{0416}b"), "a b");
        assert_eq!(normalize_text("\u{4e16}\u{754c}"), "  ");
        // Latin-1 letters outside the table are swept as well.
        assert_eq!(normalize_text("caf\u{00e9}"), "caf ");
    }

    #[test]
    fn test_astral_passthrough() {
        // Outside the BMP sweep range.
        assert_eq!(normalize_text("ok \u{1f600}"), "ok \u{1f600}");
    }

    #[test]
    fn test_nfkc_applies_before_table() {
        // U+FB01 LATIN SMALL LIGATURE FI decomposes to "fi" under NFKC.
        assert_eq!(normalize_text("\u{fb01}le"), "file");
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "Price: \u{20b9}100",
            "\u{201c}quoted\u{201d} \u{2013} dashed",
            "plain ascii stays plain",
            "mixed \u{4e16} and \u{1f600}",
        ];
        for input in inputs {
            let once = normalize_text(input);
            assert_eq!(normalize_text(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_structural_preservation() {
        let value = json!({
            "title": "\u{201c}Storm\u{201d}",
            "count": 3,
            "nested": {"note": "\u{2026}", "flag": true},
            "items": ["a\u{2013}b", null, 2.5],
        });
        let normalized = normalize_value(value);
        assert_eq!(
            normalized,
            json!({
                "title": "\"Storm\"",
                "count": 3,
                "nested": {"note": "...", "flag": true},
                "items": ["a-b", null, 2.5],
            })
        );
    }

    #[test]
    fn test_non_string_scalars_untouched() {
        assert_eq!(normalize_value(json!(42)), json!(42));
        assert_eq!(normalize_value(json!(null)), json!(null));
        assert_eq!(normalize_value(json!(false)), json!(false));
    }
}
