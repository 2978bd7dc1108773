// src/services/extract.rs

//! Isolates the JSON array inside free-form model output.
//!
//! Models wrap their answer in markdown fences or prose even when told not
//! to. The fast path slices from the first `[` to the last `]`. When that
//! slice is not valid JSON (typically a `]` in trailing prose or inside a
//! string literal), a string-aware scan looks for the first balanced array
//! that parses.

use serde_json::Value;

/// Returns the JSON array substring of `text`.
///
/// Without a `[` ... `]` pair the input comes back unchanged, and if no
/// candidate parses the fast-path slice is returned, so the caller's parse
/// fails on it. `extract_json_array(extract_json_array(s)) == extract_json_array(s)`.
pub fn extract_json_array(text: &str) -> &str {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return text;
    };
    if start > end {
        return text;
    }

    let fast = &text[start..=end];
    if is_json(fast) {
        return fast;
    }

    first_parsable_array(fast).unwrap_or(fast)
}

fn is_json(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate).is_ok()
}

/// First top-level balanced `[...]` span of `text` that parses as JSON.
///
/// Brackets inside string literals are ignored. Arrays nested in an
/// unclosed outer array are never candidates, so truncated output cannot
/// yield a partial result.
fn first_parsable_array(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut open = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => {
                if depth == 0 {
                    open = i;
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 && is_json(&text[open..=i]) {
                    return Some(&text[open..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
