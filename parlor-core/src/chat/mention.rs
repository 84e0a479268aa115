//! `@ai` detection and mention autocomplete.

use once_cell::sync::Lazy;
use regex::Regex;

/// Handles offered by autocomplete.
pub const MENTION_HANDLES: &[&str] = &["ai"];

static AI_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|[^\w@])@ai\b").expect("mention pattern is valid"));

/// True when `@ai` appears as a standalone token, in any case.
pub fn mentions_assistant(text: &str) -> bool {
    AI_MENTION.is_match(text)
}

/// Removes every `@ai` token and collapses the whitespace left behind.
pub fn strip_assistant_mention(text: &str) -> String {
    let stripped = AI_MENTION.replace_all(text, "$1");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The partial handle after a trailing `@`, if the cursor sits on one.
pub fn trailing_mention(input: &str) -> Option<&str> {
    if input.ends_with(char::is_whitespace) {
        return None;
    }
    let token = input.split_whitespace().last()?;
    token.strip_prefix('@')
}

/// Handles matching the trailing token by prefix.
pub fn suggestions(input: &str) -> Vec<&'static str> {
    let Some(partial) = trailing_mention(input) else {
        return Vec::new();
    };
    let partial = partial.to_ascii_lowercase();
    MENTION_HANDLES
        .iter()
        .copied()
        .filter(|handle| handle.starts_with(&partial))
        .collect()
}

/// Replaces the trailing `@token` with the canonical handle and a space.
pub fn apply_suggestion(input: &str, handle: &str) -> String {
    match trailing_mention(input) {
        Some(partial) => {
            let cut = input.len() - partial.len() - 1;
            format!("{}@{} ", &input[..cut], handle)
        }
        None => input.to_string(),
    }
}
