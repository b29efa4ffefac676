//! `@handle` extraction from free text.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

static MENTION_RE: OnceLock<Regex> = OnceLock::new();

fn mention_regex() -> &'static Regex {
    MENTION_RE.get_or_init(|| {
        Regex::new(r"@(\w+)")
            .unwrap_or_else(|error| panic!("mention regex failed to compile: {error}"))
    })
}

/// Identifiers mentioned in `text`, marker stripped and deduplicated.
///
/// Content only: no directory lookups and no self-mention filtering.
///
/// # Examples
/// ```
/// use reputation::domain::extract_mentions;
///
/// let found = extract_mentions("hello @alice and @bob, also @alice");
/// assert_eq!(found.into_iter().collect::<Vec<_>>(), ["alice", "bob"]);
/// ```
pub fn extract_mentions(text: &str) -> BTreeSet<String> {
    mention_regex()
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|handle| handle.as_str().to_owned())
        .collect()
}
