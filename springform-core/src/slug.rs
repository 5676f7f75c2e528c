//! Deterministic slug derivation for URLs and output paths.
//!
//! `slugify` is the single source of truth for entity slugs: the same name
//! must yield the same slug within and across builds, because canonical URLs,
//! sitemap entries, and prerendered output paths are all derived from it.

/// Convert a name to a URL-safe slug.
///
/// Lowercases the input, collapses every run of characters outside
/// `[a-z0-9]` into a single hyphen, and trims leading/trailing hyphens.
/// e.g., "Bob's Chili!!" -> "bob-s-chili"
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_hyphen = false;
    for c in s.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            out.push(c);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Sanitize a path segment for on-disk output.
///
/// URL-safe slugs are already filesystem-safe, but route paths can carry
/// segments that predate slugging (menu URLs, hand-written category URLs).
/// Windows reserves `< > : " | ? *`, so those are stripped rather than
/// hyphenated to keep output directories stable across platforms.
pub fn sanitize_for_filesystem(segment: &str) -> String {
    segment
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\\' | '/'))
        .collect::<String>()
        .chars()
        .take(200)
        .collect()
}
