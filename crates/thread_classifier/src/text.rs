//! Text normalization and substring matching.
//!
//! Matching is deliberately plain: lowercase substring search, no tokenizing
//! or stemming.

/// Lowercase and fold typographic apostrophes to ASCII.
pub(crate) fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// ASCII or fullwidth question mark.
pub(crate) fn has_question_mark(text: &str) -> bool {
    text.contains(['?', '\u{FF1F}'])
}

/// First needle contained in `haystack`. Both sides must already be normalized.
pub(crate) fn first_match<'a, I>(haystack: &str, needles: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    needles
        .into_iter()
        .map(String::as_str)
        .find(|needle| !needle.is_empty() && haystack.contains(needle))
}
