//! Text parsing and extraction utilities for Twitter content.

/// Extracts the image search term from a tweet that contains the trigger phrase.
///
/// The text is split at the first occurrence of `trigger` (matched
/// case-insensitively) and the remainder is trimmed.
/// Example: `"@bot find image sunset"` with trigger `"find image"` yields `"sunset"`.
///
/// # Parameters
///
/// - `text`: The tweet text
/// - `trigger`: The trigger phrase tracked on the stream
///
/// # Returns
///
/// - `Some(term)`: The trimmed text following the trigger phrase
/// - `None`: If the phrase is absent or nothing follows it
pub fn extract_search_term(text: &str, trigger: &str) -> Option<String> {
    let trigger = trigger.trim();
    if trigger.is_empty() {
        return None;
    }

    let re = regex::Regex::new(&format!("(?i){}", regex::escape(trigger))).ok()?;
    let mat = re.find(text)?;
    let term = text[mat.end()..].trim();

    if term.is_empty() {
        None
    } else {
        Some(term.to_string())
    }
}
