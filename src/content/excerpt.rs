//! Summary extraction for listing pages

/// Characters taken before looking for the end of the line
pub const SUMMARY_MIN_CHARS: usize = 200;

/// Split content into `(summary, remainder)`
///
/// The summary is the first [`SUMMARY_MIN_CHARS`] characters extended through
/// the next newline (inclusive). Without such a newline the summary is the
/// whole content and the remainder is empty.
pub fn split_summary(content: &str) -> (&str, &str) {
    let Some((start, _)) = content.char_indices().nth(SUMMARY_MIN_CHARS) else {
        return (content, "");
    };

    match content[start..].find('\n') {
        Some(pos) => content.split_at(start + pos + 1),
        None => (content, ""),
    }
}

/// Memoized summary of a post body
#[derive(Debug, Clone, PartialEq)]
pub struct Excerpt {
    pub summary: String,
    pub has_more: bool,
}

impl Excerpt {
    pub fn new(content: &str) -> Self {
        let (summary, rest) = split_summary(content);
        Self {
            summary: summary.to_string(),
            has_more: !rest.is_empty(),
        }
    }
}
