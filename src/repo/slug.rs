//! Slug normalization

use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

/// Characters that are not safe inside a URI (non-ASCII is always encoded)
const URI_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

lazy_static! {
    static ref SLUG_PATH: Regex = Regex::new(r"^[a-zA-Z0-9%\-]+$").unwrap();
}

/// Turn a title into a URL-safe slug
///
/// # Examples
/// ```ignore
/// slugify("RestClient 0.8") // -> "restclient-08"
/// slugify("Café au lait")   // -> "caf%c3%a9-au-lait"
/// ```
pub fn slugify(title: &str) -> String {
    let hyphenated = title.to_lowercase().replace([' ', '_'], "-");
    let escaped = utf8_percent_encode(&hyphenated, URI_UNSAFE)
        .to_string()
        .to_lowercase();

    let mut slug = String::with_capacity(escaped.len());
    for c in escaped.chars() {
        let allowed = c.is_ascii_alphanumeric() || c == '%' || c == '-';
        if !allowed || (c == '-' && slug.ends_with('-')) {
            continue;
        }
        slug.push(c);
    }
    slug
}

/// Re-encode a decoded path segment so it compares equal to a stored slug
pub fn normalize_lookup(segment: &str) -> String {
    utf8_percent_encode(segment, URI_UNSAFE)
        .to_string()
        .to_lowercase()
}

/// Whether a path segment has the shape of a slug
pub fn is_slug_path(segment: &str) -> bool {
    SLUG_PATH.is_match(segment)
}
