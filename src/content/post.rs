//! Post model

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use super::excerpt::Excerpt;
use super::Renderer;
use crate::helpers::{encode_path_segment, html_escape};

/// Markup format of a post body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Txt,
    Markdown,
    Textile,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Txt, Format::Markdown, Format::Textile];

    /// Parse a stored or submitted format; anything unknown is plain text
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "markdown" => Format::Markdown,
            "textile" => Format::Textile,
            _ => Format::Txt,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Txt => "txt",
            Format::Markdown => "markdown",
            Format::Textile => "textile",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility value of a public post
pub const VISIBLE: i64 = 1;
/// Visibility value of a soft-deleted post
pub const DELETED: i64 = 0;

/// A blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Row id, `None` until inserted
    pub id: Option<i64>,

    /// Post title
    pub title: String,

    /// Raw body text, changed through [`Post::set_content`]
    content: String,

    /// URL-friendly name
    pub slug: String,

    /// Space separated tags
    pub tags: String,

    /// Publication date, `None` until saved
    pub created_at: Option<DateTime<FixedOffset>>,

    /// 1 = visible, 0 = soft-deleted
    pub delete_status: i64,

    /// Body markup
    pub format: Format,

    #[serde(skip)]
    excerpt: OnceLock<Excerpt>,
}

impl Post {
    /// Create an unsaved post
    pub fn new(title: &str, content: &str, tags: &str, format: Format) -> Self {
        Self {
            id: None,
            title: title.to_string(),
            content: content.to_string(),
            slug: String::new(),
            tags: tags.to_string(),
            created_at: None,
            delete_status: VISIBLE,
            format,
            excerpt: OnceLock::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the body and drop the cached summary
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.excerpt = OnceLock::new();
    }

    fn excerpt(&self) -> &Excerpt {
        self.excerpt.get_or_init(|| Excerpt::new(&self.content))
    }

    /// Leading part of the body shown on listing pages
    pub fn summary(&self) -> &str {
        &self.excerpt().summary
    }

    /// Whether the body continues past [`Post::summary`]
    pub fn has_more(&self) -> bool {
        self.excerpt().has_more
    }

    pub fn content_html(&self, renderer: &Renderer) -> String {
        renderer.render(&self.content, self.format)
    }

    pub fn summary_html(&self, renderer: &Renderer) -> String {
        renderer.render(self.summary(), self.format)
    }

    pub fn is_deleted(&self) -> bool {
        self.delete_status == DELETED
    }

    /// Permalink path: `/YYYY/MM/DD/slug/`
    pub fn url(&self) -> String {
        match &self.created_at {
            Some(date) => format!("/{}/{}/", date.format("%Y/%m/%d"), self.slug),
            None => format!("/{}/", self.slug),
        }
    }

    /// Permalink prefixed with the blog's base url
    pub fn full_url(&self, url_base: &str) -> String {
        format!("{}{}", url_base.trim_end_matches('/'), self.url())
    }

    /// Tags as individual tokens
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split_whitespace().collect()
    }

    /// Tags as links to their listing pages
    pub fn linked_tags(&self) -> String {
        self.tag_list()
            .iter()
            .map(|tag| {
                format!(
                    r#"<a href="/tags/{}">{}</a>"#,
                    html_escape(&encode_path_segment(tag)),
                    html_escape(tag)
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn show_created_at(&self) -> String {
        self.created_at
            .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new("", "", "", Format::Txt)
    }
}

impl PartialEq for Post {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.content == other.content
            && self.slug == other.slug
            && self.tags == other.tags
            && self.created_at == other.created_at
            && self.delete_status == other.delete_status
            && self.format == other.format
    }
}
