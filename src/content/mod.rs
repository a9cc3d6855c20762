//! Content module - post model and body rendering

mod excerpt;
mod markdown;
pub mod plain;
mod post;
pub mod textile;

pub use excerpt::{split_summary, Excerpt, SUMMARY_MIN_CHARS};
pub use markdown::MarkdownRenderer;
pub use post::{Format, Post, DELETED, VISIBLE};

use crate::config::HighlightConfig;

/// Format-aware body renderer
///
/// Holds the markdown highlighter, which is expensive to load, so one
/// instance is shared across requests.
pub struct Renderer {
    markdown: MarkdownRenderer,
}

impl Renderer {
    pub fn new(highlight: &HighlightConfig) -> Self {
        Self {
            markdown: MarkdownRenderer::with_options(highlight),
        }
    }

    /// Render a full body in the given format
    pub fn render(&self, content: &str, format: Format) -> String {
        match format {
            Format::Markdown => self.markdown.render(content),
            Format::Textile => textile::render(content),
            Format::Txt => plain::render(content),
        }
    }

    /// Render only the summary part of a body
    pub fn render_summary(&self, content: &str, format: Format) -> String {
        self.render(split_summary(content).0, format)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&HighlightConfig::default())
    }
}
