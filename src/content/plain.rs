//! Plain text rendering: blank-line separated paragraphs with hard breaks

use crate::helpers::html_escape;

/// Render plain text as `<p>` blocks
///
/// Consecutive non-blank lines share a paragraph and are joined with `<br />`.
/// Every blank line between text closes the current paragraph, so a run of
/// blank lines leaves empty `<p></p>` blocks behind. Trailing blank lines are
/// ignored. Input without any text still yields one empty paragraph.
pub fn render(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    let Some((last, body)) = lines.split_last() else {
        return "<p></p>".to_string();
    };

    let mut html = String::new();
    let mut paragraph: Vec<String> = Vec::new();
    for line in body {
        if line.is_empty() {
            push_paragraph(&mut html, &mut paragraph);
        } else {
            paragraph.push(html_escape(line));
        }
    }
    paragraph.push(html_escape(last));
    push_paragraph(&mut html, &mut paragraph);

    html
}

fn push_paragraph(html: &mut String, paragraph: &mut Vec<String>) {
    html.push_str("<p>");
    html.push_str(&paragraph.join("<br />"));
    html.push_str("</p>");
    paragraph.clear();
}
