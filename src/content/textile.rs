//! Textile rendering
//!
//! Covers the block and phrase modifiers used in blog posts: headings,
//! paragraphs, block quotes, code blocks, bulleted and numbered lists,
//! strong/emphasis/code/deleted/inserted phrases and links. Raw HTML in the
//! source is escaped rather than passed through.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref BLOCK_SIGNATURE: Regex = Regex::new(r"^(h[1-6]|p|bq|bc)\. (.*)$").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"^([*#]+) (.*)$").unwrap();
    static ref LINK: Regex = Regex::new(r#""([^"]+)":([^\s"<]+)"#).unwrap();
    static ref CODE: Regex = Regex::new(r"(^|[\s(\[>])@([^@]+)@").unwrap();
    static ref STRONG: Regex = Regex::new(r"(^|[\s(\[>])\*([^*\s](?:[^*]*[^*\s])?)\*").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"(^|[\s(\[>])_([^_\s](?:[^_]*[^_\s])?)_").unwrap();
    static ref DELETED: Regex = Regex::new(r"(^|[\s(\[>])-([^-\s](?:[^-]*[^-\s])?)-").unwrap();
    static ref INSERTED: Regex = Regex::new(r"(^|[\s(\[>])\+([^+\s](?:[^+]*[^+\s])?)\+").unwrap();
}

/// Render Textile markup to HTML
pub fn render(input: &str) -> String {
    let input = input.replace("\r\n", "\n");

    split_blocks(&input)
        .iter()
        .map(|block| render_block(block))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Group lines into blocks separated by blank lines
fn split_blocks(input: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in input.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn render_block(lines: &[&str]) -> String {
    let first = lines[0];

    if LIST_ITEM.is_match(first) {
        return render_list_block(lines);
    }

    let Some(caps) = BLOCK_SIGNATURE.captures(first) else {
        return format!("<p>{}</p>", render_lines(lines));
    };

    let mut body: Vec<&str> = Vec::with_capacity(lines.len());
    body.push(caps.get(2).map_or("", |m| m.as_str()));
    body.extend_from_slice(&lines[1..]);

    match &caps[1] {
        "bc" => format!("<pre><code>{}</code></pre>", escape_text(&body.join("\n"))),
        "bq" => format!("<blockquote>\n<p>{}</p>\n</blockquote>", render_lines(&body)),
        "p" => format!("<p>{}</p>", render_lines(&body)),
        heading => format!("<{0}>{1}</{0}>", heading, render_lines(&body)),
    }
}

/// Escape and apply phrase modifiers line by line, joining with hard breaks
fn render_lines(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| render_inline(line.trim()))
        .collect::<Vec<_>>()
        .join("<br />\n")
}

struct ListItem {
    depth: usize,
    ordered: bool,
    text: String,
}

fn render_list_block(lines: &[&str]) -> String {
    let mut items: Vec<ListItem> = Vec::new();

    for line in lines {
        match LIST_ITEM.captures(line) {
            Some(caps) => items.push(ListItem {
                depth: caps[1].len(),
                ordered: caps[1].ends_with('#'),
                text: caps[2].to_string(),
            }),
            // Continuation lines belong to the previous item
            None => {
                if let Some(last) = items.last_mut() {
                    last.text.push(' ');
                    last.text.push_str(line.trim());
                }
            }
        }
    }

    let mut lists = Vec::new();
    let mut pos = 0;
    while pos < items.len() {
        let depth = items[pos].depth;
        lists.push(render_list(&items, &mut pos, depth));
    }
    lists.join("\n")
}

fn render_list(items: &[ListItem], pos: &mut usize, depth: usize) -> String {
    let tag = if items[*pos].ordered { "ol" } else { "ul" };
    let indent = "\t".repeat(depth - 1);
    let mut html = format!("{}<{}>\n", indent, tag);

    while *pos < items.len() && items[*pos].depth == depth {
        let item = &items[*pos];
        *pos += 1;
        html.push_str(&format!("{}\t<li>{}", indent, render_inline(&item.text)));

        if *pos < items.len() && items[*pos].depth > depth {
            let nested_depth = items[*pos].depth;
            html.push('\n');
            html.push_str(&render_list(items, pos, nested_depth));
        }
        html.push_str("</li>\n");
    }

    html.push_str(&format!("{}</{}>", indent, tag));
    html
}

fn render_inline(text: &str) -> String {
    let text = escape_text(text);

    let text = LINK.replace_all(&text, |caps: &Captures| {
        let url = &caps[2];
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
        format!(
            r#"<a href="{}">{}</a>{}"#,
            trimmed,
            &caps[1],
            &url[trimmed.len()..]
        )
    });
    let text = CODE.replace_all(&text, "$1<code>$2</code>");
    let text = STRONG.replace_all(&text, "$1<strong>$2</strong>");
    let text = EMPHASIS.replace_all(&text, "$1<em>$2</em>");
    let text = DELETED.replace_all(&text, "$1<del>$2</del>");
    let text = INSERTED.replace_all(&text, "$1<ins>$2</ins>");

    text.into_owned()
}

/// Quotes are left alone so that link syntax survives escaping
fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
