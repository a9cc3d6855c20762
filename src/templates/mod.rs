//! Built-in page templates
//!
//! Pages are assembled from small string-building functions so the blog ships
//! as a single binary with no template files to install.

mod feed;

pub use feed::atom_feed;

use crate::config::BlogConfig;
use crate::content::{Format, Post, Renderer};
use crate::helpers::{encode_path_segment, html_escape, time_tag};
use crate::repo::{MonthBucket, Paginated};

const STYLE: &str = r#"
body { font-family: Georgia, serif; max-width: 52em; margin: 0 auto; padding: 1em; color: #222; }
header h1 a { color: inherit; text-decoration: none; }
.main { float: left; width: 70%; }
.sidebar { float: right; width: 25%; font-size: 0.9em; }
.post { margin-bottom: 2em; }
.post .meta { color: #777; font-size: 0.85em; }
.deleted { opacity: 0.5; }
.paginate { clear: both; overflow: hidden; }
.pull-left { float: left; }
.pull-right { float: right; }
footer { clear: both; color: #777; font-size: 0.8em; padding-top: 2em; }
textarea { width: 100%; height: 24em; }
input[type=text] { width: 100%; }
"#;

/// Wrap a page body in the site layout
pub fn layout(config: &BlogConfig, title: Option<&str>, body: &str, admin: bool) -> String {
    let page_title = match title {
        Some(title) => format!("{} - {}", html_escape(title), html_escape(&config.title)),
        None => html_escape(&config.title),
    };
    let admin_links = if admin {
        r#"<a href="/posts/new">New post</a> | <a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/auth">Admin</a>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{page_title}</title>
<link rel="alternate" href="/feed" title="{site_title}" type="application/atom+xml">
<meta name="generator" content="quill {version}">
<style>{style}</style>
</head>
<body>
<header>
<h1><a href="/">{site_title}</a></h1>
<p>{subtitle}</p>
</header>
{body}
<footer>
<a href="/archive">Archive</a> | <a href="/feed">Feed</a> | {admin_links}
<p>&copy; {author}</p>
</footer>
</body>
</html>
"#,
        page_title = page_title,
        site_title = html_escape(&config.title),
        subtitle = html_escape(&config.subtitle),
        version = env!("CARGO_PKG_VERSION"),
        style = STYLE,
        body = body,
        admin_links = admin_links,
        author = html_escape(&config.author),
    )
}

/// Previous/next links; empty when everything fits on one page
pub fn paginate(posts: &Paginated<Post>, tag: Option<&str>) -> String {
    if posts.page_count == 1 {
        return String::new();
    }

    let base = tag
        .map(|tag| format!("/tags/{}", html_escape(&encode_path_segment(tag))))
        .unwrap_or_default();
    let mut html = r#"<div class="paginate">"#.to_string();
    if let Some(prev) = posts.prev_page() {
        html.push_str(&format!(
            r#"<p class="pull-left"><a href="{}/page/{}">&larr;&nbsp;Previous</a></p>"#,
            base, prev
        ));
    }
    if let Some(next) = posts.next_page() {
        html.push_str(&format!(
            r#"<p class="pull-right"><a href="{}/page/{}">Next&nbsp;&rarr;</a></p>"#,
            base, next
        ));
    }
    html.push_str("</div>");
    html
}

/// One post as it appears in listings
fn post_summary(renderer: &Renderer, post: &Post) -> String {
    let more = if post.has_more() {
        format!(r#"<p><a href="{}">Continue reading&hellip;</a></p>"#, post.url())
    } else {
        String::new()
    };

    format!(
        r#"<div class="post{deleted}">
<h2><a href="{url}">{title}</a></h2>
<p class="meta">{date} | {tags}</p>
{summary}
{more}
</div>
"#,
        deleted = if post.is_deleted() { " deleted" } else { "" },
        url = post.url(),
        title = html_escape(&post.title),
        date = post.created_at.as_ref().map(time_tag).unwrap_or_default(),
        tags = post.linked_tags(),
        summary = post.summary_html(renderer),
        more = more,
    )
}

fn months_sidebar(months: &[MonthBucket]) -> String {
    let items: String = months
        .iter()
        .map(|month| format!(r#"<li><a href="/{}">{}</a></li>"#, month.path(), month.label()))
        .collect();
    format!(
        r#"<div class="sidebar"><h3>Archives</h3><ul>{}</ul></div>"#,
        items
    )
}

/// Home page and its later pages
pub fn index_page(
    config: &BlogConfig,
    renderer: &Renderer,
    posts: &Paginated<Post>,
    months: &[MonthBucket],
    admin: bool,
) -> String {
    let entries: String = posts
        .items
        .iter()
        .map(|post| post_summary(renderer, post))
        .collect();
    let body = format!(
        r#"<div class="main">{}{}</div>{}"#,
        entries,
        paginate(posts, None),
        months_sidebar(months)
    );
    layout(config, None, &body, admin)
}

/// Posts whose tags contain `tag`
pub fn tagged_page(
    config: &BlogConfig,
    renderer: &Renderer,
    posts: &Paginated<Post>,
    tag: &str,
    admin: bool,
) -> String {
    let entries: String = posts
        .items
        .iter()
        .map(|post| post_summary(renderer, post))
        .collect();
    let body = format!(
        r#"<h2>Posts tagged &ldquo;{}&rdquo;</h2>{}{}"#,
        html_escape(tag),
        entries,
        paginate(posts, Some(tag))
    );
    layout(config, Some(tag), &body, admin)
}

/// Compact list of posts: title and date only
pub fn archive_page(config: &BlogConfig, posts: &[Post], admin: bool) -> String {
    let items: String = posts
        .iter()
        .map(|post| {
            format!(
                r#"<li{}>{} &mdash; <a href="{}">{}</a></li>"#,
                if post.is_deleted() { r#" class="deleted""# } else { "" },
                post.created_at
                    .map(|date| date.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                post.url(),
                html_escape(&post.title)
            )
        })
        .collect();
    let body = format!(r#"<h2>Archive</h2><ul class="archive">{}</ul>"#, items);
    layout(config, Some("Archive"), &body, admin)
}

/// A single post with its full body
pub fn post_page(config: &BlogConfig, renderer: &Renderer, post: &Post, admin: bool) -> String {
    let edit = if admin {
        format!(r#" | <a href="{}edit">Edit</a>"#, post.url())
    } else {
        String::new()
    };
    let comments = match &config.disqus_shortname {
        Some(shortname) if !shortname.is_empty() => format!(
            r#"<div id="disqus_thread"></div>
<script>
var disqus_shortname = '{}';
var disqus_identifier = '{}';
(function() {{
  var dsq = document.createElement('script'); dsq.async = true;
  dsq.src = 'https://' + disqus_shortname + '.disqus.com/embed.js';
  document.body.appendChild(dsq);
}})();
</script>"#,
            html_escape(shortname),
            post.full_url(&config.url_base)
        ),
        _ => String::new(),
    };

    let body = format!(
        r#"<div class="post{deleted}">
<h2>{title}</h2>
<p class="meta">{date} | {tags}{edit}</p>
{content}
</div>
{comments}"#,
        deleted = if post.is_deleted() { " deleted" } else { "" },
        title = html_escape(&post.title),
        date = post.created_at.as_ref().map(time_tag).unwrap_or_default(),
        tags = post.linked_tags(),
        edit = edit,
        content = post.content_html(renderer),
        comments = comments,
    );
    layout(config, Some(&post.title), &body, admin)
}

/// Create/edit form; `action` is where the form posts to
pub fn edit_page(config: &BlogConfig, post: &Post, action: &str) -> String {
    let formats: String = Format::ALL
        .iter()
        .map(|format| {
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                format,
                if *format == post.format { " selected" } else { "" }
            )
        })
        .collect();
    let existing = if post.id.is_some() {
        r#"<p><label><input type="checkbox" name="change_slug" value="1"> Regenerate slug from title</label></p>
<p><label><input type="checkbox" name="delete_status" value="1"> Delete this post</label></p>"#
    } else {
        ""
    };

    let body = format!(
        r#"<form method="post" action="{action}">
<p><label>Title<br><input type="text" name="title" value="{title}"></label></p>
<p><label>Tags<br><input type="text" name="tags" value="{tags}"></label></p>
<p><label>Format <select name="format">{formats}</select></label></p>
<p><textarea name="content">{content}</textarea></p>
{existing}
<p><input type="submit" value="Save"></p>
</form>"#,
        action = html_escape(action),
        title = html_escape(&post.title),
        tags = html_escape(&post.tags),
        formats = formats,
        content = html_escape(post.content()),
        existing = existing,
    );
    let title = if post.id.is_some() { "Edit post" } else { "New post" };
    layout(config, Some(title), &body, true)
}

/// Admin login form
pub fn auth_page(config: &BlogConfig, error: bool) -> String {
    let error = if error {
        r#"<p class="error">Wrong password.</p>"#
    } else {
        ""
    };
    let body = format!(
        r#"{}<form method="post" action="/auth">
<p><label>Password <input type="password" name="password"></label></p>
<p><input type="submit" value="Log in"></p>
</form>"#,
        error
    );
    layout(config, Some("Log in"), &body, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn post(slug: &str, content: &str) -> Post {
        let mut post = Post::new("A <Title>", content, "rust web", Format::Txt);
        post.id = Some(1);
        post.slug = slug.to_string();
        post.created_at = DateTime::parse_from_rfc3339("2024-02-03T04:05:06+00:00").ok();
        post
    }

    #[test]
    fn test_paginate_single_page_is_empty() {
        let posts = Paginated::new(vec![post("a", "x")], 1, 10, 1);
        assert_eq!(paginate(&posts, None), "");
    }

    #[test]
    fn test_paginate_links() {
        let posts = Paginated::new(vec![post("a", "x")], 2, 1, 3);
        let html = paginate(&posts, Some("rust"));
        assert!(html.contains(r#"href="/tags/rust/page/1""#));
        assert!(html.contains(r#"href="/tags/rust/page/3""#));

        let first = Paginated::new(vec![post("a", "x")], 1, 1, 3);
        let html = paginate(&first, None);
        assert!(!html.contains("Previous"));
        assert!(html.contains(r#"href="/page/2""#));
    }

    #[test]
    fn test_paginate_encodes_tag() {
        let posts = Paginated::new(vec![post("a", "x")], 1, 1, 2);
        let html = paginate(&posts, Some("c#"));
        assert!(html.contains(r#"href="/tags/c%23/page/2""#));
    }

    #[test]
    fn test_index_shows_summary_and_more_link() {
        let config = BlogConfig::default();
        let renderer = Renderer::default();
        let long = format!("{}\nthe rest", "a".repeat(220));
        let posts = Paginated::new(vec![post("long", &long)], 1, 10, 1);
        let months = [MonthBucket { year: 2024, month: 2 }];

        let html = index_page(&config, &renderer, &posts, &months, false);
        assert!(html.contains("A &lt;Title&gt;"));
        assert!(html.contains("Continue reading"));
        assert!(!html.contains("the rest"));
        assert!(html.contains(r#"<a href="/2024/02">2024-02</a>"#));
        assert!(html.contains(r#"href="/auth""#));
    }

    #[test]
    fn test_post_page_admin_edit_link() {
        let config = BlogConfig::default();
        let renderer = Renderer::default();
        let html = post_page(&config, &renderer, &post("slug", "body"), true);
        assert!(html.contains(r#"href="/2024/02/03/slug/edit""#));
        assert!(html.contains("<p>body</p>"));
        assert!(!html.contains("disqus_thread"));
    }

    #[test]
    fn test_edit_page_selects_format() {
        let config = BlogConfig::default();
        let mut existing = post("slug", "</textarea>");
        existing.format = Format::Markdown;
        let html = edit_page(&config, &existing, &existing.url());
        assert!(html.contains(r#"<option value="markdown" selected>"#));
        assert!(html.contains("&lt;/textarea&gt;"));
        assert!(html.contains("change_slug"));

        let fresh = edit_page(&config, &Post::default(), "/posts");
        assert!(!fresh.contains("delete_status"));
    }
}
