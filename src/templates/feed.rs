//! Atom feed

use crate::config::BlogConfig;
use crate::content::{Post, Renderer};
use crate::helpers::{absolutize_urls, date_xml, escape_xml, strip_invalid_xml_chars};

/// Render posts (already newest first) as an Atom document
pub fn atom_feed(config: &BlogConfig, renderer: &Renderer, posts: &[Post]) -> String {
    let base_url = config.url_base.trim_end_matches('/');
    let updated = posts
        .first()
        .and_then(|post| post.created_at)
        .map(|date| date_xml(&date))
        .unwrap_or_else(|| date_xml(&config.timezone.now()));

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    feed.push('\n');
    feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    feed.push('\n');
    feed.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    if !config.subtitle.is_empty() {
        feed.push_str(&format!(
            "  <subtitle>{}</subtitle>\n",
            escape_xml(&config.subtitle)
        ));
    }
    feed.push_str(&format!("  <link href=\"{}/feed\" rel=\"self\"/>\n", base_url));
    feed.push_str(&format!("  <link href=\"{}/\"/>\n", base_url));
    feed.push_str(&format!("  <updated>{}</updated>\n", updated));
    feed.push_str(&format!("  <id>{}/</id>\n", base_url));
    feed.push_str(&format!(
        "  <author><name>{}</name></author>\n",
        escape_xml(&config.author)
    ));

    for post in posts {
        let url = post.full_url(&config.url_base);
        let date = post.created_at.map(|date| date_xml(&date)).unwrap_or_default();
        let content = absolutize_urls(&post.content_html(renderer), base_url);

        feed.push_str("  <entry>\n");
        feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&post.title)));
        feed.push_str(&format!("    <link href=\"{}\"/>\n", escape_xml(&url)));
        feed.push_str(&format!("    <id>{}</id>\n", escape_xml(&url)));
        feed.push_str(&format!("    <published>{}</published>\n", date));
        feed.push_str(&format!("    <updated>{}</updated>\n", date));
        feed.push_str(&format!(
            "    <content type=\"html\"><![CDATA[{}]]></content>\n",
            strip_invalid_xml_chars(&content).replace("]]>", "]]]]><![CDATA[>")
        ));
        feed.push_str("  </entry>\n");
    }

    feed.push_str("</feed>\n");
    feed
}
