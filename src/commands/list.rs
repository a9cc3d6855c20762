//! List blog content

use anyhow::Result;

use crate::Blog;

/// List blog content by type, including hidden posts
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let repo = blog.repository().await?;

    match content_type {
        "post" | "posts" => {
            let posts = repo.archive(false).await?;
            println!("Posts ({}):", posts.len());
            for post in posts {
                println!(
                    "  {} - {} [{}]{}",
                    post.created_at
                        .map(|date| date.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    post.title,
                    post.url(),
                    if post.is_deleted() { " (hidden)" } else { "" }
                );
            }
        }
        "tag" | "tags" => {
            let tags = repo.tag_counts(false).await?;
            println!("Tags ({}):", tags.len());
            for (tag, count) in tags {
                println!("  {} ({})", tag, count);
            }
        }
        "month" | "months" => {
            let months = repo.months_index(false).await?;
            println!("Months ({}):", months.len());
            for month in months {
                let posts = repo.posts_in_month(false, month.year, month.month).await?;
                println!("  {} ({}) /{}", month.label(), posts.len(), month.path());
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, tag, month",
                content_type
            );
        }
    }

    Ok(())
}
