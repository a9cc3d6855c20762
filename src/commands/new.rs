//! Create a post from the command line

use anyhow::Result;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::content::Format;
use crate::repo::NewPost;
use crate::Blog;

/// Create a post whose body is read from `file`, or from stdin when absent
pub async fn create_post(
    blog: &Blog,
    title: &str,
    tags: &str,
    format: &str,
    file: Option<&Path>,
) -> Result<()> {
    let content = match file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            content
        }
    };

    let repo = blog.repository().await?;
    let post = repo
        .create(NewPost {
            title: title.to_string(),
            content,
            tags: tags.to_string(),
            format: Format::parse(format),
        })
        .await?;

    println!("Created: {}", post.full_url(&blog.config.url_base));

    Ok(())
}
