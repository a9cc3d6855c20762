//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::Blog;

const DEFAULT_CONFIG: &str = r#"# quill configuration

# Blog
title: My blog
subtitle: ''
author: Anonymous Coward
url_base: http://blog.example.com/
# disqus_shortname: myblog

# Admin
admin_password: change-me
admin_cookie_key: quill_admin
admin_cookie_value: change-me-too

# Listing
page_size: 10

# Offset such as +08:00 or a zone name such as Asia/Shanghai; empty is UTC
timezone: ''

# Storage, overridden by the DATABASE_URL environment variable
database_url: sqlite://blog.db?mode=rwc

# Code highlighting for Markdown posts
highlight:
  theme: base16-ocean.dark
  line_number: false
"#;

/// Write a default `config.yml` into `target_dir` and create the database
pub async fn init_blog(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("config.yml");
    if config_path.exists() {
        anyhow::bail!("File already exists: {:?}", config_path);
    }
    fs::write(&config_path, DEFAULT_CONFIG)?;
    tracing::info!("Wrote {:?}", config_path);

    let blog = Blog::new(target_dir)?;
    blog.repository().await?;
    tracing::info!("Created database at {}", blog.database_url());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlogConfig;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses() {
        let config: BlogConfig = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.admin_cookie_key, "quill_admin");
        assert!(config.disqus_shortname.is_none());
    }

    #[tokio::test]
    async fn test_init_refuses_existing_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "title: Mine\n").unwrap();

        assert!(init_blog(dir.path()).await.is_err());
        let kept = fs::read_to_string(dir.path().join("config.yml")).unwrap();
        assert_eq!(kept, "title: Mine\n");
    }
}
