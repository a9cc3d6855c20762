//! quill: a minimal personal blog
//!
//! Posts are stored in SQLite, rendered from plain text, Markdown or Textile,
//! and served over HTTP with an Atom feed and a cookie-gated admin.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod repo;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// The blog application rooted at a directory
#[derive(Clone)]
pub struct Blog {
    /// Blog configuration
    pub config: config::BlogConfig,
    /// Base directory holding `config.yml`
    pub base_dir: std::path::PathBuf,
}

impl Blog {
    /// Load the blog rooted at `base_dir`
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config = config::BlogConfig::load_dir(&base_dir)?;

        Ok(Self { config, base_dir })
    }

    /// Database URL with a relative SQLite path resolved against `base_dir`
    pub fn database_url(&self) -> String {
        let url = &self.config.database_url;
        match url.strip_prefix("sqlite://") {
            Some(path) if !path.starts_with('/') && !path.starts_with(':') => {
                format!("sqlite://{}", self.base_dir.join(path).display())
            }
            _ => url.clone(),
        }
    }

    /// Connect to the configured database, creating the schema if needed
    pub async fn repository(&self) -> Result<repo::PostRepository> {
        let repo =
            repo::PostRepository::connect(&self.database_url(), self.config.timezone).await?;
        Ok(repo)
    }

    /// Everything the HTTP server needs to answer requests
    pub async fn state(&self) -> Result<server::AppState> {
        let repo = self.repository().await?;
        server::AppState::new(self.config.clone(), repo)
    }
}
