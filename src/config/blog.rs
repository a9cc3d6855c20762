//! Blog configuration (config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::Timezone;

/// Default location of the SQLite database
pub const DEFAULT_DATABASE_URL: &str = "sqlite://blog.db?mode=rwc";

/// Main blog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub url_base: String,
    pub disqus_shortname: Option<String>,

    // Admin
    pub admin_password: String,
    pub admin_cookie_key: String,
    pub admin_cookie_value: String,

    // Listing
    pub page_size: usize,
    pub timezone: Timezone,

    // Storage
    pub database_url: String,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            title: "My blog".to_string(),
            subtitle: String::new(),
            author: "Anonymous Coward".to_string(),
            url_base: "http://blog.example.com/".to_string(),
            disqus_shortname: None,

            admin_password: "changeme".to_string(),
            admin_cookie_key: "quill_admin".to_string(),
            admin_cookie_value: "changeme-too".to_string(),

            page_size: 10,
            timezone: Timezone::default(),

            database_url: DEFAULT_DATABASE_URL.to_string(),

            highlight: HighlightConfig::default(),
        }
    }
}

impl BlogConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: BlogConfig = serde_yaml::from_str(&content)?;
        if config.page_size == 0 {
            anyhow::bail!("page_size must be greater than zero");
        }
        config.apply_env();
        Ok(config)
    }

    /// Load `config.yml` from a directory, falling back to defaults
    pub fn load_dir<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let path = base_dir.as_ref().join("config.yml");
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env();
            Ok(config)
        }
    }

    /// `DATABASE_URL` from the environment (or `.env`) wins over the file
    fn apply_env(&mut self) {
        dotenvy::dotenv().ok();
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database_url = url;
            }
        }
    }
}

/// Markdown code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}
