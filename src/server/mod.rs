//! Blog HTTP server

mod auth;
mod error;
mod routes;

pub use auth::{Admin, AdminAuth, IsAdmin};
pub use error::Error;
pub use routes::router;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::BlogConfig;
use crate::content::Renderer;
use crate::repo::PostRepository;

/// Shared state handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BlogConfig>,
    pub repo: PostRepository,
    pub renderer: Arc<Renderer>,
    pub auth: Arc<AdminAuth>,
}

impl AppState {
    pub fn new(config: BlogConfig, repo: PostRepository) -> Result<Self> {
        let auth = AdminAuth::new(&config)
            .map_err(|e| anyhow::anyhow!("Failed to hash admin credentials: {}", e))?;
        let renderer = Renderer::new(&config.highlight);

        Ok(Self {
            config: Arc::new(config),
            repo,
            renderer: Arc::new(renderer),
            auth: Arc::new(auth),
        })
    }
}

/// Serve the blog until the process is stopped
pub async fn start(state: AppState, ip: &str, port: u16) -> Result<()> {
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}:{}", ip, port);
    println!("Blog running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;

    Ok(())
}
