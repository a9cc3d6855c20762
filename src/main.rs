//! CLI entry point for quill

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "quill")]
#[command(version)]
#[command(about = "A minimal personal blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// Space separated tags (at least one)
        #[arg(short, long)]
        tags: String,

        /// Body format (txt, markdown, textile)
        #[arg(short, long, default_value = "txt")]
        format: String,

        /// Read the body from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Start the blog server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4567")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,
    },

    /// List blog information
    List {
        /// Type of content to list (post, tag, month)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug { "quill=debug,info" } else { "quill=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            quill::commands::init::init_blog(&target_dir).await?;
            println!("Initialized blog in {:?}", target_dir);
            println!("Edit config.yml to set the admin password before serving.");
        }

        Commands::New {
            title,
            tags,
            format,
            file,
        } => {
            let blog = quill::Blog::new(&base_dir)?;
            tracing::info!("Creating new post with title: {}", title);
            quill::commands::new::create_post(&blog, &title, &tags, &format, file.as_deref())
                .await?;
        }

        Commands::Server { port, ip } => {
            let blog = quill::Blog::new(&base_dir)?;
            let state = blog.state().await?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            quill::server::start(state, &ip, port).await?;
        }

        Commands::List { r#type } => {
            let blog = quill::Blog::new(&base_dir)?;
            quill::commands::list::run(&blog, &r#type).await?;
        }

        Commands::Version => {
            println!("quill version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
