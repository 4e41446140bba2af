//! ragchat CLI entry point.

use anyhow::Result;
use clap::Parser;
use ragchat::cli::{commands, Cli, Commands};
use ragchat::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("ragchat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Ingest {
            path,
            chunk_size,
            chunk_overlap,
        } => {
            commands::run_ingest(path, *chunk_size, *chunk_overlap, settings).await?;
        }

        Commands::Ask {
            question,
            user,
            session,
            sources,
        } => {
            commands::run_ask(question, user.clone(), session.clone(), *sources, settings).await?;
        }

        Commands::Chat { user, session } => {
            commands::run_chat(user.clone(), session.clone(), settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::History { user, session, limit } => {
            commands::run_history(user, session, *limit, settings).await?;
        }

        Commands::Clear { user, session } => {
            commands::run_clear(user, session, settings).await?;
        }

        Commands::Status => {
            commands::run_status(&settings)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}
