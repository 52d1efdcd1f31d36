//! Career Champ CLI - a terminal client for the Career Champ backend.
//!
//! Restores the saved session on startup, then runs one command against the
//! backend: login/logout, job search, chatbot, resume upload, interview
//! practice, or `watch` to keep the session open until it expires.

mod cli;
mod commands;

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use careerchamp_core::Config;

use cli::{Cli, Commands};
use commands::Context;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr through a non-blocking writer so they never mix with
/// command output on stdout. Keep the returned guard alive until exit.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };
    // Flag beats environment beats config file
    let api_url = cli
        .api_url
        .clone()
        .unwrap_or_else(|| config.api_base_url());
    debug!(api = %api_url, backend = ?config.token_backend, "Config loaded");

    let ctx = Context::new(config, &api_url)?;

    let result = match cli.command {
        Commands::Login { email } => commands::login(&ctx, email).await,
        Commands::Register { username, email } => commands::register(&ctx, &username, &email).await,
        Commands::Logout => commands::logout(&ctx),
        Commands::Status { json } => commands::status(&ctx, json),
        Commands::Jobs { search } => commands::jobs(&ctx, search.as_deref()).await,
        Commands::Chat {
            message,
            session,
            new,
        } => commands::chat(&ctx, &message, session, new).await,
        Commands::ChatSummary { session_id } => commands::chat_summary(&ctx, &session_id).await,
        Commands::UploadResume { path } => commands::upload_resume(&ctx, &path).await,
        Commands::Interview {
            category,
            question,
            answer,
        } => commands::interview(category, question, answer),
        Commands::Ping => commands::ping(&ctx).await,
        Commands::Watch => commands::watch(&ctx).await,
    };

    ctx.session.dispose();
    result
}
