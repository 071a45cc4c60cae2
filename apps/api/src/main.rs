mod applications;
mod boards;
mod config;
mod crypto;
mod db;
mod documents;
mod errors;
mod generation;
mod jobs;
mod llm_client;
mod logging;
mod models;
mod parser;
mod resumes;
mod routes;
mod search;
mod settings;
mod state;
#[cfg(test)]
mod test_support;
mod workflow;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::boards::GreenhouseClient;
use crate::config::Config;
use crate::crypto::CredentialCipher;
use crate::db::create_pool;
use crate::documents::{DocumentGenerator, MarkdownToPdf};
use crate::llm_client::LiveProviders;
use crate::routes::build_router;
use crate::state::AppState;

/// Local job search and resume tailoring service.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Log verbosity; repeat for more (-d warn, -dd info, -ddd debug).
    #[arg(short = 'd', long = "debug", action = clap::ArgAction::Count)]
    debug: u8,

    /// Interface to bind; overrides HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind; overrides PORT.
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for the database and generated documents; overrides DATA_DIR.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }

    info!("Starting jobdesk v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(config.applications_dir()).with_context(|| {
        format!("Cannot create data directory {}", config.data_dir.display())
    })?;

    // SQLite with embedded migrations
    let db = create_pool(&config.database_url).await?;

    let providers = LiveProviders::new(config.claude_cli.clone(), config.ai_timeout)?;
    let converter = MarkdownToPdf::new(&config.pdf_converter, config.pdf_timeout);
    let boards = GreenhouseClient::new(
        &config.boards_api_base,
        config.board_partner_key.clone(),
        config.board_timeout,
    )?;
    info!(
        boards = config.default_boards.len(),
        submission = config.board_partner_key.is_some(),
        "Board client initialized"
    );

    let state = AppState {
        db,
        cipher: CredentialCipher::new(&config.secret_key),
        providers: Arc::new(providers),
        documents: DocumentGenerator::new(config.applications_dir(), Arc::new(converter)),
        boards: Arc::new(boards),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
