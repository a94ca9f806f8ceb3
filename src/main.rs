use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use roombook::config::AppConfig;
use roombook::db;
use roombook::handlers;
use roombook::services::mail::SmtpMailer;
use roombook::services::token::TokenService;
use roombook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("failed to open log file {}", config.log_file))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stdout.and(Mutex::new(log_file)))
        .with_ansi(false)
        .init();

    let conn = db::init_db(&config.database_url)?;

    let tokens = TokenService::new(
        &config.token_issuer,
        &config.token_secret,
        config.token_lifetime_hours,
    );
    let mailer = SmtpMailer::new(
        &config.email_server,
        config.email_port,
        &config.email_from,
        &config.email_password,
    )?;
    tracing::info!(server = %config.email_server, port = config.email_port, "using SMTP relay");

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        tokens,
        mailer: Box::new(mailer),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
