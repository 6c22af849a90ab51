use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use gridboard_backend::server::config::AppConfig;
use gridboard_backend::services::mailer_service::{MailerConfig, MailerService};
use gridboard_backend::web::{self, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about = "REST backend for the dashboard builder", long_about = None)]
struct Args {
    /// Override the listen port from the environment
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_logging() {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily("logs", "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info` unless RUST_LOG says otherwise.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    init_logging();
    dotenv().ok(); // Load .env file

    let config = match AppConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10);
    let db_pool: DatabaseConnection = Database::connect(opt).await?;

    let mailer = MailerConfig::from_env()
        .map(|mailer_config| Arc::new(MailerService::new(mailer_config, config.frontend_url.clone())));
    if mailer.is_none() {
        warn!("SMTP_HOST not set; password reset emails are disabled");
    }

    let port = args.port.unwrap_or(config.port);
    let app = web::create_router(AppState { db_pool, config, mailer });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
