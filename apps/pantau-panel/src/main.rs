mod auth;
mod cli;
mod config;
mod error;
mod handlers;
mod services;
mod validator;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post, put};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::{SessionStore, UserStore};
use config::AppConfig;
use pantau_db::db::init_db;
use pantau_db::repositories::{DomainRepository, FileRepository, ReportRepository};
use services::export_service::ExportService;
use services::import_service::ImportService;
use services::probe_service::ProbeService;

/// Per-attempt network timeout for the reachability prober.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub config: AppConfig,
    pub domains: DomainRepository,
    pub reports: ReportRepository,
    pub files: FileRepository,
    pub users: Arc<UserStore>,
    pub sessions: Arc<SessionStore>,
    pub import: Arc<ImportService>,
    pub export: Arc<ExportService>,
    pub probe: Arc<ProbeService>,
}

#[derive(Parser)]
#[command(name = "pantau")]
#[command(about = "Pantau domain monitor control plane", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Administrative tools for the credential store
    Admin {
        #[command(subcommand)]
        subcommand: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Reset a user's password (creates the account when missing)
    ResetPassword { username: String, new_pass: String },
    /// Add a user account
    AddUser {
        username: String,
        password: String,
        #[arg(default_value = "user")]
        role: String,
    },
    /// Remove a user account
    RemoveUser { username: String },
    /// Show panel connection information
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        println!("Warning: failed to load .env file: {}", e);
    }

    let cli = Cli::parse();

    let file_appender = tracing_appender::rolling::never(".", "server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pantau=debug,axum=info,tower_http=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    let config = AppConfig::load();

    match cli.command {
        Commands::Serve => {
            let pool = init_db(&config.database_url).await?;
            tracing::info!("Database initialized at {}", config.database_url);
            run_server(pool, config).await?;
        }
        Commands::Admin { subcommand } => match subcommand {
            AdminCommands::ResetPassword { username, new_pass } => {
                cli::reset_password(&config.users_file, &username, &new_pass)?;
            }
            AdminCommands::AddUser {
                username,
                password,
                role,
            } => {
                cli::add_user(&config.users_file, &username, &password, &role)?;
            }
            AdminCommands::RemoveUser { username } => {
                cli::remove_user(&config.users_file, &username)?;
            }
            AdminCommands::Info => {
                cli::info(&config)?;
            }
        },
    }

    Ok(())
}

async fn run_server(pool: sqlx::SqlitePool, config: AppConfig) -> Result<()> {
    let domains = DomainRepository::new(pool.clone());
    let reports = ReportRepository::new(pool.clone());
    let files = FileRepository::new(pool.clone());

    let users = Arc::new(UserStore::load(&config.users_file)?);
    let sessions = Arc::new(SessionStore::default());
    let import = Arc::new(ImportService::new(
        domains.clone(),
        files.clone(),
        config.valid_brands(),
    ));
    let export = Arc::new(ExportService::new(domains.clone()));
    let probe = Arc::new(ProbeService::new(PROBE_TIMEOUT)?);

    let cors = build_cors(&config)?;
    let listen_port = config.listen_port;

    let state = AppState {
        pool,
        config,
        domains,
        reports,
        files,
        users,
        sessions,
        import,
        export,
        probe,
    };

    let app = axum::Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/api/submit-domain", post(handlers::domains::submit_domain))
        .route("/api/report", post(handlers::reports::receive_report))
        .route("/api/domains", get(handlers::domains::list_domains))
        .route(
            "/api/domains/{id}",
            put(handlers::domains::update_domain).delete(handlers::domains::delete_domain),
        )
        .route("/api/reports", get(handlers::reports::list_reports))
        .route("/api/dashboard/stats", get(handlers::dashboard::stats))
        .route(
            "/api/domain-check/{domain}",
            get(handlers::domains::check_domain),
        )
        .route("/api/import", post(handlers::files::import_file))
        .route("/api/files", get(handlers::files::list_files))
        .route("/api/export/domains.csv", get(handlers::domains::export_csv))
        .route("/api/export/domains.xlsx", get(handlers::domains::export_xlsx))
        .route("/api/export/template.csv", get(handlers::domains::template_csv))
        .route(
            "/api/export/template.xlsx",
            get(handlers::domains::template_xlsx),
        )
        .route("/api/charts/status", get(handlers::charts::status_chart))
        .route("/api/charts/brands", get(handlers::charts::brand_chart))
        .route("/api/charts/timeline", get(handlers::charts::timeline_chart))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .layer(cors)
        .layer(axum::extract::DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)) // 10MB limit
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], listen_port));
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_cors(config: &AppConfig) -> Result<CorsLayer> {
    let origins = config
        .allowed_origins
        .iter()
        .map(|o| o.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid origin in ALLOWED_ORIGINS")?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::collections::HashMap;

    pub fn test_config() -> AppConfig {
        let mut api_keys = HashMap::new();
        api_keys.insert("slot603".to_string(), "SLOT603-KEY".to_string());
        api_keys.insert("netpro".to_string(), "NETPRO-KEY".to_string());
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            listen_port: 0,
            api_keys,
            allowed_origins: Vec::new(),
            session_timeout: chrono::Duration::hours(4),
            users_file: String::new(),
        }
    }

    /// Fully wired state over an in-memory store and a throwaway users
    /// file. The TempDir must stay alive for the test's duration.
    pub async fn state_with_temp_store() -> (tempfile::TempDir, AppState) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        pantau_db::db::create_schema(&pool).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let config = test_config();

        let domains = DomainRepository::new(pool.clone());
        let reports = ReportRepository::new(pool.clone());
        let files = FileRepository::new(pool.clone());
        let users = Arc::new(UserStore::load(dir.path().join("users.json")).unwrap());
        let import = Arc::new(ImportService::new(
            domains.clone(),
            files.clone(),
            config.valid_brands(),
        ));
        let export = Arc::new(ExportService::new(domains.clone()));
        let probe = Arc::new(ProbeService::new(Duration::from_secs(1)).unwrap());

        let state = AppState {
            pool,
            config,
            domains,
            reports,
            files,
            users,
            sessions: Arc::new(SessionStore::default()),
            import,
            export,
            probe,
        };
        (dir, state)
    }
}
