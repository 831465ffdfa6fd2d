//! Warden authentication server binary.
//!
//! `serve` runs the HTTP API. `create-client` and `grant-role` are one-shot
//! provisioning commands against the same database.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use warden_api::config::ApiConfig;
use warden_core::auth::client::register_client;
use warden_core::auth::flows;
use warden_core::models::PlatformType;
use warden_core::store::sweeper::spawn_sweeper;
use warden_core::store::{MemoryStore, PgStore, SharedStore};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "warden_server", about = "Warden authentication server")]
struct Args {
    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, global = true)]
    max_connections: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Port to listen on; the host part of `BIND_ADDR` is kept.
        #[arg(long)]
        port: Option<u16>,

        /// Use a process-local store instead of PostgreSQL. Nothing persists.
        #[arg(long, default_value_t = false)]
        memory: bool,
    },
    /// Register a client and print its id and app key. The key is shown once.
    CreateClient {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: Option<String>,

        /// `web`, or any other platform name for clients that must present
        /// their app key.
        #[arg(long, default_value = "web")]
        platform: String,
    },
    /// Grant a role to an existing user.
    GrantRole {
        /// User email.
        #[arg(long)]
        email: String,

        #[arg(long, default_value = "admin")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout only carries command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warden_api=debug,warden_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let mut config = ApiConfig::from_env();
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(max) = args.max_connections {
        config.max_connections = max;
    }

    match args.command {
        Command::Serve { port, memory } => {
            if let Some(port) = port {
                config.bind_addr = with_port(&config.bind_addr, port);
            }
            let store = if memory {
                warn!("using in-memory store; all data is lost on exit");
                Arc::new(MemoryStore::new()) as SharedStore
            } else {
                connect(&config).await?
            };
            serve(config, store).await
        }
        Command::CreateClient {
            name,
            description,
            platform,
        } => {
            let store = connect(&config).await?;
            let (client, app_key) = register_client(
                store.as_ref(),
                &name,
                description.as_deref(),
                PlatformType::from(platform),
            )
            .await?;
            println!(
                "{}",
                serde_json::json!({
                    "app_id": client.id,
                    "app_key": app_key,
                    "platform_type": client.platform_type,
                })
            );
            Ok(())
        }
        Command::GrantRole { email, role } => {
            let store = connect(&config).await?;
            let email = warden_core::models::user::normalize_email(&email);
            let user = store
                .find_user_by_email(&email)
                .await?
                .ok_or_else(|| format!("no user with email {email}"))?;
            let profile = flows::grant_role(store.as_ref(), user.id, &role).await?;
            println!("{}", serde_json::json!({"id": profile.id, "roles": profile.roles}));
            Ok(())
        }
    }
}

/// Connect to PostgreSQL and run migrations.
async fn connect(config: &ApiConfig) -> Result<SharedStore, Box<dyn std::error::Error>> {
    info!(
        max_connections = config.max_connections,
        "configuring connection pool"
    );
    let store = PgStore::connect(
        &config.database_url,
        config.max_connections,
        config.acquire_timeout(),
    )
    .await?;

    info!("running database migrations");
    warden_core::migrate::migrate(store.pool()).await?;

    Ok(Arc::new(store))
}

async fn serve(config: ApiConfig, store: SharedStore) -> Result<(), Box<dyn std::error::Error>> {
    let ct = CancellationToken::new();
    let sweeper = spawn_sweeper(store.clone(), config.sweep_interval(), ct.clone());

    let state = warden_api::AppState {
        store,
        settings: config.auth_settings(),
    };
    let app = warden_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    tokio::spawn({
        let ct = ct.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
            }
            ct.cancel();
        }
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(ct.clone().cancelled_owned())
        .await;

    ct.cancel();
    let _ = sweeper.await;

    result?;
    Ok(())
}

/// Replace the port of a `host:port` address.
fn with_port(bind_addr: &str, port: u16) -> String {
    let host = bind_addr
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_addr);
    format!("{host}:{port}")
}
