pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod services;

pub use config::Config;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use db::Store;
use services::{AuthService, SeaOrmAuthService};

/// Vitrine - personal portfolio and blog server
#[derive(Parser)]
#[command(name = "vitrine")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    Serve,

    /// Create a default config file
    Init,

    /// Issue a one-time temporary password for the administrator
    ///
    /// Prints the plaintext secret once; it is valid for a single login or
    /// password change and replaces any previously issued one.
    ResetPassword,
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it alone.");
            }
            Ok(())
        }

        Commands::ResetPassword => cmd_reset_password(config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Vitrine v{} starting...", env!("CARGO_PKG_VERSION"));

    let port = config.server.port;
    let state = api::create_app_state(config).await?;
    let app = api::router(state).await?;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Web server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Error listening for shutdown: {e}");
            }
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Operator-side password reset: the same flow the API exposes, with the
/// temporary secret printed to the terminal instead of returned over HTTP.
async fn cmd_reset_password(config: Config) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    store.ensure_admin(&config.admin, &config.security).await?;

    let auth = SeaOrmAuthService::new(store, config.admin.clone(), config.security.clone());
    let temp = auth.reset_password(&config.admin.email).await?;

    println!("Temporary password for '{}': {}", config.admin.username, temp);
    println!("It is valid for one login or password change, then discarded.");

    Ok(())
}
