use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use opticare_core::OptiCare;
use opticare_server::{router, AppState, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "opticare-server", version, about = "OptiCare practice management API")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = ServerConfig::load(self.config.as_deref())?;
        if let Some(database) = self.database {
            config.database_path = database;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        Ok(config.with_env())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let core = OptiCare::open(&config.database_path, config.repository_options())
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    info!("Opened database at {}", config.database_path.display());

    let app = router(AppState::new(core, config.ping_message.clone()));
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
