use anyhow::Result;
use clap::{Arg, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jiujitsuteria::api::{ApiServer, AppState};
use jiujitsuteria::{Config, Database, FfmpegFrameExtractor, FrameExtractor, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Jiujitsuteria")
        .version(env!("CARGO_PKG_VERSION"))
        .author("TigreRoll")
        .about("BJJ video catalog API server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file (defaults to the standard locations)"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Address to listen on"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to listen on")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => Config::from_file(&PathBuf::from(path))?,
        None => Config::load()?,
    };
    if let Some(host) = matches.get_one::<String>("host") {
        config.server.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let level = if matches.get_flag("verbose") {
        "jiujitsuteria=debug,bjj_core=debug,tower_http=debug,info".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!("🚀 Jiujitsuteria starting...");
    config.validate()?;
    info!("{}", config.summary());

    let db = Database::connect(&config.database).await?;
    let storage = Storage::from_config(&config).await?;
    let extractor: Option<Arc<dyn FrameExtractor>> = if config.import.generate_thumbnails {
        Some(Arc::new(FfmpegFrameExtractor::new(&config.import)))
    } else {
        None
    };

    let state = AppState::new(Arc::new(config), db, storage, extractor);
    // surface key problems at startup; requests retry the load
    if let Err(e) = state.signer().await {
        warn!("⚠️ CloudFront signer unavailable: {}", e);
    }

    ApiServer::new(Arc::new(state)).start().await
}
