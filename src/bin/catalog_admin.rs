use anyhow::{Context, Result};
use bjj_core::{CloudFrontSigner, TagVocabulary};
use clap::{Parser, Subcommand};
use jiujitsuteria::{
    generate_thumbnails, sync_thumbnails, Config, Database, FfmpegFrameExtractor, ImportOptions, Importer, Storage,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bjj-catalog")]
#[command(about = "Catalog administration: migrations, bulk import and thumbnail jobs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the standard locations)
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upload and catalog every video under a folder
    Import {
        /// Folder laid out as `<Kind>/<Category_Name>/<file>`
        folder: PathBuf,
        /// Log what would happen without uploading or writing rows
        #[arg(long)]
        dry_run: bool,
        /// Only import files whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Skip thumbnail extraction
        #[arg(long)]
        no_thumbnails: bool,
    },
    /// Regenerate every thumbnail from the stored clips
    GenerateThumbnails,
    /// Point thumbnail URLs at the public bucket without touching storage
    SyncThumbnails {
        /// Only videos without a thumbnail
        #[arg(long)]
        only_missing: bool,
    },
    /// Print a signed URL for an object key
    Sign {
        /// Object key, e.g. `Guard/Closed_Guard/Armbar.mp4`
        key: String,
        /// Lifetime in seconds (defaults to cdn.url_expiry_secs)
        #[arg(long)]
        expires: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    match cli.command {
        Commands::Migrate => {
            Database::connect(&config.database).await?;
            info!("✅ Migrations applied to {}", config.database.url);
        }

        Commands::Import {
            folder,
            dry_run,
            prefix,
            no_thumbnails,
        } => {
            let mut options = ImportOptions::from_config(&config);
            options.dry_run = dry_run;
            if prefix.is_some() {
                options.prefix = prefix;
            }
            if no_thumbnails {
                options.thumbnails = false;
            }

            let vocabulary = match &config.import.vocabulary_file {
                Some(path) => TagVocabulary::from_file(path)
                    .with_context(|| format!("Failed to load vocabulary {}", path.display()))?,
                None => TagVocabulary::new(),
            };

            // a dry run never reads or writes the real database or buckets
            let (db, storage) = if dry_run {
                (Database::in_memory().await?, Storage::in_memory())
            } else {
                (Database::connect(&config.database).await?, Storage::from_config(&config).await?)
            };
            let extractor = Arc::new(FfmpegFrameExtractor::new(&config.import));

            let importer = Importer::new(&config, db, storage, extractor, vocabulary, options)?;
            let report = importer.run(&folder).await?;

            info!(
                "📊 {} files: {} created, {} updated, {} planned, {} uploaded, {} failed",
                report.total, report.created, report.updated, report.planned, report.uploaded, report.failed
            );
            for failure in report.failures() {
                error!(
                    "❌ {}: {}",
                    failure.path.display(),
                    failure.error_message.as_deref().unwrap_or("unknown error")
                );
            }
        }

        Commands::GenerateThumbnails => {
            let db = Database::connect(&config.database).await?;
            let storage = Storage::from_config(&config).await?;
            let extractor = FfmpegFrameExtractor::new(&config.import);

            let report = generate_thumbnails(
                &db,
                &storage,
                &extractor,
                config.cdn_domain()?,
                config.public_cdn_domain()?,
            )
            .await?;
            if report.failed > 0 {
                warn!("⚠️ {} of {} thumbnails failed", report.failed, report.total);
            }
        }

        Commands::SyncThumbnails { only_missing } => {
            let db = Database::connect(&config.database).await?;
            let report = sync_thumbnails(&db, config.cdn_domain()?, config.public_cdn_domain()?, only_missing).await?;
            info!("📊 {} updated, {} skipped, {} failed", report.updated, report.skipped, report.failed);
        }

        Commands::Sign { key, expires } => {
            let signer = CloudFrontSigner::from_key_file(
                config.cdn.domain.as_deref(),
                config.cdn.key_pair_id.as_deref(),
                config.cdn.private_key_file.as_deref(),
            )?;
            let url = signer.sign(&key, expires.unwrap_or(config.cdn.url_expiry_secs))?;
            println!("{}", url);
        }
    }

    Ok(())
}
