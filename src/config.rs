use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::{CatalogError, Result};
use crate::search::{EmptyMatch, MatchMode};

/// Configuration for the Jiujitsuteria catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Database connection settings
    pub database: DatabaseConfig,

    /// CloudFront distributions and signing key
    pub cdn: CdnConfig,

    /// Object storage buckets
    pub storage: StorageConfig,

    /// Tag search policy
    pub search: SearchConfig,

    /// Batch import and thumbnail settings
    pub import: ImportConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Host headers the server answers to (empty or `*` = any)
    pub allowed_hosts: Vec<String>,

    pub secret_key: Option<String>,

    pub debug: bool,

    /// Bearer token required by the upload endpoint
    pub staff_token: Option<String>,

    /// Largest accepted upload body in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL (`sqlite://catalog.db`, `sqlite::memory:`)
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CdnConfig {
    /// Signed distribution in front of the private video bucket
    pub domain: Option<String>,

    /// Unsigned distribution in front of the public thumbnail bucket
    pub public_domain: Option<String>,

    /// CloudFront public key id sent as `Key-Pair-Id`
    pub key_pair_id: Option<String>,

    /// PEM private key matching `key_pair_id`
    pub private_key_file: Option<PathBuf>,

    /// Lifetime of signed playback URLs in seconds
    pub url_expiry_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    /// In-process store, for local development
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub private_bucket: Option<String>,
    pub public_bucket: Option<String>,
    pub region: Option<String>,
    pub video_cache_control: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub match_mode: MatchMode,
    pub empty_match: EmptyMatch,
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Video file extensions picked up by the importer
    pub supported_extensions: Vec<String>,

    /// Only import files whose name starts with this prefix
    pub file_prefix: Option<String>,

    /// Extract and upload a thumbnail for every imported file
    pub generate_thumbnails: bool,

    /// Extra tag vocabulary file
    pub vocabulary_file: Option<PathBuf>,

    pub ffmpeg_path: String,

    /// Seek position of the thumbnail frame (`HH:MM:SS.mmm`)
    pub thumbnail_seek: String,

    /// Thumbnail width in pixels; height keeps the aspect ratio
    pub thumbnail_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Config {
    /// Load configuration from the first readable config file, then apply
    /// `.env` and environment overrides.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "jiujitsuteria.toml",
            "config/jiujitsuteria.toml",
            "/etc/jiujitsuteria/config.toml",
        ];

        let mut config = None;
        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(parsed) => {
                        info!("📄 Loaded configuration from: {}", path);
                        config = Some(parsed);
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        if dotenvy::dotenv().is_ok() {
            info!("📄 Loaded environment from .env");
        }

        Ok(config
            .unwrap_or_default()
            .with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Load a specific TOML file, then apply environment overrides
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str).map_err(|e| {
            CatalogError::Configuration(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        info!("📄 Loaded configuration from: {}", path.display());
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Blank values are ignored.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(hosts) = var("ALLOWED_HOSTS") {
            self.server.allowed_hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(secret) = var("SECRET_KEY") {
            self.server.secret_key = Some(secret);
        }
        if let Some(debug) = var("DEBUG") {
            self.server.debug = matches!(debug.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(token) = var("STAFF_TOKEN") {
            self.server.staff_token = Some(token);
        }

        if let Some(domain) = var("CLOUDFRONT_DOMAIN") {
            self.cdn.domain = Some(domain);
        }
        if let Some(domain) = var("CLOUDFRONT_PUBLIC_DOMAIN") {
            self.cdn.public_domain = Some(domain);
        }
        if let Some(key_id) = var("CLOUDFRONT_KEY_ID") {
            self.cdn.key_pair_id = Some(key_id);
        }
        if let Some(key_file) = var("CLOUDFRONT_KEY_FILE").or_else(|| var("CLOUDFRONT_PRIVATE_KEY_PATH")) {
            self.cdn.private_key_file = Some(PathBuf::from(key_file));
        }

        if let Some(bucket) = var("AWS_PRIVATE_VIDEO_BUCKET") {
            self.storage.private_bucket = Some(bucket);
        }
        if let Some(bucket) = var("AWS_PUBLIC_THUMBNAIL_BUCKET") {
            self.storage.public_bucket = Some(bucket);
        }
        if let Some(region) = var("AWS_S3_REGION_NAME") {
            self.storage.region = Some(region);
        }

        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }

        self.normalize();
        self
    }

    /// Strip schemes and trailing slashes from the CDN domains
    fn normalize(&mut self) {
        for domain in [&mut self.cdn.domain, &mut self.cdn.public_domain] {
            if let Some(value) = domain.take() {
                let normalized = bjj_core::signing::normalize_domain(&value);
                if !normalized.is_empty() {
                    *domain = Some(normalized);
                }
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| CatalogError::Configuration(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, config_str)?;
        info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    ///
    /// Signing settings are not required here; a missing key surfaces as a
    /// configuration error when a URL is first signed.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(CatalogError::Configuration("DATABASE_URL must be set".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(CatalogError::Configuration(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }
        if self.search.page_size == 0 {
            return Err(CatalogError::Configuration(
                "search.page_size must be greater than 0".to_string(),
            ));
        }
        if self.cdn.url_expiry_secs == 0 {
            return Err(CatalogError::Configuration(
                "cdn.url_expiry_secs must be greater than 0".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::S3 {
            if self.storage.private_bucket.is_none() {
                return Err(CatalogError::Configuration(
                    "AWS_PRIVATE_VIDEO_BUCKET must be set".to_string(),
                ));
            }
            if self.storage.public_bucket.is_none() {
                return Err(CatalogError::Configuration(
                    "AWS_PUBLIC_THUMBNAIL_BUCKET must be set".to_string(),
                ));
            }
        }

        if !self.server.debug && self.server.secret_key.is_none() {
            warn!("⚠️ SECRET_KEY is not set and DEBUG is off");
        }
        if self.server.staff_token.is_none() {
            warn!("⚠️ STAFF_TOKEN is not set, uploads are disabled");
        }

        info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Private bucket name, required by the S3 backend
    pub fn private_bucket(&self) -> Result<&str> {
        self.storage
            .private_bucket
            .as_deref()
            .ok_or_else(|| CatalogError::Configuration("AWS_PRIVATE_VIDEO_BUCKET must be set".to_string()))
    }

    /// Public bucket name, required by the S3 backend
    pub fn public_bucket(&self) -> Result<&str> {
        self.storage
            .public_bucket
            .as_deref()
            .ok_or_else(|| CatalogError::Configuration("AWS_PUBLIC_THUMBNAIL_BUCKET must be set".to_string()))
    }

    /// Signed CDN domain, needed for canonical video URLs
    pub fn cdn_domain(&self) -> Result<&str> {
        self.cdn
            .domain
            .as_deref()
            .ok_or_else(|| CatalogError::Configuration("CLOUDFRONT_DOMAIN must be set".to_string()))
    }

    /// Public CDN domain, needed for thumbnail URLs
    pub fn public_cdn_domain(&self) -> Result<&str> {
        self.cdn
            .public_domain
            .as_deref()
            .ok_or_else(|| CatalogError::Configuration("CLOUDFRONT_PUBLIC_DOMAIN must be set".to_string()))
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Jiujitsuteria Configuration:\n\
            - Listen: {}:{}\n\
            - Database: {}\n\
            - Storage: {:?} (videos: {}, thumbnails: {})\n\
            - CDN: {} (public: {})\n\
            - Signing key: {}\n\
            - Search: match {:?}, empty query returns {:?}\n\
            - Debug: {}",
            self.server.host,
            self.server.port,
            self.database.url,
            self.storage.backend,
            self.storage.private_bucket.as_deref().unwrap_or("<unset>"),
            self.storage.public_bucket.as_deref().unwrap_or("<unset>"),
            self.cdn.domain.as_deref().unwrap_or("<unset>"),
            self.cdn.public_domain.as_deref().unwrap_or("<unset>"),
            if self.cdn.key_pair_id.is_some() && self.cdn.private_key_file.is_some() {
                "configured"
            } else {
                "missing"
            },
            self.search.match_mode,
            self.search.empty_match,
            self.server.debug
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cdn: CdnConfig {
                url_expiry_secs: bjj_core::DEFAULT_EXPIRY_SECS,
                ..CdnConfig::default()
            },
            storage: StorageConfig::default(),
            search: SearchConfig::default(),
            import: ImportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_hosts: Vec::new(),
            secret_key: None,
            debug: false,
            staff_token: None,
            max_upload_bytes: 512 * 1024 * 1024, // 512MB
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://jiujitsuteria.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            private_bucket: None,
            public_bucket: None,
            region: None,
            video_cache_control: "max-age=31536000, public".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_mode: MatchMode::All,
            empty_match: EmptyMatch::AllVideos,
            page_size: 12,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            supported_extensions: vec!["mp4".to_string()],
            file_prefix: None,
            generate_thumbnails: true,
            vocabulary_file: None,
            ffmpeg_path: "ffmpeg".to_string(),
            thumbnail_seek: "00:00:01.000".to_string(),
            thumbnail_width: 320,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "jiujitsuteria=info,bjj_core=info,tower_http=info,warn".to_string(),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_database_url(mut self, url: &str) -> Self {
        self.config.database.url = url.to_string();
        self
    }

    pub fn with_cdn(mut self, domain: &str, public_domain: &str) -> Self {
        self.config.cdn.domain = Some(domain.to_string());
        self.config.cdn.public_domain = Some(public_domain.to_string());
        self
    }

    pub fn with_signing_key(mut self, key_pair_id: &str, private_key_file: PathBuf) -> Self {
        self.config.cdn.key_pair_id = Some(key_pair_id.to_string());
        self.config.cdn.private_key_file = Some(private_key_file);
        self
    }

    pub fn with_memory_storage(mut self) -> Self {
        self.config.storage.backend = StorageBackend::Memory;
        self
    }

    pub fn with_staff_token(mut self, token: &str) -> Self {
        self.config.server.staff_token = Some(token.to_string());
        self
    }

    pub fn with_match_mode(mut self, mode: MatchMode) -> Self {
        self.config.search.match_mode = mode;
        self
    }

    pub fn with_empty_match(mut self, empty_match: EmptyMatch) -> Self {
        self.config.search.empty_match = empty_match;
        self
    }

    pub fn with_thumbnails(mut self, enabled: bool) -> Self {
        self.config.import.generate_thumbnails = enabled;
        self
    }

    pub fn build(mut self) -> Config {
        self.config.normalize();
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.page_size, 12);
        assert_eq!(config.search.match_mode, MatchMode::All);
        assert_eq!(config.cdn.url_expiry_secs, 3600);
        assert_eq!(config.import.supported_extensions, vec!["mp4"]);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env_overrides(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("ALLOWED_HOSTS", "jiujitsuteria.com, www.jiujitsuteria.com,"),
            ("DEBUG", "True"),
            ("CLOUDFRONT_DOMAIN", "https://d111111abcdef8.cloudfront.net/"),
            ("CLOUDFRONT_KEY_ID", "K2JCJMDEHXQW5F"),
            ("CLOUDFRONT_PRIVATE_KEY_PATH", "/run/secrets/cloudfront.pem"),
            ("AWS_PRIVATE_VIDEO_BUCKET", "jiujitsuteria-videos"),
            ("LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.allowed_hosts, vec!["jiujitsuteria.com", "www.jiujitsuteria.com"]);
        assert!(config.server.debug);
        assert_eq!(config.cdn.domain.as_deref(), Some("d111111abcdef8.cloudfront.net"));
        assert_eq!(config.cdn.key_pair_id.as_deref(), Some("K2JCJMDEHXQW5F"));
        assert_eq!(
            config.cdn.private_key_file,
            Some(PathBuf::from("/run/secrets/cloudfront.pem"))
        );
        assert_eq!(config.storage.private_bucket.as_deref(), Some("jiujitsuteria-videos"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_key_file_takes_precedence_over_alias() {
        let config = Config::default().with_env_overrides(lookup(&[
            ("CLOUDFRONT_KEY_FILE", "/a.pem"),
            ("CLOUDFRONT_PRIVATE_KEY_PATH", "/b.pem"),
        ]));
        assert_eq!(config.cdn.private_key_file, Some(PathBuf::from("/a.pem")));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let config = Config::default().with_env_overrides(lookup(&[("CLOUDFRONT_KEY_ID", "   ")]));
        assert!(config.cdn.key_pair_id.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [search]
            match_mode = "any"
            empty_match = "no_videos"

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.search.match_mode, MatchMode::Any);
        assert_eq!(config.search.empty_match, EmptyMatch::NoVideos);
        assert_eq!(config.search.page_size, 12);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_err());

        let config = ConfigBuilder::new().with_memory_storage().build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_database_url("sqlite::memory:")
            .with_cdn("https://videos.example.net/", "thumbs.example.net")
            .with_match_mode(MatchMode::Any)
            .with_thumbnails(false)
            .build();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.cdn_domain().unwrap(), "videos.example.net");
        assert_eq!(config.public_cdn_domain().unwrap(), "thumbs.example.net");
        assert_eq!(config.search.match_mode, MatchMode::Any);
        assert!(!config.import.generate_thumbnails);
    }
}
