use bjj_core::BJJCoreError;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error types for catalog operations
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Signing error: {0}")]
    Signing(String),

    /// Object storage rejected or failed a transfer
    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Thumbnail error: {0}")]
    Thumbnail(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        CatalogError::NotFound(what.to_string())
    }
}

impl From<BJJCoreError> for CatalogError {
    fn from(err: BJJCoreError) -> Self {
        match err {
            BJJCoreError::Configuration(msg) => CatalogError::Configuration(msg),
            BJJCoreError::Signing(msg) => CatalogError::Signing(msg),
            BJJCoreError::Verification(msg) => CatalogError::Signing(msg),
            BJJCoreError::InvalidInput(msg) => CatalogError::InvalidInput(msg),
            BJJCoreError::Io(e) => CatalogError::Io(e),
        }
    }
}
