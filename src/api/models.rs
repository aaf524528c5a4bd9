//! API data models

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use tracing::{error, warn};

use crate::error::CatalogError;

/// `?page=` on listing endpoints; kept raw so bad values fall back to page 1
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<String>,
}

/// Error body `{"error": "..."}` with a status matching the failure
#[derive(Debug)]
pub enum ApiError {
    Catalog(CatalogError),
    Unauthorized,
    BadRequest(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Catalog(err) => match err {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                CatalogError::Upload(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Staff token required".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Catalog(err) => err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!("❌ {} {}", status, message);
        } else {
            warn!("{} {}", status, message);
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
