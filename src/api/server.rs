//! HTTP server implementation for the API

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::models::{ApiError, PageQuery, SearchQuery};
use super::{handlers, AppState};
use crate::upload::UploadRequest;

type ApiResult = std::result::Result<Json<Value>, ApiError>;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(index_handler))
        .route("/categories/:kind", get(categories_handler))
        .route("/categories/:kind/:id", get(category_videos_handler))
        .route("/tags/search", get(search_handler))
        .route("/tags/:id", get(tag_videos_handler))
        .route("/videos/:id", get(video_detail_handler))
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(middleware::from_fn_with_state(Arc::clone(&state), check_host))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: Arc<AppState>, address: &str) -> anyhow::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("🌐 API server listening on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> ApiResult {
    Ok(Json(handlers::health_check().await?))
}

async fn index_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    Ok(Json(handlers::index(&state).await?))
}

async fn categories_handler(State(state): State<Arc<AppState>>, Path(kind): Path<String>) -> ApiResult {
    Ok(Json(handlers::list_categories(&state, &kind).await?))
}

async fn category_videos_handler(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> ApiResult {
    Ok(Json(
        handlers::category_videos(&state, &kind, &id, query.page.as_deref()).await?,
    ))
}

async fn search_handler(State(state): State<Arc<AppState>>, Query(query): Query<SearchQuery>) -> ApiResult {
    Ok(Json(
        handlers::search_tags(&state, &query.q, query.page.as_deref()).await?,
    ))
}

async fn tag_videos_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult {
    Ok(Json(handlers::tag_videos(&state, &id, query.page.as_deref()).await?))
}

async fn video_detail_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    Ok(Json(handlers::video_detail(&state, &id).await?))
}

/// Staff-only multipart upload
async fn upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult {
    authorize_staff(&state, &headers)?;
    let request = read_upload_form(multipart).await?;
    Ok(Json(handlers::upload_video(&state, request).await?))
}

fn authorize_staff(state: &AppState, headers: &HeaderMap) -> std::result::Result<(), ApiError> {
    let expected = state
        .config
        .server
        .staff_token
        .as_deref()
        .ok_or(ApiError::Unauthorized)?;

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match provided {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Fields: `file`, `title`, `guard`, `position`, `technique`, `tags`
/// (comma separated or repeated).
async fn read_upload_form(mut multipart: Multipart) -> std::result::Result<UploadRequest, ApiError> {
    let bad_form = |e: axum::extract::multipart::MultipartError| ApiError::BadRequest(format!("Invalid upload form: {}", e));

    let mut request = UploadRequest::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                request.filename = field.file_name().unwrap_or_default().to_string();
                request.bytes = field.bytes().await.map_err(bad_form)?.to_vec();
                has_file = true;
            }
            "title" => request.title = field.text().await.map_err(bad_form)?,
            "guard" | "position" | "technique" => {
                let value = field.text().await.map_err(bad_form)?;
                let id = parse_optional_id(&name, &value)?;
                match name.as_str() {
                    "guard" => request.guard_id = id,
                    "position" => request.position_id = id,
                    _ => request.technique_id = id,
                }
            }
            "tags" => {
                let value = field.text().await.map_err(bad_form)?;
                request.tags.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from),
                );
            }
            other => warn!("Ignoring upload field {}", other),
        }
    }

    if !has_file || request.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("A video file is required".to_string()));
    }
    Ok(request)
}

fn parse_optional_id(field: &str, value: &str) -> std::result::Result<Option<i64>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("{} must be an id, got {:?}", field, value)))
}

/// Reject requests whose `Host` is not in `allowed_hosts`.
///
/// An empty list or `*` allows every host; `.example.com` allows the domain
/// and its subdomains.
async fn check_host(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let allowed = &state.config.server.allowed_hosts;
    if allowed.is_empty() || allowed.iter().any(|h| h == "*") {
        return next.run(request).await;
    }

    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(strip_port)
        .unwrap_or_default()
        .to_lowercase();

    if allowed.iter().any(|pattern| host_matches(&host, pattern)) {
        next.run(request).await
    } else {
        warn!("Rejected request for host {:?}", host);
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": format!("Invalid host: {}", host) })),
        )
            .into_response()
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.split_once(']').map(|(h, _)| &host[..h.len() + 1]).unwrap_or(host);
    }
    host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host)
}

fn host_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    match pattern.strip_prefix('.') {
        Some(domain) => host == domain || host.ends_with(&pattern),
        None => host == pattern,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matching() {
        assert!(host_matches("jiujitsuteria.com", "jiujitsuteria.com"));
        assert!(host_matches("www.jiujitsuteria.com", ".jiujitsuteria.com"));
        assert!(host_matches("jiujitsuteria.com", ".jiujitsuteria.com"));
        assert!(!host_matches("evil.com", ".jiujitsuteria.com"));
        assert!(!host_matches("notjiujitsuteria.com", ".jiujitsuteria.com"));
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("localhost:8000"), "localhost");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8000"), "[::1]");
    }

    #[test]
    fn test_optional_ids() {
        assert_eq!(parse_optional_id("guard", "").unwrap(), None);
        assert_eq!(parse_optional_id("guard", " 7 ").unwrap(), Some(7));
        assert!(parse_optional_id("guard", "closed").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"staff-secret", b"staff-secret"));
        assert!(!constant_time_eq(b"staff-secret", b"staff-secreT"));
        assert!(!constant_time_eq(b"staff", b"staff-secret"));
        assert!(!constant_time_eq(b"", b"staff-secret"));
    }

    #[tokio::test]
    async fn test_authorize_staff() {
        let config = crate::ConfigBuilder::new().with_staff_token("staff-secret").build();
        let db = crate::Database::in_memory().await.unwrap();
        let state = AppState::new(Arc::new(config), db, crate::Storage::in_memory(), None);

        let bearer = |value: &str| {
            let mut headers = HeaderMap::new();
            headers.insert(header::AUTHORIZATION, value.parse().unwrap());
            headers
        };

        assert!(authorize_staff(&state, &bearer("Bearer staff-secret")).is_ok());
        assert!(authorize_staff(&state, &bearer("Bearer staff-secre")).is_err());
        assert!(authorize_staff(&state, &bearer("staff-secret")).is_err());
        assert!(authorize_staff(&state, &HeaderMap::new()).is_err());
    }
}
