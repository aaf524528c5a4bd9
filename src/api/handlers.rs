//! API request handlers

use serde_json::{json, Value};
use std::str::FromStr;

use super::AppState;
use crate::db::VideoFilter;
use crate::error::{CatalogError, Result};
use crate::upload::{UploadRequest, Uploader};
use bjj_core::CategoryKind;

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(json!({
        "status": "healthy",
        "service": "jiujitsuteria",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Landing page data: every category list and every tag
pub async fn index(state: &AppState) -> Result<Value> {
    Ok(json!({
        "positions": state.db.list_categories(CategoryKind::Position).await?,
        "techniques": state.db.list_categories(CategoryKind::Technique).await?,
        "guards": state.db.list_categories(CategoryKind::Guard).await?,
        "tags": state.db.list_tags().await?,
    }))
}

/// Categories of one kind with their video counts
pub async fn list_categories(state: &AppState, kind: &str) -> Result<Value> {
    let kind = parse_kind(kind)?;
    let categories = state.db.list_categories_with_counts(kind).await?;
    Ok(json!({
        "kind": kind,
        "categories": categories,
    }))
}

/// Videos filed under one category
pub async fn category_videos(state: &AppState, kind: &str, id: &str, page: Option<&str>) -> Result<Value> {
    let kind = parse_kind(kind)?;
    let category = state.db.require_category(kind, parse_id(id, kind.as_str())?).await?;
    let videos = state
        .db
        .videos_page(
            &VideoFilter::Category(kind, category.id()),
            page,
            state.config.search.page_size,
        )
        .await?;

    Ok(json!({
        "category": category,
        "videos": videos,
    }))
}

/// Free-text tag search
pub async fn search_tags(state: &AppState, query: &str, page: Option<&str>) -> Result<Value> {
    let results = state.search.run(&state.db, query, page).await?;
    Ok(json!(results))
}

/// Videos carrying one tag
pub async fn tag_videos(state: &AppState, id: &str, page: Option<&str>) -> Result<Value> {
    let tag = state.db.require_tag(parse_id(id, "tag")?).await?;
    let videos = state
        .db
        .videos_page(&VideoFilter::Tag(tag.id), page, state.config.search.page_size)
        .await?;

    Ok(json!({
        "tag": tag,
        "videos": videos,
    }))
}

/// Video detail with a playback URL signed for this request
pub async fn video_detail(state: &AppState, id: &str) -> Result<Value> {
    let detail = state.db.video_detail(parse_id(id, "video")?).await?;
    let signer = state.signer().await?;
    let signed_url = signer.sign_resource_url(&detail.video.video_url, state.config.cdn.url_expiry_secs)?;

    let mut body = json!(detail);
    body["signed_url"] = json!(signed_url);
    Ok(body)
}

/// Store an uploaded clip and record it
pub async fn upload_video(state: &AppState, request: UploadRequest) -> Result<Value> {
    let uploader = Uploader::new(
        &state.config,
        state.db.clone(),
        state.storage.clone(),
        state.extractor.clone(),
    )?;
    let result = uploader.upload(request).await?;
    Ok(json!(result))
}

fn parse_kind(kind: &str) -> Result<CategoryKind> {
    CategoryKind::from_str(kind).map_err(|_| CatalogError::not_found(format!("category type {}", kind)))
}

/// Non-numeric ids can't match a row
fn parse_id(id: &str, what: &str) -> Result<i64> {
    id.parse::<i64>()
        .map_err(|_| CatalogError::not_found(format!("{} {}", what, id)))
}
