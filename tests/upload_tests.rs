mod common;

use bjj_core::CategoryKind;
use common::{Buckets, FakeExtractor, THUMB_DOMAIN, VIDEO_DOMAIN};
use jiujitsuteria::db::UpsertOutcome;
use jiujitsuteria::{CatalogError, Database, UploadRequest, Uploader};
use std::sync::Arc;

fn request(filename: &str) -> UploadRequest {
    UploadRequest {
        title: "Armbar from closed guard".to_string(),
        filename: filename.to_string(),
        bytes: b"mp4 bytes".to_vec(),
        tags: vec!["armbar".to_string(), "gi".to_string()],
        ..UploadRequest::default()
    }
}

fn uploader(db: &Database, buckets: &Buckets, extractor: Option<Arc<FakeExtractor>>) -> Uploader {
    Uploader::new(
        &common::test_config(),
        db.clone(),
        buckets.storage(),
        extractor.map(|e| e as Arc<dyn jiujitsuteria::FrameExtractor>),
    )
    .unwrap()
}

#[tokio::test]
async fn guard_decides_the_folder() {
    let db = Database::in_memory().await.unwrap();
    let buckets = Buckets::new();
    let guard = db.create_category(CategoryKind::Guard, "Closed Guard").await.unwrap();
    let position = db.create_category(CategoryKind::Position, "Mount").await.unwrap();

    let mut upload = request("armbar final.mp4");
    upload.guard_id = Some(guard.id());
    upload.position_id = Some(position.id());

    let result = uploader(&db, &buckets, None).upload(upload).await.unwrap();

    assert_eq!(result.key, "Guard/Closed_Guard/armbar_final.mp4");
    assert_eq!(result.video_url, format!("https://{}/Guard/Closed_Guard/armbar_final.mp4", VIDEO_DOMAIN));
    assert_eq!(result.outcome, UpsertOutcome::Created);
    assert!(buckets.videos.get(&result.key).await.is_some());

    let detail = db.video_detail(result.video_id).await.unwrap();
    assert_eq!(detail.video.title, "Armbar from closed guard");
    assert_eq!(detail.guard.unwrap().id(), guard.id());
    assert_eq!(detail.position.unwrap().id(), position.id());
    assert!(detail.technique.is_none());
    let tags: Vec<&str> = detail.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["armbar", "gi"]);
}

#[tokio::test]
async fn position_then_technique_then_uncategorized() {
    let db = Database::in_memory().await.unwrap();
    let buckets = Buckets::new();
    let position = db.create_category(CategoryKind::Position, "Side Control").await.unwrap();
    let technique = db.create_category(CategoryKind::Technique, "Sweep").await.unwrap();

    let mut with_position = request("a.mp4");
    with_position.position_id = Some(position.id());
    with_position.technique_id = Some(technique.id());
    let result = uploader(&db, &buckets, None).upload(with_position).await.unwrap();
    assert_eq!(result.key, "Position/Side_Control/a.mp4");

    let mut with_technique = request("b.mp4");
    with_technique.technique_id = Some(technique.id());
    let result = uploader(&db, &buckets, None).upload(with_technique).await.unwrap();
    assert_eq!(result.key, "Technique/Sweep/b.mp4");

    let result = uploader(&db, &buckets, None).upload(request("c.mp4")).await.unwrap();
    assert_eq!(result.key, "Uncategorized/c.mp4");
}

#[tokio::test]
async fn unknown_category_id_is_not_found() {
    let db = Database::in_memory().await.unwrap();
    let buckets = Buckets::new();

    let mut upload = request("a.mp4");
    upload.guard_id = Some(42);
    let err = uploader(&db, &buckets, None).upload(upload).await.unwrap_err();

    assert!(matches!(err, CatalogError::NotFound(_)));
    assert!(buckets.videos.is_empty().await);
}

#[tokio::test]
async fn storage_failure_is_upload_error() {
    let db = Database::in_memory().await.unwrap();
    let buckets = Buckets::new();
    buckets.videos.reject_writes(true);

    let err = uploader(&db, &buckets, None).upload(request("a.mp4")).await.unwrap_err();

    assert!(matches!(err, CatalogError::Upload(_)));
    assert!(db.list_videos().await.unwrap().is_empty());
}

#[tokio::test]
async fn reupload_replaces_tags_and_keeps_one_row() {
    let db = Database::in_memory().await.unwrap();
    let buckets = Buckets::new();

    let first = uploader(&db, &buckets, None).upload(request("a.mp4")).await.unwrap();
    let mut again = request("a.mp4");
    again.title = String::new();
    again.tags = vec!["kimura".to_string()];
    let second = uploader(&db, &buckets, None).upload(again).await.unwrap();

    assert_eq!(second.video_id, first.video_id);
    assert_eq!(second.outcome, UpsertOutcome::Updated);
    let detail = db.video_detail(first.video_id).await.unwrap();
    // blank titles fall back to the file name
    assert_eq!(detail.video.title, "A");
    let tags: Vec<&str> = detail.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tags, vec!["kimura"]);
}

#[tokio::test]
async fn thumbnail_is_published_when_extractor_present() {
    let db = Database::in_memory().await.unwrap();
    let buckets = Buckets::new();
    let extractor = Arc::new(FakeExtractor::default());

    let result = uploader(&db, &buckets, Some(extractor.clone()))
        .upload(request("a.mp4"))
        .await
        .unwrap();

    assert_eq!(extractor.calls(), 1);
    assert_eq!(
        result.thumbnail_url.as_deref(),
        Some(format!("https://{}/Uncategorized/a.jpg", THUMB_DOMAIN).as_str())
    );
    let thumbnail = buckets.thumbnails.get("Uncategorized/a.jpg").await.unwrap();
    assert_eq!(thumbnail.options.content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let db = Database::in_memory().await.unwrap();
    let buckets = Buckets::new();
    let mut upload = request("a.mp4");
    upload.bytes.clear();

    let err = uploader(&db, &buckets, None).upload(upload).await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput(_)));
}
