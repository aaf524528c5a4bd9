//! Tests for the catalog database (in-memory SQLite).

use super::*;
use crate::search::MatchMode;
use bjj_core::CategoryKind;

fn url(name: &str) -> String {
    format!("https://videos.example.net/{}.mp4", name)
}

async fn video(db: &Database, name: &str, tags: &[&str]) -> i64 {
    let id = db.upsert_video(&NewVideo::new(name, url(name))).await.unwrap().id;
    let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    db.set_video_tags(id, &tags).await.unwrap();
    id
}

#[tokio::test]
async fn upsert_is_keyed_by_url() {
    let db = Database::in_memory().await.unwrap();

    let first = db
        .upsert_video(&NewVideo::new("Armbar", url("armbar")).with_thumbnail(Some("https://t/armbar.jpg".into())))
        .await
        .unwrap();
    assert_eq!(first.outcome, UpsertOutcome::Created);

    let second = db
        .upsert_video(&NewVideo::new("Armbar From Guard", url("armbar")))
        .await
        .unwrap();
    assert_eq!(second.outcome, UpsertOutcome::Updated);
    assert_eq!(second.id, first.id);

    let videos = db.list_videos().await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].title, "Armbar From Guard");
    // absent optional values never clear stored ones
    assert_eq!(videos[0].thumbnail_url.as_deref(), Some("https://t/armbar.jpg"));
    assert!(videos[0].updated_at >= videos[0].created_at);
}

#[tokio::test]
async fn upsert_keeps_category_when_new_value_missing() {
    let db = Database::in_memory().await.unwrap();
    let guard = db.get_or_create_category(CategoryKind::Guard, "Closed Guard").await.unwrap();

    db.upsert_video(&NewVideo::new("Armbar", url("armbar")).with_category(&guard))
        .await
        .unwrap();
    db.upsert_video(&NewVideo::new("Armbar", url("armbar"))).await.unwrap();

    let stored = db.find_video_by_url(&url("armbar")).await.unwrap().unwrap();
    assert_eq!(stored.guard_id, Some(guard.id()));
}

#[tokio::test]
async fn category_get_or_create_reuses_rows() {
    let db = Database::in_memory().await.unwrap();
    let a = db.get_or_create_category(CategoryKind::Position, "Mount").await.unwrap();
    let b = db.get_or_create_category(CategoryKind::Position, " Mount ").await.unwrap();
    let c = db.get_or_create_category(CategoryKind::Technique, "Mount").await.unwrap();

    assert_eq!(a, b);
    assert_eq!(c.kind(), CategoryKind::Technique);
    assert_eq!(db.list_categories(CategoryKind::Position).await.unwrap().len(), 1);
    assert!(db.get_or_create_category(CategoryKind::Guard, "  ").await.is_err());
}

#[tokio::test]
async fn position_filter_returns_exactly_its_videos() {
    let db = Database::in_memory().await.unwrap();
    let mount = db.create_category(CategoryKind::Position, "Mount").await.unwrap();
    let side = db.create_category(CategoryKind::Position, "Side Control").await.unwrap();

    let mut expected = Vec::new();
    for name in ["a", "b", "c"] {
        let id = db
            .upsert_video(&NewVideo::new(name, url(name)).with_category(&mount))
            .await
            .unwrap()
            .id;
        expected.push(id);
    }
    db.upsert_video(&NewVideo::new("d", url("d")).with_category(&side))
        .await
        .unwrap();
    db.upsert_video(&NewVideo::new("e", url("e"))).await.unwrap();

    let page = db
        .videos_page(&VideoFilter::Category(CategoryKind::Position, mount.id()), None, 12)
        .await
        .unwrap();
    let mut ids: Vec<i64> = page.items.iter().map(|v| v.id).collect();
    ids.sort();
    assert_eq!(ids, expected);
    assert_eq!(page.total, 3);

    let counts = db.list_categories_with_counts(CategoryKind::Position).await.unwrap();
    assert_eq!(
        counts.iter().map(|c| (c.name.as_str(), c.video_count)).collect::<Vec<_>>(),
        vec![("Mount", 3), ("Side Control", 1)]
    );
}

#[tokio::test]
async fn deleting_category_nulls_video_reference() {
    let db = Database::in_memory().await.unwrap();
    let guard = db.create_category(CategoryKind::Guard, "Half Guard").await.unwrap();
    let id = db
        .upsert_video(&NewVideo::new("Sweep", url("sweep")).with_category(&guard))
        .await
        .unwrap()
        .id;

    assert!(db.delete_category(CategoryKind::Guard, guard.id()).await.unwrap());

    let video = db.get_video(id).await.unwrap().unwrap();
    assert_eq!(video.guard_id, None);
}

#[tokio::test]
async fn deleting_video_removes_tag_links() {
    let db = Database::in_memory().await.unwrap();
    let id = video(&db, "kimura", &["kimura", "gi"]).await;
    let other = video(&db, "americana", &["gi"]).await;

    assert!(db.delete_video(id).await.unwrap());

    let gi = db.get_or_create_tag("gi").await.unwrap();
    let page = db.videos_page(&VideoFilter::Tag(gi.id), None, 12).await.unwrap();
    assert_eq!(page.items.iter().map(|v| v.id).collect::<Vec<_>>(), vec![other]);
    assert_eq!(db.list_tags().await.unwrap().len(), 2);
}

#[tokio::test]
async fn tags_are_unique_and_replaceable() {
    let db = Database::in_memory().await.unwrap();
    let first = db.get_or_create_tag("armbar").await.unwrap();
    let again = db.get_or_create_tag("armbar").await.unwrap();
    assert_eq!(first, again);

    let id = video(&db, "clip", &["armbar", "armbar", "gi"]).await;
    assert_eq!(db.tags_for_video(id).await.unwrap().len(), 2);

    db.set_video_tags(id, &["no gi".to_string()]).await.unwrap();
    let names: Vec<String> = db.tags_for_video(id).await.unwrap().into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["no gi"]);

    db.add_video_tags(id, &["armbar".to_string(), "no gi".to_string()]).await.unwrap();
    assert_eq!(db.tags_for_video(id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn tag_name_filter_all_and_any() {
    let db = Database::in_memory().await.unwrap();
    let both = video(&db, "both", &["no gi", "armbar"]).await;
    let armbar_only = video(&db, "armbar_only", &["armbar"]).await;
    video(&db, "neither", &["kimura"]).await;

    let names = vec!["no gi".to_string(), "armbar".to_string()];

    let all = db
        .videos_page(&VideoFilter::tag_names(&names, MatchMode::All), None, 12)
        .await
        .unwrap();
    assert_eq!(all.items.iter().map(|v| v.id).collect::<Vec<_>>(), vec![both]);

    let any = db
        .videos_page(&VideoFilter::tag_names(&names, MatchMode::Any), None, 12)
        .await
        .unwrap();
    assert_eq!(any.items.iter().map(|v| v.id).collect::<Vec<_>>(), vec![armbar_only, both]);

    let none = db
        .videos_page(&VideoFilter::tag_names(&[], MatchMode::Any), None, 12)
        .await
        .unwrap();
    assert!(none.items.is_empty());
}

#[tokio::test]
async fn pages_are_newest_first_and_clamped() {
    let db = Database::in_memory().await.unwrap();
    for i in 0..13 {
        video(&db, &format!("clip{:02}", i), &[]).await;
    }

    let first = db.videos_page(&VideoFilter::All, Some("1"), 12).await.unwrap();
    assert_eq!(first.items.len(), 12);
    assert_eq!(first.items[0].title, "clip12");
    assert!(first.has_next);

    let last = db.videos_page(&VideoFilter::All, Some("7"), 12).await.unwrap();
    assert_eq!(last.number, 2);
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].title, "clip00");

    let garbage = db.videos_page(&VideoFilter::All, Some("two"), 12).await.unwrap();
    assert_eq!(garbage.number, 1);
}

#[tokio::test]
async fn video_detail_resolves_relations() {
    let db = Database::in_memory().await.unwrap();
    let position = db.create_category(CategoryKind::Position, "Mount").await.unwrap();
    let technique = db.create_category(CategoryKind::Technique, "Armbar").await.unwrap();
    let id = db
        .upsert_video(
            &NewVideo::new("Armbar From Mount", url("mount_armbar"))
                .with_category(&position)
                .with_category(&technique),
        )
        .await
        .unwrap()
        .id;
    db.set_video_tags(id, &["armbar".to_string()]).await.unwrap();

    let detail = db.video_detail(id).await.unwrap();
    assert_eq!(detail.position, Some(position));
    assert_eq!(detail.technique, Some(technique));
    assert_eq!(detail.guard, None);
    assert_eq!(detail.tags.len(), 1);

    assert!(matches!(
        db.video_detail(id + 100).await,
        Err(crate::error::CatalogError::NotFound(_))
    ));
}

#[tokio::test]
async fn thumbnail_update_requires_existing_video() {
    let db = Database::in_memory().await.unwrap();
    let id = video(&db, "clip", &[]).await;

    db.update_thumbnail_url(id, "https://thumbs.example.net/clip.jpg").await.unwrap();
    assert_eq!(
        db.get_video(id).await.unwrap().unwrap().thumbnail_url.as_deref(),
        Some("https://thumbs.example.net/clip.jpg")
    );
    assert!(db.update_thumbnail_url(id + 1, "x").await.is_err());
}
