//! Integration tests for the save pipeline and the thumbnail field hooks.

mod helpers;

use std::sync::Arc;

use bytes::Bytes;
use image::ImageFormat;

use autothumb_core::error::ErrorKind;
use autothumb_core::traits::storage::StorageProvider;
use autothumb_core::types::record::ModelRecord;
use autothumb_service::thumbnail::{RecordSaver, RegenerateReason, ThumbnailOutcome};

use helpers::{FILL_CONFIG, FIT_CONFIG, FORCED_CONFIG, TestApp, image_bytes, photo};

fn new_photo(id: u64, image: &str) -> ModelRecord {
    ModelRecord::new(photo(), id).with_file("image", image)
}

#[tokio::test]
async fn test_save_generates_thumbnail() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(400, 100, ImageFormat::Jpeg))
        .await;

    let mut record = new_photo(1, "photos/a.jpg");
    let outcomes = app.saver.save(&mut record, None).await.unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].field, "thumbnail");
    assert_eq!(
        outcomes[0].outcome,
        ThumbnailOutcome::Regenerated {
            path: "thumbnails/a_1_thumbnail.jpg".into(),
            width: 150,
            height: 37,
            reason: RegenerateReason::MissingThumbnail,
        }
    );
    assert!(!record.is_generating_thumbnail());
    assert_eq!(record.file("thumbnail"), Some("thumbnails/a_1_thumbnail.jpg"));
    assert!(app.exists("thumbnails/a_1_thumbnail.jpg").await);

    let stored = app.load(1).await;
    assert_eq!(stored.file("thumbnail"), Some("thumbnails/a_1_thumbnail.jpg"));
    assert_eq!(app.render_calls(), 1);
}

#[tokio::test]
async fn test_second_save_is_skipped() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;

    let mut record = new_photo(1, "photos/a.jpg");
    app.saver.save(&mut record, None).await.unwrap();
    let outcomes = app.saver.save(&mut record, None).await.unwrap();

    assert_eq!(outcomes[0].outcome, ThumbnailOutcome::Skipped);
    assert_eq!(app.render_calls(), 1);
}

#[tokio::test]
async fn test_source_change_replaces_thumbnail() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;
    app.put_source("photos/b.png", image_bytes(100, 400, ImageFormat::Png))
        .await;

    let mut record = new_photo(1, "photos/a.jpg");
    app.saver.save(&mut record, None).await.unwrap();

    record.set_file("image", Some("photos/b.png".into()));
    let outcomes = app.saver.save(&mut record, None).await.unwrap();

    assert_eq!(
        outcomes[0].outcome,
        ThumbnailOutcome::Regenerated {
            path: "thumbnails/b_1_thumbnail.png".into(),
            width: 37,
            height: 150,
            reason: RegenerateReason::SourceChanged,
        }
    );
    assert!(app.exists("thumbnails/b_1_thumbnail.png").await);
    assert!(!app.exists("thumbnails/a_1_thumbnail.jpg").await);
}

#[tokio::test]
async fn test_overwritten_source_is_detected_by_size() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;
    let mut record = new_photo(1, "photos/a.jpg");
    app.saver.save(&mut record, None).await.unwrap();

    app.put_source("photos/a.jpg", image_bytes(640, 480, ImageFormat::Jpeg))
        .await;
    let outcomes = app.saver.save(&mut record, None).await.unwrap();

    match &outcomes[0].outcome {
        ThumbnailOutcome::Regenerated { reason, width, .. } => {
            assert_eq!(*reason, RegenerateReason::SourceChanged);
            assert_eq!(*width, 150);
        }
        other => panic!("expected regeneration, got {other:?}"),
    }
}

#[tokio::test]
async fn test_mode_change_regenerates_with_warm_cache() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(400, 100, ImageFormat::Jpeg))
        .await;
    let mut record = new_photo(1, "photos/a.jpg");
    app.saver.save(&mut record, None).await.unwrap();

    let fill = app.saver_for(FILL_CONFIG);
    let outcomes = fill.save(&mut record, None).await.unwrap();

    assert_eq!(
        outcomes[0].outcome,
        ThumbnailOutcome::Regenerated {
            path: "thumbnails/a_1_thumbnail.jpg".into(),
            width: 150,
            height: 150,
            reason: RegenerateReason::ConfigChanged,
        }
    );
    // Same path, so the file was replaced in place.
    assert!(app.exists("thumbnails/a_1_thumbnail.jpg").await);
    assert_eq!(app.render_calls(), 2);
}

#[tokio::test]
async fn test_force_regenerate_field() {
    let app = TestApp::new(FORCED_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;

    let mut record = new_photo(1, "photos/a.jpg");
    for _ in 0..3 {
        let outcomes = app.saver.save(&mut record, None).await.unwrap();
        assert!(matches!(
            outcomes[0].outcome,
            ThumbnailOutcome::Regenerated {
                reason: RegenerateReason::Forced,
                ..
            }
        ));
    }
    assert_eq!(app.render_calls(), 3);
}

#[tokio::test]
async fn test_clearing_source_deletes_thumbnail() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;
    let mut record = new_photo(1, "photos/a.jpg");
    app.saver.save(&mut record, None).await.unwrap();
    assert!(app.exists("thumbnails/a_1_thumbnail.jpg").await);

    record.set_file("image", None);
    let outcomes = app.saver.save(&mut record, None).await.unwrap();

    assert_eq!(outcomes[0].outcome, ThumbnailOutcome::NoSource);
    assert_eq!(record.file("thumbnail"), None);
    assert!(!app.exists("thumbnails/a_1_thumbnail.jpg").await);
    assert_eq!(app.load(1).await.file("thumbnail"), None);
}

#[tokio::test]
async fn test_failed_write_keeps_thumbnail() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;
    let mut record = new_photo(1, "photos/a.jpg");
    app.saver.save(&mut record, None).await.unwrap();

    record.set_file("image", None);
    app.flaky.fail_saves(true);
    let err = app.saver.save(&mut record, None).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Storage);
    assert_eq!(record.file("thumbnail"), Some("thumbnails/a_1_thumbnail.jpg"));
    assert!(app.exists("thumbnails/a_1_thumbnail.jpg").await);
    assert_eq!(
        app.load(1).await.file("thumbnail"),
        Some("thumbnails/a_1_thumbnail.jpg")
    );
    assert!(
        app.ctx
            .cache
            .read_entry(&photo(), &record.id, "thumbnail")
            .await
            .is_some()
    );

    app.flaky.fail_saves(false);
    app.saver.save(&mut record, None).await.unwrap();
    assert!(!app.exists("thumbnails/a_1_thumbnail.jpg").await);
    assert_eq!(app.load(1).await.file("thumbnail"), None);
}

#[tokio::test]
async fn test_same_source_name_on_different_records() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("u1/a.jpg", image_bytes(400, 100, ImageFormat::Jpeg))
        .await;
    app.put_source("u2/a.jpg", image_bytes(100, 400, ImageFormat::Jpeg))
        .await;
    app.put_source("u1/b.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;

    let mut first = new_photo(1, "u1/a.jpg");
    let mut second = new_photo(2, "u2/a.jpg");
    app.saver.save(&mut first, None).await.unwrap();
    app.saver.save(&mut second, None).await.unwrap();

    assert_eq!(first.file("thumbnail"), Some("thumbnails/a_1_thumbnail.jpg"));
    assert_eq!(second.file("thumbnail"), Some("thumbnails/a_2_thumbnail.jpg"));
    let bytes = app
        .storage
        .read_bytes("thumbnails/a_1_thumbnail.jpg")
        .await
        .unwrap();
    let thumb = image::load_from_memory(&bytes).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (150, 37));

    let outcomes = app.saver.save(&mut first, None).await.unwrap();
    assert_eq!(outcomes[0].outcome, ThumbnailOutcome::Skipped);

    first.set_file("image", Some("u1/b.jpg".into()));
    app.saver.save(&mut first, None).await.unwrap();
    assert!(!app.exists("thumbnails/a_1_thumbnail.jpg").await);
    assert!(app.exists("thumbnails/b_1_thumbnail.jpg").await);
    assert!(app.exists("thumbnails/a_2_thumbnail.jpg").await);
}

#[tokio::test]
async fn test_unowned_thumbnail_is_never_deleted() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;
    app.put_source("thumbnails/a_thumbnail.jpg", image_bytes(10, 10, ImageFormat::Jpeg))
        .await;
    app.put_source("thumbnails/a_2_thumbnail.jpg", image_bytes(10, 10, ImageFormat::Jpeg))
        .await;

    // Legacy name: replaced on the record, left in storage.
    let mut record =
        new_photo(1, "photos/a.jpg").with_file("thumbnail", "thumbnails/a_thumbnail.jpg");
    let outcomes = app.saver.save(&mut record, None).await.unwrap();
    assert!(matches!(
        outcomes[0].outcome,
        ThumbnailOutcome::Regenerated {
            reason: RegenerateReason::CacheMiss,
            ..
        }
    ));
    assert_eq!(record.file("thumbnail"), Some("thumbnails/a_1_thumbnail.jpg"));
    assert!(app.exists("thumbnails/a_thumbnail.jpg").await);

    // Another record's thumbnail: detached on clear, left in storage.
    let mut other =
        ModelRecord::new(photo(), 3u64).with_file("thumbnail", "thumbnails/a_2_thumbnail.jpg");
    let outcomes = app.saver.save(&mut other, None).await.unwrap();
    assert_eq!(outcomes[0].outcome, ThumbnailOutcome::NoSource);
    assert_eq!(other.file("thumbnail"), None);
    assert!(app.exists("thumbnails/a_2_thumbnail.jpg").await);
}

#[tokio::test]
async fn test_backend_checks() {
    let app = TestApp::new(FIT_CONFIG).await;
    assert!(app.ctx.check_backends().await.unwrap());

    let down = TestApp::with_cache(FIT_CONFIG, Arc::new(helpers::DownCache)).await;
    assert!(!down.ctx.check_backends().await.unwrap());

    tokio::fs::remove_dir_all(app.media_root()).await.unwrap();
    let err = app.ctx.check_backends().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Storage);
}

#[tokio::test]
async fn test_unavailable_cache_never_blocks_saves() {
    let app = TestApp::with_cache(FIT_CONFIG, Arc::new(helpers::DownCache)).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;

    let mut record = new_photo(1, "photos/a.jpg");
    app.saver.save(&mut record, None).await.unwrap();
    let outcomes = app.saver.save(&mut record, None).await.unwrap();

    // Without a cache every save with an existing thumbnail is a miss.
    assert!(matches!(
        outcomes[0].outcome,
        ThumbnailOutcome::Regenerated {
            reason: RegenerateReason::CacheMiss,
            ..
        }
    ));
    assert_eq!(app.render_calls(), 2);
}

#[tokio::test]
async fn test_bad_source_surfaces_decode_error() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/broken.jpg", Bytes::from_static(b"definitely not an image"))
        .await;

    let mut record = new_photo(1, "photos/broken.jpg");
    let err = app.saver.save(&mut record, None).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::Decode);
    assert!(!record.is_generating_thumbnail());
    assert_eq!(record.file("thumbnail"), None);
    assert!(app.storage.list("thumbnails").await.unwrap().is_empty());
    assert!(
        app.ctx
            .cache
            .read_entry(&photo(), &record.id, "thumbnail")
            .await
            .is_none()
    );
    // The record itself was persisted before the hook ran.
    assert_eq!(app.load(1).await.file("image"), Some("photos/broken.jpg"));
}

#[tokio::test]
async fn test_reentrant_save_is_ignored() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/a.jpg", image_bytes(300, 300, ImageFormat::Jpeg))
        .await;

    let mut record = new_photo(1, "photos/a.jpg");
    assert!(record.begin_thumbnail_generation());
    let outcomes = app.saver.save(&mut record, None).await.unwrap();

    assert_eq!(outcomes[0].outcome, ThumbnailOutcome::Reentrant);
    assert_eq!(app.render_calls(), 0);
    assert!(record.is_generating_thumbnail());
}

#[tokio::test]
async fn test_distinct_records_save_concurrently() {
    let app = TestApp::new(FIT_CONFIG).await;
    for id in 1..=4u64 {
        app.put_source(
            &format!("photos/{id}.jpg"),
            image_bytes(200 + id as u32, 100, ImageFormat::Jpeg),
        )
        .await;
    }

    let saves = (1..=4u64).map(|id| {
        let saver = app.saver.clone();
        tokio::spawn(async move {
            let mut record = new_photo(id, &format!("photos/{id}.jpg"));
            saver.save(&mut record, None).await.map(|_| record)
        })
    });
    for handle in saves {
        let record = handle.await.unwrap().unwrap();
        assert!(!record.is_generating_thumbnail());
        assert!(record.file("thumbnail").is_some());
    }
    assert_eq!(app.render_calls(), 4);
}
