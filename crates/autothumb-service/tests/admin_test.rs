//! Integration tests for bulk generation and regeneration.

mod helpers;

use bytes::Bytes;
use image::ImageFormat;

use autothumb_core::error::ErrorKind;
use autothumb_core::traits::storage::StorageProvider;
use autothumb_service::admin::{FieldStatus, RegenerationDriver, RunOptions, ThumbnailAdmin};
use autothumb_service::thumbnail::StoredFieldConfig;

use helpers::{FILL_CONFIG, FIT_CONFIG, TestApp, image_bytes, photo};

/// Ten records with sources; record #5 holds bytes that are not an image.
async fn ten_photos(app: &TestApp) {
    for id in 1..=10u64 {
        let path = format!("photos/{id}.jpg");
        let bytes = if id == 5 {
            Bytes::from_static(b"this is not a jpeg")
        } else {
            image_bytes(320, 240, ImageFormat::Jpeg)
        };
        app.put_source(&path, bytes).await;
        app.insert(id, Some(&path)).await;
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_going() {
    let app = TestApp::new(FIT_CONFIG).await;
    ten_photos(&app).await;
    // A record without a source is never selected.
    app.insert(11, None).await;

    let report = app.admin().generate(None, None, false, false).await.unwrap();

    assert_eq!(report.processed, 10);
    assert_eq!(report.regenerated, 9);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].record_id, "5");
    assert_eq!(report.errors[0].kind, ErrorKind::Decode);

    assert_eq!(app.load(4).await.file("thumbnail"), Some("thumbnails/4_4_thumbnail.jpg"));
    assert_eq!(app.load(5).await.file("thumbnail"), None);
    assert!(!app.exists("thumbnails/5_5_thumbnail.jpg").await);
}

#[tokio::test]
async fn test_driver_counts_successes_and_errors() {
    let app = TestApp::new(FIT_CONFIG).await;
    ten_photos(&app).await;

    let field = &app.saver.registry().fields_for(&photo())[0];
    let records = {
        let mut all = Vec::new();
        for id in 1..=10u64 {
            all.push(app.load(id).await);
        }
        all
    };

    let outcome = RegenerationDriver::new(&app.saver)
        .run(
            field,
            records,
            RunOptions {
                dry_run: false,
                force: true,
                only_missing: false,
            },
        )
        .await;

    assert_eq!(outcome.success_count, 9);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].record_id, "5");
}

#[tokio::test]
async fn test_dry_run_never_renders_or_writes() {
    let app = TestApp::new(FIT_CONFIG).await;
    ten_photos(&app).await;

    let report = app.admin().generate(None, None, false, true).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.processed, 10);
    assert_eq!(report.regenerated, 10);
    assert!(report.errors.is_empty());
    assert_eq!(app.render_calls(), 0);
    assert!(app.storage.list("thumbnails").await.unwrap().is_empty());
    assert_eq!(app.load(1).await.file("thumbnail"), None);
    assert!(
        app.ctx
            .cache
            .read_field_config(&photo(), "thumbnail")
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_generate_skips_existing_unless_forced() {
    let app = TestApp::new(FIT_CONFIG).await;
    for id in 1..=3u64 {
        let path = format!("photos/{id}.png");
        app.put_source(&path, image_bytes(64, 64, ImageFormat::Png)).await;
        app.insert(id, Some(&path)).await;
    }
    let admin = app.admin();

    let first = admin.generate(None, None, false, false).await.unwrap();
    assert_eq!(first.regenerated, 3);

    let again = admin.generate(None, None, false, false).await.unwrap();
    assert_eq!(again.processed, 3);
    assert_eq!(again.skipped, 3);
    assert_eq!(again.regenerated, 0);

    let forced = admin.generate(None, None, true, false).await.unwrap();
    assert_eq!(forced.regenerated, 3);
    assert_eq!(app.render_calls(), 6);
}

#[tokio::test]
async fn test_regenerate_skips_unchanged_fields() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/1.jpg", image_bytes(400, 100, ImageFormat::Jpeg))
        .await;
    app.insert(1, Some("photos/1.jpg")).await;

    // Nothing stored yet: the field counts as changed.
    let first = app
        .admin()
        .regenerate(None, None, false, false, false)
        .await
        .unwrap();
    assert_eq!(first.regenerated, 1);
    assert_eq!(
        app.ctx.cache.read_field_config(&photo(), "thumbnail").await,
        Some(StoredFieldConfig::from(
            app.saver.registry().fields_for(&photo())[0].config()
        ))
    );

    let second = app
        .admin()
        .regenerate(None, None, false, false, false)
        .await
        .unwrap();
    assert_eq!(second.processed, 0);
    assert_eq!(second.fields[0].status, FieldStatus::Unchanged);

    let forced = app
        .admin()
        .regenerate(None, None, true, false, false)
        .await
        .unwrap();
    assert_eq!(forced.regenerated, 1);
    assert_eq!(app.render_calls(), 2);
}

#[tokio::test]
async fn test_regenerate_after_mode_change() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/1.jpg", image_bytes(400, 100, ImageFormat::Jpeg))
        .await;
    app.insert(1, Some("photos/1.jpg")).await;
    app.admin()
        .regenerate(None, None, false, false, false)
        .await
        .unwrap();

    let fill_admin = ThumbnailAdmin::new(app.saver_for(FILL_CONFIG));
    let report = fill_admin
        .regenerate(Some("gallery.Photo"), Some("thumbnail"), false, false, false)
        .await
        .unwrap();

    assert_eq!(report.regenerated, 1);
    let thumb = app
        .storage
        .read_bytes("thumbnails/1_1_thumbnail.jpg")
        .await
        .unwrap();
    let img = image::load_from_memory(&thumb).unwrap();
    assert_eq!((img.width(), img.height()), (150, 150));
}

#[tokio::test]
async fn test_clear_cache() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/1.jpg", image_bytes(100, 100, ImageFormat::Jpeg))
        .await;
    app.insert(1, Some("photos/1.jpg")).await;
    let admin = app.admin();
    admin.generate(None, None, false, false).await.unwrap();

    // Dry run counts what the real run regenerates but leaves the cache alone.
    let dry = admin.regenerate(None, None, false, true, true).await.unwrap();
    assert_eq!(dry.cache_entries_cleared, 0);
    assert_eq!(dry.fields[0].status, FieldStatus::Processed);
    assert_eq!(dry.regenerated, 1);
    assert_eq!(app.render_calls(), 1);
    assert!(
        app.ctx
            .cache
            .read_field_config(&photo(), "thumbnail")
            .await
            .is_some()
    );

    // Field config plus one record entry.
    let report = admin.regenerate(None, None, false, false, true).await.unwrap();
    assert_eq!(report.cache_entries_cleared, 2);
    assert_eq!(report.regenerated, dry.regenerated);
}

#[tokio::test]
async fn test_filters() {
    let app = TestApp::new(FIT_CONFIG).await;
    app.put_source("photos/1.jpg", image_bytes(100, 100, ImageFormat::Jpeg))
        .await;
    app.insert(1, Some("photos/1.jpg")).await;
    let admin = app.admin();

    let other_model = admin
        .generate(Some("shop.Item"), None, false, false)
        .await
        .unwrap();
    assert_eq!(other_model.processed, 0);
    assert!(other_model.fields.is_empty());

    let other_field = admin
        .generate(Some("gallery.Photo"), Some("banner"), false, false)
        .await
        .unwrap();
    assert!(other_field.fields.is_empty());

    let bad_label = admin.generate(Some("Photo"), None, false, false).await;
    assert_eq!(bad_label.unwrap_err().kind, ErrorKind::Configuration);

    let empty = TestApp::new(FIT_CONFIG).await;
    let report = empty.admin().generate(None, None, false, false).await.unwrap();
    assert_eq!(report.fields[0].status, FieldStatus::NoRecords);
}
