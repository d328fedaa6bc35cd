mod helpers;

use helpers::{
    fake_mp4, request, setup_pipeline_with_broken_storage, setup_pipeline_with_read_only_records,
    setup_test_pipeline, FakeMediaTool, BASE_URL, MAX_UPLOAD_BYTES, STORE_ID,
};
use reelvault_core::{AspectClass, ErrorMetadata};
use reelvault_processing::{sign_video_record, IngestError, IngestStage, ValidationError};
use reelvault_storage::{DecodedLocator, PersistedLocator};
use uuid::Uuid;

/// Value of the `expires` query parameter of a signed URL.
fn expires_param(url: &str) -> i64 {
    let (_, query) = url.split_once('?').unwrap();
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("expires="))
        .unwrap()
        .parse()
        .unwrap()
}

#[tokio::test]
async fn test_landscape_upload_is_persisted_and_resolvable() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));
    let body = fake_mp4(512);

    let outcome = setup
        .pipeline
        .ingest(setup.request("video/mp4", body.clone()))
        .await
        .unwrap();

    assert_eq!(outcome.aspect_class, AspectClass::Landscape);
    assert_eq!(outcome.size_bytes, 512);

    let key = outcome.locator.locator().as_str();
    let name = key.strip_prefix("landscape/").unwrap();
    assert!(name.ends_with(".mp4"));
    assert_eq!(name.len(), 43 + ".mp4".len());
    assert_eq!(outcome.locator.store_id(), STORE_ID);

    // Object stored with its content type
    assert_eq!(setup.storage.download(key).unwrap(), body);
    assert_eq!(
        setup.storage.content_type(key).unwrap().as_deref(),
        Some("video/mp4")
    );

    // Record points at the encoded locator, other fields untouched
    let stored = setup.stored_record().await;
    assert_eq!(stored.video_url.as_deref(), Some(outcome.locator.encode().as_str()));
    assert_eq!(stored.title, setup.video.title);
    assert_eq!(stored.created_at, setup.video.created_at);
    assert_eq!(
        PersistedLocator::decode(stored.video_url.as_deref().unwrap()),
        DecodedLocator::Signable(outcome.locator.clone())
    );

    assert!(setup.staging_is_empty());

    // Resolve for a reader
    let signed = setup.issuer.issue(&outcome.locator).await.unwrap();
    assert!(signed.url.starts_with(&format!("{}/{}?expires=", BASE_URL, key)));
    let expires = expires_param(&signed.url);
    assert_eq!(expires, signed.expires_at.timestamp());
    assert!((expires - chrono::Utc::now().timestamp() - 3600).abs() <= 1);

    let signed_record = sign_video_record(&setup.issuer, &stored).await.unwrap();
    assert!(signed_record
        .video_url
        .unwrap()
        .starts_with(&format!("{}/{}?", BASE_URL, key)));
}

#[tokio::test]
async fn test_portrait_and_other_folders() {
    for (width, height, folder) in [(1080, 1920, "portrait/"), (1000, 900, "other/")] {
        let setup = setup_test_pipeline(FakeMediaTool::new(width, height));
        let outcome = setup
            .pipeline
            .ingest(setup.request("video/mp4", fake_mp4(64)))
            .await
            .unwrap();
        assert!(outcome.locator.locator().as_str().starts_with(folder));
    }
}

#[tokio::test]
async fn test_media_type_parameters_are_ignored() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));
    let outcome = setup
        .pipeline
        .ingest(setup.request("Video/MP4; codecs=avc1", fake_mp4(64)))
        .await
        .unwrap();

    let key = outcome.locator.locator().as_str().to_string();
    assert!(key.ends_with(".mp4"));
    assert_eq!(
        setup.storage.content_type(&key).unwrap().as_deref(),
        Some("video/mp4")
    );
}

#[tokio::test]
async fn test_transcode_failure_leaves_no_trace() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080).failing_remux());

    let err = setup
        .pipeline
        .ingest(setup.request("video/mp4", fake_mp4(128)))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), IngestStage::Transcode);
    assert_eq!(err.error_code(), "TRANSCODE_FAILED");
    assert!(setup.storage.is_empty().unwrap());
    assert!(setup.stored_record().await.video_url.is_none());
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_probe_failure_uploads_nothing() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080).failing_probe());

    let err = setup
        .pipeline
        .ingest(setup.request("video/mp4", fake_mp4(128)))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), IngestStage::Probe);
    assert!(setup.storage.is_empty().unwrap());
    assert!(setup.stored_record().await.video_url.is_none());
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_zero_height_is_probe_failure() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 0));

    let err = setup
        .pipeline
        .ingest(setup.request("video/mp4", fake_mp4(128)))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), IngestStage::Probe);
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_stream_over_limit_with_understated_length() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));
    let mut upload = setup.request("video/mp4", fake_mp4(MAX_UPLOAD_BYTES as usize + 1));
    upload.content_length = Some(10);

    let err = setup.pipeline.ingest(upload).await.unwrap_err();

    assert!(matches!(
        err,
        IngestError::Validation(ValidationError::PayloadTooLarge { .. })
    ));
    assert_eq!(err.http_status_code(), 413);
    assert_eq!(setup.tool.remux_calls(), 0);
    assert!(setup.storage.is_empty().unwrap());
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_truncated_stream_is_not_stored() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));
    let mut upload = setup.request("video/mp4", fake_mp4(100));
    upload.content_length = Some(512);

    let err = setup.pipeline.ingest(upload).await.unwrap_err();

    assert_eq!(err.stage(), IngestStage::Staging);
    assert_eq!(err.error_code(), "STAGING_FAILED");
    assert_eq!(setup.tool.remux_calls(), 0);
    assert!(setup.storage.is_empty().unwrap());
    assert!(setup.stored_record().await.video_url.is_none());
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_unsupported_media_type_is_rejected_before_staging() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));

    let err = setup
        .pipeline
        .ingest(setup.request("video/webm", fake_mp4(64)))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), IngestStage::Validation);
    assert_eq!(err.http_status_code(), 415);
    assert_eq!(setup.tool.remux_calls(), 0);
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_unknown_video_is_not_found() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));
    let missing = Uuid::new_v4();

    let err = setup
        .pipeline
        .ingest(request(setup.owner, missing, "video/mp4", fake_mp4(64)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Validation(ValidationError::NotFound(id)) if id == missing
    ));
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_other_users_video_is_forbidden() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));

    let err = setup
        .pipeline
        .ingest(request(Uuid::new_v4(), setup.video.id, "video/mp4", fake_mp4(64)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IngestError::Validation(ValidationError::Forbidden { .. })
    ));
    assert_eq!(err.http_status_code(), 403);
    assert_eq!(setup.tool.remux_calls(), 0);
    assert!(setup.stored_record().await.video_url.is_none());
}

#[tokio::test]
async fn test_upload_failure_does_not_persist() {
    let setup = setup_pipeline_with_broken_storage();

    let err = setup
        .pipeline
        .ingest(setup.request("video/mp4", fake_mp4(64)))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), IngestStage::Upload);
    assert!(err.is_recoverable());
    assert!(setup.stored_record().await.video_url.is_none());
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_persist_failure_removes_uploaded_object() {
    let setup = setup_pipeline_with_read_only_records();

    let err = setup
        .pipeline
        .ingest(setup.request("video/mp4", fake_mp4(64)))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), IngestStage::Persist);
    assert!(setup.storage.is_empty().unwrap());
    assert!(setup.staging_is_empty());
}

#[tokio::test]
async fn test_concurrent_ingests_of_same_video_last_write_wins() {
    let setup = setup_test_pipeline(FakeMediaTool::new(1920, 1080));

    let (first, second) = tokio::join!(
        setup.pipeline.ingest(setup.request("video/mp4", fake_mp4(64))),
        setup.pipeline.ingest(setup.request("video/mp4", fake_mp4(96))),
    );
    let first = first.unwrap();
    let second = second.unwrap();
    assert_ne!(first.locator, second.locator);

    let stored = setup.stored_record().await.video_url.unwrap();
    assert!(stored == first.locator.encode() || stored == second.locator.encode());
    assert_eq!(setup.storage.len().unwrap(), 2);
    assert!(setup.staging_is_empty());
}
