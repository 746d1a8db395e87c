use std::sync::Arc;
use std::sync::atomic::Ordering;

use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use super::*;
use crate::error::FileItemError;
use crate::item::{Actor, ItemEngine, Permission, Requester};
use crate::storage::{StorageBackend, collect_bytes};
use crate::testing::{BackendKind, Harness, RejectingItems, incoming};

#[rstest]
#[case::local(BackendKind::Local)]
#[case::object(BackendKind::Object)]
#[tokio::test]
async fn test_single_upload_creates_item(#[case] kind: BackendKind) {
    let h = Harness::new(kind);
    let pipeline = h.pipeline();

    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();
    session
        .ingest(incoming("notes.txt", "text/plain", b"hello world"))
        .await
        .unwrap();
    let outcome = session.finish().unwrap();

    let UploadOutcome::Created(item) = outcome else {
        panic!("expected a single created item");
    };
    assert_eq!(item.name, "notes.txt");
    assert_eq!(item.item_type, h.config.file_type().as_str());
    let extra = item.file_extra(h.config.file_type()).unwrap();
    assert_eq!(extra.size, 11);
    assert_eq!(extra.mimetype, "text/plain");

    let stored = collect_bytes(h.backend.fetch(&extra.path).await.unwrap())
        .await
        .unwrap();
    assert_eq!(stored, b"hello world");
    assert_eq!(h.engine.get_item(item.id).await.unwrap(), item);
}

#[tokio::test]
async fn test_zero_parts_is_rejected() {
    let h = Harness::new(BackendKind::Object);
    let pipeline = h.pipeline();

    let session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();

    assert!(matches!(session.finish(), Err(FileItemError::NoFiles)));
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test]
async fn test_multiple_parts_are_accepted() {
    let h = Harness::new(BackendKind::Object);
    let pipeline = h.pipeline();

    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        session
            .ingest(incoming(name, "text/plain", b"x"))
            .await
            .unwrap();
    }
    let paths: Vec<String> = session
        .created()
        .iter()
        .filter_map(|item| item.file_extra(h.config.file_type()))
        .map(|extra| extra.path)
        .collect();

    assert_eq!(
        session.finish().unwrap(),
        UploadOutcome::Accepted { count: 3 }
    );
    assert_eq!(h.engine.len(), 3);
    assert_eq!(paths.len(), 3);
    assert!(paths[0] != paths[1] && paths[1] != paths[2]);
}

#[tokio::test]
async fn test_public_upload_never_touches_storage() {
    let h = Harness::new(BackendKind::Object);
    let pipeline = h.pipeline();

    let result = pipeline.begin(&Requester::Public, None).await;

    assert!(matches!(result, Err(FileItemError::PermissionDenied(_))));
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test]
async fn test_upload_without_write_permission_is_denied() {
    let h = Harness::new(BackendKind::Local);
    let folder = h.engine.create_folder(&h.owner, "docs", None).await.unwrap();
    let reader = Actor::new(Uuid::new_v4());
    h.engine.grant(reader.id, folder.id, Permission::Read);
    let pipeline = h.pipeline();

    let result = pipeline
        .begin(&Requester::Member(reader), Some(folder.id))
        .await;

    assert!(matches!(result, Err(FileItemError::PermissionDenied(_))));
    assert_eq!(h.backend.calls(), 0);
}

#[tokio::test]
async fn test_upload_into_missing_parent_is_not_found() {
    let h = Harness::new(BackendKind::Local);
    let pipeline = h.pipeline();

    let result = pipeline
        .begin(&Requester::Member(h.owner), Some(Uuid::new_v4()))
        .await;

    assert!(matches!(result, Err(FileItemError::NotFound(_))));
}

#[tokio::test]
async fn test_upload_into_folder() {
    let h = Harness::new(BackendKind::Local);
    let folder = h.engine.create_folder(&h.owner, "docs", None).await.unwrap();
    let writer = Actor::new(Uuid::new_v4());
    h.engine.grant(writer.id, folder.id, Permission::Write);
    let pipeline = h.pipeline();

    let mut session = pipeline
        .begin(&Requester::Member(writer), Some(folder.id))
        .await
        .unwrap();
    let item_id = session
        .ingest(incoming("a.txt", "text/plain", b"abc"))
        .await
        .unwrap()
        .id;
    session.finish().unwrap();

    // Inherited from the folder.
    assert!(h.engine.delete_item(&h.owner, item_id).await.is_ok());
}

#[tokio::test]
async fn test_quota_checked_before_streaming() {
    let h = Harness::build(
        BackendKind::Object,
        |config| config.with_quota(Some(4)),
        |backend| backend,
    );
    let pipeline = h.pipeline();
    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();
    session
        .ingest(incoming("a.txt", "text/plain", b"abcd"))
        .await
        .unwrap();
    session.finish().unwrap();
    let stores = h.backend.stores.load(Ordering::SeqCst);

    let result = pipeline.begin(&Requester::Member(h.owner), None).await;

    assert!(matches!(
        result,
        Err(FileItemError::QuotaExceeded { used: 4, limit: 4 })
    ));
    assert_eq!(h.backend.stores.load(Ordering::SeqCst), stores);
}

#[tokio::test]
async fn test_too_many_parts() {
    let h = Harness::build(
        BackendKind::Object,
        |config| config.with_max_files(2),
        |backend| backend,
    );
    let pipeline = h.pipeline();
    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();
    for name in ["a.txt", "b.txt"] {
        session
            .ingest(incoming(name, "text/plain", b"x"))
            .await
            .unwrap();
    }

    let result = session.ingest(incoming("c.txt", "text/plain", b"x")).await;

    assert!(matches!(result, Err(FileItemError::TooManyFiles { max: 2 })));
    assert_eq!(h.backend.stores.load(Ordering::SeqCst), 2);
}

#[rstest]
#[case::local(BackendKind::Local)]
#[case::object(BackendKind::Object)]
#[tokio::test]
async fn test_oversized_file_is_removed(#[case] kind: BackendKind) {
    let h = Harness::build(kind, |config| config.with_max_file_size(4), |backend| backend);
    let pipeline = h.pipeline();
    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();

    let result = session
        .ingest(incoming("big.bin", "application/octet-stream", b"0123456789"))
        .await;

    assert!(matches!(result, Err(FileItemError::FileTooLarge { max: 4 })));
    assert_eq!(h.backend.deletes.load(Ordering::SeqCst), 1);
    assert!(h.engine.is_empty());
    assert!(session.created().is_empty());
}

#[tokio::test]
async fn test_storage_failure_cleans_up() {
    let h = Harness::build(
        BackendKind::Local,
        |config| config,
        |mut backend| {
            backend.fail_store = true;
            backend
        },
    );
    let pipeline = h.pipeline();
    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();

    let result = session
        .ingest(incoming("a.txt", "text/plain", b"partial"))
        .await;

    let Err(FileItemError::StorageWriteFailure { path, .. }) = result else {
        panic!("expected a write failure");
    };
    assert!(!h.backend.exists(&path).await);
    assert!(h.engine.is_empty());
}

#[tokio::test]
async fn test_cleanup_failure_keeps_original_error() {
    let h = Harness::build(
        BackendKind::Object,
        |config| config,
        |mut backend| {
            backend.fail_store = true;
            backend.fail_delete = true;
            backend
        },
    );
    let pipeline = h.pipeline();
    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();

    let result = session.ingest(incoming("a.txt", "text/plain", b"x")).await;

    assert!(matches!(
        result,
        Err(FileItemError::StorageWriteFailure { .. })
    ));
}

#[rstest]
#[case::local(BackendKind::Local)]
#[case::object(BackendKind::Object)]
#[tokio::test]
async fn test_item_creation_failure_removes_content(#[case] kind: BackendKind) {
    let h = Harness::new(kind);
    let pipeline = UploadPipeline::new(
        &h.config,
        h.backend.clone(),
        Arc::new(RejectingItems),
        h.engine.clone(),
    );
    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();

    let result = session
        .ingest(incoming("a.txt", "text/plain", b"orphan"))
        .await;

    assert!(matches!(result, Err(FileItemError::Item(_))));
    let stored = h.backend.stored_keys();
    assert_eq!(stored.len(), 1);
    assert!(!h.backend.exists(&stored[0]).await);
    assert_eq!(h.backend.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_item_metadata() {
    let h = Harness::new(BackendKind::Local);
    let pipeline = h.pipeline();
    let long_name = format!("{}.png", "a".repeat(120));
    let mut file = incoming(&long_name, "image/png", b"\x89PNG");
    file.encoding = Some("7bit".to_string());

    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();
    let item = session.ingest(file).await.unwrap().clone();

    assert_eq!(item.name.chars().count(), MAX_ITEM_NAME_LENGTH);
    assert_eq!(item.settings.get("hasThumbnail"), Some(&Value::Bool(true)));
    let extra = item.file_extra(h.config.file_type()).unwrap();
    assert_eq!(extra.name, long_name);
    assert_eq!(extra.encoding.as_deref(), Some("7bit"));
    assert_eq!(extra.size, 4);
}

#[tokio::test]
async fn test_empty_file_is_stored() {
    let h = Harness::new(BackendKind::Object);
    let pipeline = h.pipeline();
    let mut session = pipeline
        .begin(&Requester::Member(h.owner), None)
        .await
        .unwrap();

    let item = session
        .ingest(incoming("blob", "application/octet-stream", b""))
        .await
        .unwrap();

    let extra = item.file_extra(h.config.file_type()).unwrap();
    assert_eq!(extra.size, 0);
    assert!(h.backend.exists(&extra.path).await);
}
