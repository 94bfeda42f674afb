//! Integration tests for resumable uploads

use std::time::Duration;

use dirpush_core::ports::IRemoteHierarchy;
use dirpush_drive::{upload, DriveClient, DriveError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_upload_streams_file_and_returns_id() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(20);
    let dir = tempfile::tempdir().unwrap();
    let tree = common::single_file_tree(dir.path(), "x.txt", b"0123456789");
    let file = tree.node(tree.children(tree.root())[0]);

    Mock::given(method("POST"))
        .and(path("/upload/drive/v2/files"))
        .and(query_param("uploadType", "resumable"))
        .and(header("X-Upload-Content-Type", "text/plain"))
        .and(header("X-Upload-Content-Length", "10"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Location", format!("{}/upload/session/s1", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;
    common::mount_upload_put(&server, "s1", "uploaded1", "x.txt").await;

    let id = hierarchy
        .create_file(file, &common::id("folderA"), &ctx)
        .await
        .unwrap();

    assert_eq!(id.as_str(), "uploaded1");
    assert_eq!(governor.executed(), 1);

    let requests = server.received_requests().await.unwrap();
    let init: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(init["title"], "x.txt");
    assert_eq!(init["parents"][0]["id"], "folderA");
    assert_eq!(requests[1].body, b"0123456789");
}

#[tokio::test]
async fn test_upload_empty_file() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (_governor, ctx) = common::context(20);
    let dir = tempfile::tempdir().unwrap();
    let tree = common::single_file_tree(dir.path(), "empty.bin", b"");
    let file = tree.node(tree.children(tree.root())[0]);

    common::mount_upload_session(&server, "s0").await;
    common::mount_upload_put(&server, "s0", "empty1", "empty.bin").await;

    let id = hierarchy
        .create_file(file, &common::id("folderA"), &ctx)
        .await
        .unwrap();
    assert_eq!(id.as_str(), "empty1");
}

#[tokio::test]
async fn test_upload_retries_transient_failure() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(20);
    let dir = tempfile::tempdir().unwrap();
    let tree = common::single_file_tree(dir.path(), "x.txt", b"hello");
    let file = tree.node(tree.children(tree.root())[0]);

    common::mount_upload_session(&server, "s2").await;
    Mock::given(method("PUT"))
        .and(path("/upload/session/s2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    common::mount_upload_put(&server, "s2", "afterRetry", "x.txt").await;

    let id = hierarchy
        .create_file(file, &common::id("folderA"), &ctx)
        .await
        .unwrap();

    assert_eq!(id.as_str(), "afterRetry");
    // Retries happen below the governor: one logical upload, one tally.
    assert_eq!(governor.executed(), 1);
}

#[tokio::test]
async fn test_upload_honours_retry_after_on_429() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (_governor, ctx) = common::context(20);
    let dir = tempfile::tempdir().unwrap();
    let tree = common::single_file_tree(dir.path(), "x.txt", b"hello");
    let file = tree.node(tree.children(tree.root())[0]);

    Mock::given(method("POST"))
        .and(path("/upload/drive/v2/files"))
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    common::mount_upload_session(&server, "s3").await;
    common::mount_upload_put(&server, "s3", "throttled1", "x.txt").await;

    let id = hierarchy
        .create_file(file, &common::id("folderA"), &ctx)
        .await
        .unwrap();
    assert_eq!(id.as_str(), "throttled1");
}

#[tokio::test]
async fn test_upload_permanent_failure_is_not_retried() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (_governor, ctx) = common::context(20);
    let dir = tempfile::tempdir().unwrap();
    let tree = common::single_file_tree(dir.path(), "x.txt", b"hello");
    let file = tree.node(tree.children(tree.root())[0]);

    Mock::given(method("POST"))
        .and(path("/upload/drive/v2/files"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid parent"))
        .expect(1)
        .mount(&server)
        .await;

    let err = hierarchy
        .create_file(file, &common::id("folderA"), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriveError>(),
        Some(DriveError::Api { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_upload_cancellation_stops_retry_loop() {
    let server = wiremock::MockServer::start().await;
    let client = DriveClient::with_base_url("test-access-token", server.uri());
    let dir = tempfile::tempdir().unwrap();
    let path_on_disk = dir.path().join("x.txt");
    std::fs::write(&path_on_disk, b"hello").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/drive/v2/files"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        upload::upload_file(
            &client,
            &path_on_disk,
            "x.txt",
            &common::id("folderA"),
            &cancel,
            &common::fast_retry(),
        ),
    )
    .await
    .expect("upload loop must stop once cancelled");

    assert!(matches!(result, Err(DriveError::Cancelled)));
    let attempts = server.received_requests().await.unwrap().len();
    assert!(attempts >= 2, "expected retries before cancellation, got {attempts}");
}

#[tokio::test]
async fn test_upload_missing_local_file_fails() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (_governor, ctx) = common::context(20);
    let dir = tempfile::tempdir().unwrap();
    let tree = common::single_file_tree(dir.path(), "x.txt", b"hello");
    let file = tree.node(tree.children(tree.root())[0]);
    std::fs::remove_file(file.path()).unwrap();

    let err = hierarchy
        .create_file(file, &common::id("folderA"), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<DriveError>(), Some(DriveError::Io(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_upload_symlink_to_directory_fails_without_retrying() {
    use dirpush_core::domain::local_tree::{FileInfo, LocalTree};

    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(20);
    common::mount_upload_session(&server, "s1").await;
    common::mount_upload_put(&server, "s1", "never", "link").await;

    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target");
    std::fs::create_dir(&target).unwrap();
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let root_meta = std::fs::symlink_metadata(dir.path()).unwrap();
    let link_meta = std::fs::symlink_metadata(&link).unwrap();
    let tree = LocalTree::assemble(vec![
        (dir.path().to_path_buf(), FileInfo::from_metadata("root", &root_meta)),
        (link.clone(), FileInfo::from_metadata("link", &link_meta)),
    ])
    .unwrap();
    let file = tree.node(tree.children(tree.root())[0]);
    assert!(!file.is_dir());

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        hierarchy.create_file(file, &common::id("folderA"), &ctx),
    )
    .await
    .expect("upload of a directory symlink must not retry");

    let err = result.unwrap_err();
    assert!(matches!(err.downcast_ref::<DriveError>(), Some(DriveError::Io(_))));
    assert_eq!(governor.executed(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}
