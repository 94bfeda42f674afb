//! Integration tests for folder creation and relocation

use dirpush_core::governor::GovernorError;
use dirpush_core::ports::IRemoteHierarchy;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, FOLDER_MIME};

// ============================================================================
// Folder creation
// ============================================================================

#[tokio::test]
async fn test_create_folder_sends_metadata_and_returns_id() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(20);

    Mock::given(method("POST"))
        .and(path("/drive/v2/files"))
        .and(body_json(serde_json::json!({
            "title": "a",
            "mimeType": FOLDER_MIME,
            "parents": [{"id": "root1"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "newFolder1",
            "title": "a",
            "mimeType": FOLDER_MIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    let id = hierarchy
        .create_folder("a", &common::id("root1"), &ctx)
        .await
        .unwrap();

    assert_eq!(id.as_str(), "newFolder1");
    assert_eq!(governor.executed(), 1);
}

#[tokio::test]
async fn test_create_folder_failure_is_counted() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(20);

    Mock::given(method("POST"))
        .and(path("/drive/v2/files"))
        .respond_with(ResponseTemplate::new(404).set_body_string("parent not found"))
        .expect(1)
        .mount(&server)
        .await;

    let err = hierarchy
        .create_folder("a", &common::id("gone"), &ctx)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("parent not found"));
    assert_eq!(governor.executed(), 1);
}

#[tokio::test]
async fn test_create_folder_over_ceiling_sends_nothing() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(1);

    Mock::given(method("POST"))
        .and(path("/drive/v2/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "f1", "title": "a", "mimeType": FOLDER_MIME
        })))
        .expect(1)
        .mount(&server)
        .await;

    hierarchy
        .create_folder("a", &common::id("root1"), &ctx)
        .await
        .unwrap();
    let err = hierarchy
        .create_folder("b", &common::id("root1"), &ctx)
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<GovernorError>().is_some());
    assert_eq!(governor.executed(), 2);
}

// ============================================================================
// Relocation
// ============================================================================

#[tokio::test]
async fn test_relocate_adds_then_removes_parent() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(20);

    Mock::given(method("POST"))
        .and(path("/drive/v2/files/file1/parents"))
        .and(body_json(serde_json::json!({"id": "quarantine"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#parentReference",
            "id": "quarantine"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/drive/v2/files/file1/parents/folderA"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    hierarchy
        .relocate_file(
            &common::id("file1"),
            &common::id("folderA"),
            &common::id("quarantine"),
            &ctx,
        )
        .await
        .unwrap();

    assert_eq!(governor.executed(), 2);

    let requests = server.received_requests().await.unwrap();
    let methods: Vec<_> = requests.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(methods, vec!["POST", "DELETE"]);
}

#[tokio::test]
async fn test_relocate_second_leg_over_ceiling() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(1);

    Mock::given(method("POST"))
        .and(path("/drive/v2/files/file1/parents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "q"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = hierarchy
        .relocate_file(&common::id("file1"), &common::id("a"), &common::id("q"), &ctx)
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<GovernorError>().is_some());
    assert_eq!(governor.executed(), 2);
}

#[tokio::test]
async fn test_relocate_stops_when_first_leg_fails() {
    let (server, hierarchy) = common::setup_drive_mock().await;
    let (governor, ctx) = common::context(20);

    Mock::given(method("POST"))
        .and(path("/drive/v2/files/file1/parents"))
        .respond_with(ResponseTemplate::new(403).set_body_string("insufficientPermissions"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = hierarchy
        .relocate_file(&common::id("file1"), &common::id("a"), &common::id("q"), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<dirpush_drive::DriveError>(),
        Some(dirpush_drive::DriveError::Forbidden(_))
    ));
    assert_eq!(governor.executed(), 1);
}
