//! Integration tests for folder listing

use dirpush_core::ports::IRemoteHierarchy;
use dirpush_drive::listing;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, FOLDER_MIME};

const ROOT_QUERY: &str = "'root1' in parents and trashed=false";

#[tokio::test]
async fn test_list_single_page() {
    let (server, hierarchy) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v2/files"))
        .and(query_param("q", ROOT_QUERY))
        .and(header("authorization", "Bearer test-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#fileList",
            "items": [
                {"id": "fa", "title": "a", "mimeType": FOLDER_MIME},
                {"id": "fx", "title": "x.txt", "mimeType": "text/plain"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = hierarchy.list_children(&common::id("root1")).await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "a");
    assert!(entries[0].is_folder());
    assert_eq!(entries[1].id.as_str(), "fx");
    assert!(!entries[1].is_folder());
}

#[tokio::test]
async fn test_list_follows_page_tokens() {
    let (server, hierarchy) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v2/files"))
        .and(query_param("q", ROOT_QUERY))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"id": "p1", "title": "one", "mimeType": "text/plain"}],
            "nextPageToken": "tok2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v2/files"))
        .and(query_param("pageToken", "tok2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"id": "p2", "title": "two", "mimeType": "text/plain"}],
            "nextPageToken": "tok3"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v2/files"))
        .and(query_param("pageToken", "tok3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [{"id": "p3", "title": "three", "mimeType": FOLDER_MIME}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = hierarchy.list_children(&common::id("root1")).await.unwrap();
    let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_list_empty_folder() {
    let (server, hierarchy) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v2/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#fileList",
            "items": []
        })))
        .mount(&server)
        .await;

    let entries = hierarchy.list_children(&common::id("root1")).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_list_fails_without_retry() {
    let (server, hierarchy) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v2/files"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = listing::list_children(hierarchy.client(), &common::id("root1"))
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_list_unauthorized() {
    let (server, hierarchy) = common::setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v2/files"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let err = hierarchy
        .list_children(&common::id("root1"))
        .await
        .unwrap_err();
    let drive_err = err.downcast_ref::<dirpush_drive::DriveError>().unwrap();
    assert!(matches!(drive_err, dirpush_drive::DriveError::Unauthorized(_)));
}
