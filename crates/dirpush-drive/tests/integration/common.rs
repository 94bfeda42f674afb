//! Shared test helpers for Drive API integration tests
//!
//! Each helper mounts the necessary mock endpoints on a wiremock server.
//! [`setup_drive_mock`] returns a [`DriveHierarchy`] pointing at it with a
//! fast retry policy.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dirpush_core::domain::local_tree::{FileInfo, LocalTree};
use dirpush_core::domain::newtypes::RemoteId;
use dirpush_core::governor::{CeilingPolicy, OpContext, OperationGovernor};
use dirpush_drive::{DriveClient, DriveHierarchy, RetryPolicy};

pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Starts a mock server and returns it with a hierarchy and client pointed at it
pub async fn setup_drive_mock() -> (MockServer, DriveHierarchy) {
    let server = MockServer::start().await;
    let client = DriveClient::with_base_url("test-access-token", server.uri());
    let hierarchy = DriveHierarchy::with_retry_policy(client, fast_retry());
    (server, hierarchy)
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::from_millis(10, 40)
}

pub fn id(s: &str) -> RemoteId {
    RemoteId::new(s.to_string()).unwrap()
}

/// Returns a context with a fresh governor using [`CeilingPolicy::ReturnError`]
pub fn context(max_ops: u64) -> (Arc<OperationGovernor>, OpContext) {
    let governor = Arc::new(OperationGovernor::new(max_ops, CeilingPolicy::ReturnError));
    let ctx = OpContext::new(Arc::clone(&governor), CancellationToken::new());
    (governor, ctx)
}

/// Builds a one-file tree from a real file on disk and returns it
pub fn single_file_tree(dir: &Path, name: &str, content: &[u8]) -> LocalTree {
    let file_path = dir.join(name);
    std::fs::write(&file_path, content).unwrap();

    let dir_meta = std::fs::symlink_metadata(dir).unwrap();
    let file_meta = std::fs::symlink_metadata(&file_path).unwrap();
    LocalTree::assemble(vec![
        (dir.to_path_buf(), FileInfo::from_metadata("root", &dir_meta)),
        (file_path, FileInfo::from_metadata(name, &file_meta)),
    ])
    .unwrap()
}

/// Mounts a resumable upload whose session URI is `/upload/session/<session>`
pub async fn mount_upload_session(server: &MockServer, session: &str) {
    Mock::given(method("POST"))
        .and(path("/upload/drive/v2/files"))
        .and(query_param("uploadType", "resumable"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Location", format!("{}/upload/session/{}", server.uri(), session).as_str()),
        )
        .mount(server)
        .await;
}

/// Mounts the PUT that completes an upload session
pub async fn mount_upload_put(server: &MockServer, session: &str, file_id: &str, title: &str) {
    Mock::given(method("PUT"))
        .and(path(format!("/upload/session/{session}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#file",
            "id": file_id,
            "title": title,
            "mimeType": "text/plain"
        })))
        .mount(server)
        .await;
}
