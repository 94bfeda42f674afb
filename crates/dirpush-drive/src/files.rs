//! Folder creation and parent management
//!
//! - `POST /drive/v2/files` with a folder MIME type creates a folder
//! - `POST /drive/v2/files/{id}/parents` links a file under another folder
//! - `DELETE /drive/v2/files/{id}/parents/{parentId}` unlinks it
//!
//! None of these retry; governor accounting happens in the provider.

use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use dirpush_core::domain::newtypes::RemoteId;
use dirpush_core::ports::FOLDER_MIME_TYPE;

use crate::client::DriveClient;
use crate::listing::{DriveFile, FILES_PATH};
use crate::DriveError;

/// Reference to a parent folder in request bodies
#[derive(Debug, Serialize)]
pub(crate) struct ParentRef<'a> {
    pub(crate) id: &'a str,
}

/// Metadata body for folder and file inserts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileMetadata<'a> {
    pub(crate) title: &'a str,
    pub(crate) mime_type: &'a str,
    pub(crate) parents: [ParentRef<'a>; 1],
}

/// Creates a folder named `title` under `parent_id`
pub async fn insert_folder(
    client: &DriveClient,
    title: &str,
    parent_id: &RemoteId,
) -> Result<RemoteId, DriveError> {
    debug!(title, parent_id = %parent_id, "files.insert (folder)");

    let body = FileMetadata {
        title,
        mime_type: FOLDER_MIME_TYPE,
        parents: [ParentRef {
            id: parent_id.as_str(),
        }],
    };
    let created: DriveFile = client
        .execute(client.request(Method::POST, FILES_PATH).json(&body))
        .await?
        .json()
        .await
        .map_err(|e| DriveError::InvalidResponse(format!("files.insert: {e}")))?;

    let id = created.remote_id()?;
    debug!(title, id = %id, "Folder created");
    Ok(id)
}

/// Adds `parent_id` to the parents of `file_id`
pub async fn add_parent(
    client: &DriveClient,
    file_id: &RemoteId,
    parent_id: &RemoteId,
) -> Result<(), DriveError> {
    debug!(file_id = %file_id, parent_id = %parent_id, "parents.insert");

    let path = format!("{}/{}/parents", FILES_PATH, file_id.as_str());
    let body = ParentRef {
        id: parent_id.as_str(),
    };
    client
        .execute(client.request(Method::POST, &path).json(&body))
        .await?;
    Ok(())
}

/// Removes `parent_id` from the parents of `file_id`
pub async fn remove_parent(
    client: &DriveClient,
    file_id: &RemoteId,
    parent_id: &RemoteId,
) -> Result<(), DriveError> {
    debug!(file_id = %file_id, parent_id = %parent_id, "parents.delete");

    let path = format!(
        "{}/{}/parents/{}",
        FILES_PATH,
        file_id.as_str(),
        parent_id.as_str()
    );
    client.execute(client.request(Method::DELETE, &path)).await?;
    Ok(())
}
