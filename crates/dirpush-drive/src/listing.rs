//! Folder listing for the Drive v2 API
//!
//! `GET /drive/v2/files?q='<id>' in parents and trashed=false` returns one
//! page of children; `nextPageToken` is followed until the server stops
//! sending one.

use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use dirpush_core::domain::newtypes::RemoteId;
use dirpush_core::ports::RemoteEntry;

use crate::client::DriveClient;
use crate::DriveError;

/// Path of the `files` collection
pub(crate) const FILES_PATH: &str = "/drive/v2/files";

// ============================================================================
// Drive API response types
// ============================================================================

/// One page of a `files.list` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    items: Vec<DriveFile>,
    next_page_token: Option<String>,
}

/// A file resource, reduced to the fields the reconciler needs
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DriveFile {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) title: String,
    pub(crate) mime_type: Option<String>,
}

impl DriveFile {
    pub(crate) fn remote_id(&self) -> Result<RemoteId, DriveError> {
        RemoteId::new(self.id.clone())
            .map_err(|e| DriveError::InvalidResponse(format!("bad file id '{}': {e}", self.id)))
    }

    fn into_entry(self) -> Result<RemoteEntry, DriveError> {
        let id = self.remote_id()?;
        Ok(RemoteEntry::new(id, self.title, self.mime_type))
    }
}

/// Search expression selecting the non-trashed direct children of a folder
pub fn children_query(folder_id: &RemoteId) -> String {
    format!("'{}' in parents and trashed=false", folder_id.as_str())
}

/// Lists every non-trashed direct child of `folder_id`
///
/// Follows `nextPageToken` until exhausted; entries are returned in server
/// order, page after page.
pub async fn list_children(
    client: &DriveClient,
    folder_id: &RemoteId,
) -> Result<Vec<RemoteEntry>, DriveError> {
    let query = children_query(folder_id);
    let mut entries = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0u32;

    loop {
        debug!(folder_id = %folder_id, page_token = ?page_token, "files.list");

        let mut request = client
            .request(Method::GET, FILES_PATH)
            .query(&[("q", query.as_str())]);
        if let Some(token) = page_token.as_deref() {
            request = request.query(&[("pageToken", token)]);
        }

        let page: FileListPage = client
            .execute(request)
            .await?
            .json()
            .await
            .map_err(|e| DriveError::InvalidResponse(format!("files.list: {e}")))?;
        pages += 1;

        for file in page.items {
            entries.push(file.into_entry()?);
        }

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    debug!(folder_id = %folder_id, pages, count = entries.len(), "Listed folder");
    Ok(entries)
}
