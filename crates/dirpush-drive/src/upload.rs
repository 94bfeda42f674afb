//! Resumable uploads for the Drive v2 API
//!
//! An upload is two requests:
//! 1. `POST /upload/drive/v2/files?uploadType=resumable` with the file
//!    metadata; the session URI comes back in the `Location` header
//! 2. `PUT <session URI>` with the file bytes streamed from disk
//!
//! Transient failures (transport errors, 429, 5xx) restart the whole
//! sequence after an exponential backoff. There is no attempt limit: the
//! loop ends on success, on a permanent error, or when the cancellation
//! token fires. Failing to read the local file is permanent, including a
//! read error raised while the body is already streaming.
//!
//! ## API Reference
//!
//! - [Resumable upload](https://developers.google.com/drive/api/v2/manage-uploads#resumable)

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Method};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dirpush_core::domain::newtypes::RemoteId;

use crate::client::DriveClient;
use crate::files::{FileMetadata, ParentRef};
use crate::listing::DriveFile;
use crate::mime::content_type_for;
use crate::DriveError;

/// Path that opens a resumable upload session
pub(crate) const UPLOAD_PATH: &str = "/upload/drive/v2/files?uploadType=resumable";

// ============================================================================
// RetryPolicy
// ============================================================================

/// Backoff schedule for upload retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry; doubled on each further attempt
    pub base_delay: Duration,
    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from millisecond values
    pub fn from_millis(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_delay: Duration::from_millis(base_ms),
            max_delay: Duration::from_millis(max_ms),
        }
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(500, 30_000)
    }
}

// ============================================================================
// upload_file
// ============================================================================

/// Uploads the file at `local_path` as `title` under `parent_id`
///
/// # Arguments
/// * `client` - The authenticated DriveClient
/// * `local_path` - File to read; reopened on every attempt
/// * `title` - Remote file title
/// * `parent_id` - Remote parent folder
/// * `cancel` - Stops the retry loop, including an in-flight attempt
/// * `policy` - Backoff schedule
///
/// # Returns
/// The identifier of the created file
///
/// # Errors
/// Returns the first non-transient error, or [`DriveError::Cancelled`]
pub async fn upload_file(
    client: &DriveClient,
    local_path: &Path,
    title: &str,
    parent_id: &RemoteId,
    cancel: &CancellationToken,
    policy: &RetryPolicy,
) -> Result<RemoteId, DriveError> {
    let content_type = content_type_for(local_path);
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DriveError::Cancelled),
            result = upload_once(client, local_path, title, parent_id, content_type) => result,
        };

        match result {
            Ok(id) => {
                if attempt > 0 {
                    info!(title, attempt, "Upload succeeded after retry");
                }
                return Ok(id);
            }
            Err(err) if err.is_transient() => {
                let delay = err
                    .retry_after()
                    .unwrap_or_else(|| policy.delay_for(attempt));
                warn!(
                    title,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient upload error, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(DriveError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt = attempt.saturating_add(1);
            }
            Err(err) => return Err(err),
        }
    }
}

/// One full session: initiate, then stream the bytes
async fn upload_once(
    client: &DriveClient,
    local_path: &Path,
    title: &str,
    parent_id: &RemoteId,
    content_type: &str,
) -> Result<RemoteId, DriveError> {
    let file = tokio::fs::File::open(local_path).await?;
    let metadata = file.metadata().await?;
    if metadata.is_dir() {
        return Err(DriveError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("{} is a directory", local_path.display()),
        )));
    }
    let len = metadata.len();

    let session_uri = create_session(client, title, parent_id, content_type, len).await?;

    debug!(title, len, session = %session_uri, "Uploading bytes");
    let id = send_body(client, &session_uri, content_type, len, file).await?;
    debug!(title, id = %id, "Upload completed");
    Ok(id)
}

/// First local read error seen while a request body was streaming
#[derive(Debug, Clone, Default)]
struct ReadErrorSlot(Arc<Mutex<Option<io::Error>>>);

impl ReadErrorSlot {
    fn record(&self, err: &io::Error) {
        if let Ok(mut slot) = self.0.lock() {
            if slot.is_none() {
                *slot = Some(io::Error::new(err.kind(), err.to_string()));
            }
        }
    }

    fn take(&self) -> Option<io::Error> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// PUTs the bytes of `reader` to an open session
///
/// A read failure surfaces as [`DriveError::Io`] rather than the transport
/// error reqwest reports for the aborted body.
async fn send_body<R>(
    client: &DriveClient,
    session_uri: &str,
    content_type: &str,
    len: u64,
    reader: R,
) -> Result<RemoteId, DriveError>
where
    R: AsyncRead + Send + Sync + 'static,
{
    let read_error = ReadErrorSlot::default();
    let slot = read_error.clone();
    let stream = ReaderStream::new(reader).inspect_err(move |err| slot.record(err));

    let request = client
        .request_url(Method::PUT, session_uri)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, len)
        .body(Body::wrap_stream(stream));

    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => return Err(read_error.take().map(DriveError::Io).unwrap_or(err)),
    };

    let created: DriveFile = response
        .json()
        .await
        .map_err(|e| DriveError::InvalidResponse(format!("upload: {e}")))?;
    created.remote_id()
}

/// Opens a resumable session and returns its URI
pub async fn create_session(
    client: &DriveClient,
    title: &str,
    parent_id: &RemoteId,
    content_type: &str,
    len: u64,
) -> Result<String, DriveError> {
    debug!(title, parent_id = %parent_id, content_type, len, "files.insert (resumable)");

    let body = FileMetadata {
        title,
        mime_type: content_type,
        parents: [ParentRef {
            id: parent_id.as_str(),
        }],
    };
    let response = client
        .execute(
            client
                .request(Method::POST, UPLOAD_PATH)
                .header("X-Upload-Content-Type", content_type)
                .header("X-Upload-Content-Length", len)
                .json(&body),
        )
        .await?;

    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| DriveError::InvalidResponse("upload session without Location".into()))
}
