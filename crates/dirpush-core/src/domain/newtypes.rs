//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for identifiers handed out by the remote store.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Remote store identifiers
// ============================================================================

/// Identifier of a remote file or folder
///
/// Format: opaque token, e.g. "0B7x9YzKq3AbCdEfGhIjKlMnOpQ". Drive IDs use
/// letters, digits, `-` and `_`; the root alias `root` is also accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a new RemoteId
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains characters that cannot
    /// appear in a remote identifier
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidRemoteId(
                "Remote ID cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '!')
        {
            return Err(DomainError::InvalidRemoteId(format!(
                "Remote ID contains invalid characters: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemoteId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

impl AsRef<str> for RemoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
