//! Tag and error types for distribution metadata lookups.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tag key holding the fallback location template.
pub const FALLBACK_LOCATION_TAG: &str = "FallbackLocation";

/// A key/value tag attached to a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Tag listing as returned by the metadata service:
/// `{"Tags": {"Items": [{"Key": .., "Value": ..}]}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagListing {
    #[serde(rename = "Tags", default)]
    pub tags: TagItems,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagItems {
    #[serde(rename = "Items", default)]
    pub items: Vec<Tag>,
}

impl From<Vec<Tag>> for TagListing {
    fn from(items: Vec<Tag>) -> Self {
        Self {
            tags: TagItems { items },
        }
    }
}

/// Build the resource identifier addressing a distribution:
/// `arn:<partition>:cloudfront::<account>:distribution/<id>`.
pub fn distribution_arn(partition: &str, account_id: &str, distribution_id: &str) -> String {
    format!("arn:{partition}:cloudfront::{account_id}:distribution/{distribution_id}")
}

/// Errors from looking up distribution metadata.
///
/// Cloneable because a single lookup result is shared by every caller
/// waiting on the same distribution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// The metadata service could not be reached.
    #[error("metadata transport error: {0}")]
    Transport(String),

    /// The metadata service answered with a non-success status.
    #[error("metadata service returned {status} for {resource}")]
    Status { status: u16, resource: String },

    /// No metadata exists for the resource.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The response body could not be decoded.
    #[error("invalid metadata response: {0}")]
    Decode(String),

    /// The metadata call exceeded its own timeout.
    #[error("metadata call timed out after {0} seconds")]
    Timeout(u64),

    /// The background lookup task ended without producing a result.
    #[error("metadata lookup aborted: {0}")]
    Aborted(String),
}

/// Result type alias for metadata lookups.
pub type ResolutionResult<T> = Result<T, ResolutionError>;
