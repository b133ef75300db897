//! Request/response shapes the redirect pipeline operates on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Status code that triggers the redirect pipeline.
pub const NOT_FOUND_STATUS: &str = "404";

/// Status written on the redirect path.
pub const REDIRECT_STATUS: &str = "302";

/// Description written on the redirect path.
pub const REDIRECT_DESCRIPTION: &str = "Found";

/// A single header as carried by the edge event: original-case name plus value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Headers keyed by lower-cased name, each with its ordered list of entries.
pub type Headers = BTreeMap<String, Vec<HeaderEntry>>;

/// The parts of the inbound request that templates can reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    /// Always starts with `/`.
    pub path: String,
    /// Query string without the leading `?`.
    pub query_string: String,
    pub host: String,
}

/// Origin response as seen by the edge.
///
/// Optional fields stay absent when serialized back, so a response that is
/// passed through leaves the edge exactly as it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: String,

    #[serde(
        rename = "statusDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default)]
    pub headers: Headers,
}

impl ResponseEnvelope {
    /// Whether this response should enter the redirect path.
    pub fn is_not_found(&self) -> bool {
        self.status == NOT_FOUND_STATUS
    }

    /// Turn this response into a `302 Found` pointing at `location`.
    ///
    /// The body is dropped and `location` replaces any existing entries; all
    /// other headers are kept.
    pub fn redirect_to(&mut self, location: String) {
        self.status = REDIRECT_STATUS.to_string();
        self.status_description = Some(REDIRECT_DESCRIPTION.to_string());
        self.body = Some(String::new());
        self.headers.insert(
            "location".to_string(),
            vec![HeaderEntry::new("Location", location)],
        );
    }

    /// First value of the header `name` (lower-cased lookup).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|entries| entries.first())
            .map(|entry| entry.value.as_str())
    }
}

/// Which distribution triggered the invocation, and the account owning it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistributionIdentity {
    pub account_id: String,
    pub distribution_id: String,
}

impl DistributionIdentity {
    pub fn new(account_id: impl Into<String>, distribution_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            distribution_id: distribution_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> ResponseEnvelope {
        let mut headers = Headers::new();
        headers.insert(
            "server".to_string(),
            vec![HeaderEntry::new("Server", "MyCustomOrigin")],
        );
        ResponseEnvelope {
            status: "404".to_string(),
            status_description: Some("Not Found".to_string()),
            body: Some("<h1>missing</h1>".to_string()),
            headers,
        }
    }

    #[test]
    fn test_redirect_mutation() {
        let mut response = not_found();
        assert!(response.is_not_found());

        response.redirect_to("https://target.example.org/".to_string());

        assert_eq!(response.status, "302");
        assert_eq!(response.status_description.as_deref(), Some("Found"));
        assert_eq!(response.body.as_deref(), Some(""));
        assert_eq!(response.headers["location"].len(), 1);
        assert_eq!(response.headers["location"][0].key, "Location");
        assert_eq!(response.header("Location"), Some("https://target.example.org/"));
        // Unrelated headers survive.
        assert_eq!(response.header("server"), Some("MyCustomOrigin"));
    }

    #[test]
    fn test_redirect_replaces_existing_location() {
        let mut response = not_found();
        response.headers.insert(
            "location".to_string(),
            vec![
                HeaderEntry::new("Location", "/a"),
                HeaderEntry::new("Location", "/b"),
            ],
        );

        response.redirect_to("/c".to_string());
        assert_eq!(response.headers["location"], vec![HeaderEntry::new("Location", "/c")]);
    }

    #[test]
    fn test_absent_fields_round_trip() {
        let json = r#"{"status":"200","headers":{}}"#;
        let response: ResponseEnvelope = serde_json::from_str(json).unwrap();
        assert!(response.body.is_none());
        assert!(response.status_description.is_none());
        assert_eq!(serde_json::to_string(&response).unwrap(), json);
    }
}
