//! Include errors
//!
//! Every variant is contained by the lifecycle controller and surfaces as a
//! status class on the element plus a log line.

use hinc_dom::NodeId;
use hinc_net::NetError;

/// Include failure
#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    #[error("recursive include of {url}")]
    Recursion { url: String },

    #[error("unsupported URL scheme {scheme:?} in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: NetError,
    },

    #[error("fragment {selector:?} not found in {url}")]
    FragmentNotFound { selector: String, url: String },

    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },

    #[error("invalid URL {input:?}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("include element {0:?} has no source attribute")]
    MissingSource(NodeId),

    #[error("node {0:?} is not an include element")]
    NotAnInclude(NodeId),
}

impl IncludeError {
    /// Status marker placed after the class prefix
    pub fn status_marker(&self) -> String {
        match self {
            IncludeError::Http { status, .. } => status.to_string(),
            _ => crate::ERROR_MARKER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_marker() {
        let http = IncludeError::Http { status: 404, url: "http://a/".into() };
        assert_eq!(http.status_marker(), "404");

        let recursion = IncludeError::Recursion { url: "http://a/".into() };
        assert_eq!(recursion.status_marker(), "error");
    }

    #[test]
    fn test_display() {
        let err = IncludeError::FragmentNotFound {
            selector: "#main".into(),
            url: "http://a/b.html".into(),
        };
        assert_eq!(err.to_string(), "fragment \"#main\" not found in http://a/b.html");
    }
}
