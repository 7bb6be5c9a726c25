//! Engine Configuration
//!
//! Page-wide settings read once from `<meta>` elements of the hosting
//! document.

use hinc_dom::Document;
use std::time::Duration;

/// Meta name selecting the delivery mode
pub const MODE_META: &str = "include_mode";

/// Meta name holding the buffer timeout in seconds
pub const TIMEOUT_META: &str = "include_timeout";

/// When fetched fragments are spliced in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Render each fragment as soon as its fetch completes (`async`)
    Immediate,
    /// Hold fragments until every started fetch completes or the timeout fires
    #[default]
    Buffered,
}

impl DeliveryMode {
    /// Parse the meta value; `None` for unknown values
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "async" => Some(DeliveryMode::Immediate),
            "buffered" => Some(DeliveryMode::Buffered),
            _ => None,
        }
    }
}

/// Immutable page-wide include configuration
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeConfig {
    pub mode: DeliveryMode,
    /// Buffered-mode flush deadline
    pub timeout: Duration,
}

impl IncludeConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2500);

    /// Read configuration from the document's meta elements
    pub fn from_document(document: &Document) -> Self {
        let mut config = Self::default();

        if let Some(value) = document.meta_content(MODE_META) {
            match DeliveryMode::parse(value) {
                Some(mode) => config.mode = mode,
                None => tracing::warn!("Unknown {} {:?}, using buffered", MODE_META, value),
            }
        }

        if let Some(value) = document.meta_content(TIMEOUT_META) {
            match parse_timeout(value) {
                Some(timeout) => config.timeout = timeout,
                None => tracing::warn!(
                    "Invalid {} {:?}, using {:?}",
                    TIMEOUT_META,
                    value,
                    Self::DEFAULT_TIMEOUT
                ),
            }
        }

        tracing::debug!("Include config: {:?}", config);
        config
    }

    pub fn with_mode(mut self, mode: DeliveryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self {
            mode: DeliveryMode::Buffered,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Seconds as a non-negative finite float
pub(crate) fn parse_timeout(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_meta(pairs: &[(&str, &str)]) -> Document {
        let mut doc = Document::new("http://example.com/");
        let head = doc.head();
        for (name, content) in pairs {
            let meta = doc.tree.create_element("meta");
            doc.tree.set_attribute(meta, "name", name);
            doc.tree.set_attribute(meta, "content", content);
            doc.tree.append_child(head, meta);
        }
        doc
    }

    #[test]
    fn test_defaults() {
        let config = IncludeConfig::from_document(&doc_with_meta(&[]));
        assert_eq!(config.mode, DeliveryMode::Buffered);
        assert_eq!(config.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_reads_meta() {
        let doc = doc_with_meta(&[(MODE_META, "async"), (TIMEOUT_META, "0.5")]);
        let config = IncludeConfig::from_document(&doc);
        assert_eq!(config.mode, DeliveryMode::Immediate);
        assert_eq!(config.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let doc = doc_with_meta(&[(MODE_META, "eager"), (TIMEOUT_META, "-1")]);
        let config = IncludeConfig::from_document(&doc);
        assert_eq!(config, IncludeConfig::default());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("2"), Some(Duration::from_secs(2)));
        assert_eq!(parse_timeout(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_timeout("NaN"), None);
        assert_eq!(parse_timeout("inf"), None);
        assert_eq!(parse_timeout("soon"), None);
    }
}
