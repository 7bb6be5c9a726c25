//! Content extraction
//!
//! Parses a fetched body in isolation, makes its URLs absolute and picks
//! out the fragment to splice.

use crate::hooks::ParseHtml;
use crate::url_resolver::{document_base, rewrite_all};
use crate::IncludeError;
use hinc_dom::{Document, NodeId, Selector};
use url::Url;

/// A parsed fetch result and the node selected from it
#[derive(Debug)]
pub struct Extracted {
    pub document: Document,
    pub node: NodeId,
}

/// Body → fragment extraction
pub struct ContentExtractor {
    parse: ParseHtml,
}

impl ContentExtractor {
    pub fn new(parse: ParseHtml) -> Self {
        Self { parse }
    }

    /// Parse `body` fetched from `source` and locate the first element
    /// matching `selector`
    pub fn extract(
        &self,
        body: &str,
        selector: &str,
        source: &Url,
    ) -> Result<Extracted, IncludeError> {
        let not_found = || IncludeError::FragmentNotFound {
            selector: selector.to_string(),
            url: source.to_string(),
        };

        let selector_parsed = Selector::parse(selector).map_err(|e| {
            tracing::warn!("Invalid fragment selector {:?}: {}", selector, e);
            not_found()
        })?;

        let mut document = (self.parse)(body, source);
        let base = document_base(&document, source);
        let root = document.tree().root();
        rewrite_all(document.tree_mut(), root, &base);

        let node = selector_parsed
            .query_first(document.tree(), root)
            .ok_or_else(not_found)?;

        Ok(Extracted { document, node })
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(crate::IncludeHooks::default().parser())
    }
}
