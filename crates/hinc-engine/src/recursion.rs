//! Recursion guard
//!
//! An include may not fetch the page it lives in, nor the source of any
//! include it is nested inside. Ancestors are walked live on every check
//! because the tree can change between checks.

use crate::url_resolver::{resolve, same_resource};
use crate::{source_attribute, IncludeError, INCLUDE_TAG};
use hinc_dom::{DomTree, NodeId};
use url::Url;

/// Fail with `Recursion` if fetching `source` for `element` would cycle.
///
/// `base` resolves ancestor sources that are still relative; `page` is the
/// hosting document's own URL.
pub fn check_recursion(
    tree: &DomTree,
    element: NodeId,
    source: &Url,
    page: &Url,
    base: &Url,
) -> Result<(), IncludeError> {
    if same_resource(source, page) {
        return Err(IncludeError::Recursion { url: source.to_string() });
    }

    for ancestor in tree.ancestors(element) {
        if !tree.is_element_named(ancestor, INCLUDE_TAG) {
            continue;
        }
        let Some(src) = source_attribute(tree, ancestor) else {
            continue;
        };
        let Ok(ancestor_source) = resolve(src, base) else {
            continue;
        };
        if same_resource(source, &ancestor_source) {
            tracing::debug!("{:?} repeats the source of ancestor {:?}", element, ancestor);
            return Err(IncludeError::Recursion { url: source.to_string() });
        }
    }

    Ok(())
}
