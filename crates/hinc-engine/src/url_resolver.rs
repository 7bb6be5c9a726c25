//! URL resolution and rewriting
//!
//! Fetched fragments are moved into a document with a different URL, so
//! every URL-bearing attribute is made absolute against the fetched
//! document's base before the move.

use crate::IncludeError;
use hinc_dom::{Document, DomTree, NodeId};
use url::Url;

/// (tag, attribute) pairs whose values are URLs
pub const URL_ATTRIBUTES: &[(&str, &str)] = &[
    ("a", "href"),
    ("area", "href"),
    ("link", "href"),
    ("base", "href"),
    ("img", "src"),
    ("img", "srcset"),
    ("source", "src"),
    ("source", "srcset"),
    ("script", "src"),
    ("iframe", "src"),
    ("embed", "src"),
    ("track", "src"),
    ("audio", "src"),
    ("video", "src"),
    ("video", "poster"),
    ("input", "src"),
    ("input", "formaction"),
    ("button", "formaction"),
    ("form", "action"),
    ("blockquote", "cite"),
    ("q", "cite"),
    ("del", "cite"),
    ("ins", "cite"),
    ("object", "data"),
    (crate::INCLUDE_TAG, crate::SOURCE_ATTR),
    (crate::INCLUDE_TAG, crate::SOURCE_ALIAS_ATTR),
];

/// Resolve a possibly-relative URL against a base
pub fn resolve(input: &str, base: &Url) -> Result<Url, IncludeError> {
    base.join(input.trim()).map_err(|e| IncludeError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an absolute URL
pub fn parse(input: &str) -> Result<Url, IncludeError> {
    Url::parse(input.trim()).map_err(|e| IncludeError::InvalidUrl {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Two URLs name the same resource when they differ at most in `#fragment`
pub fn same_resource(a: &Url, b: &Url) -> bool {
    a[..url::Position::AfterQuery] == b[..url::Position::AfterQuery]
}

/// Base URL of a fetched document: its first `<base href>`, resolved
/// against the fetch URL, or the fetch URL itself
pub fn document_base(document: &Document, fetched: &Url) -> Url {
    document
        .elements_by_tag_name("base")
        .into_iter()
        .find_map(|id| document.tree().get_attribute(id, "href"))
        .and_then(|href| fetched.join(href.trim()).ok())
        .unwrap_or_else(|| fetched.clone())
}

/// Make every registered URL attribute under `root` (inclusive) absolute.
/// Returns the number of attributes rewritten.
pub fn rewrite_all(tree: &mut DomTree, root: NodeId, base: &Url) -> usize {
    let mut targets: Vec<NodeId> = Vec::new();
    if tree.get(root).is_some_and(|n| n.is_element()) {
        targets.push(root);
    }
    targets.extend(
        tree.descendants(root)
            .filter(|&id| tree.get(id).is_some_and(|n| n.is_element())),
    );

    let mut rewritten = 0;
    for id in targets {
        let Some(tag) = tree.tag_name(id).map(str::to_ascii_lowercase) else {
            continue;
        };
        for &(_, attr) in URL_ATTRIBUTES.iter().filter(|(t, _)| *t == tag) {
            let Some(value) = tree.get_attribute(id, attr) else {
                continue;
            };
            let absolute = if attr == "srcset" {
                rewrite_srcset(value, base)
            } else {
                match rewrite_value(value, base) {
                    Some(url) => url,
                    None => continue,
                }
            };
            if absolute != value {
                tree.set_attribute(id, attr, &absolute);
                rewritten += 1;
            }
        }
    }

    tracing::trace!("Rewrote {} URL attributes against {}", rewritten, base);
    rewritten
}

/// Absolute form of one attribute value; `None` leaves the value alone
fn rewrite_value(value: &str, base: &Url) -> Option<String> {
    let trimmed = value.trim();
    // Empty and same-document references stay relative to wherever they land
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    base.join(trimmed).ok().map(String::from)
}

/// Rewrite each candidate URL of a srcset list, keeping descriptors.
///
/// Candidates are split the way HTML parses `srcset`: a URL runs to the
/// next whitespace and may itself contain commas, and only a comma outside
/// parentheses ends a descriptor list.
fn rewrite_srcset(value: &str, base: &Url) -> String {
    let mut candidates = Vec::new();
    let mut rest = value;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let url_end = rest.find(|c: char| c.is_ascii_whitespace()).unwrap_or(rest.len());
        let (mut url, tail) = rest.split_at(url_end);
        rest = tail;

        let mut descriptor = "";
        if url.ends_with(',') {
            // A trailing comma ends the candidate without descriptors
            url = url.trim_end_matches(',');
        } else {
            let end = descriptor_end(rest);
            descriptor = rest[..end].trim();
            rest = &rest[end..];
        }

        let url = rewrite_value(url, base).unwrap_or_else(|| url.to_string());
        candidates.push(if descriptor.is_empty() {
            url
        } else {
            format!("{url} {descriptor}")
        });
    }

    candidates.join(", ")
}

/// Byte offset of the comma closing a descriptor list, or the end of input
fn descriptor_end(input: &str) -> usize {
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return i,
            _ => {}
        }
    }
    input.len()
}
