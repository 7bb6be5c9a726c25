//! Include lifecycle
//!
//! `Idle → Checking → Fetching → {Rendered, Errored}`. A source change
//! re-enters `Checking` from any state without cancelling the fetch already
//! in flight.

use crate::fetch::FetchTicket;
use crate::hooks::IncludeHooks;
use crate::CLASS_PREFIX;
use hinc_dom::{DomTree, NodeId};

/// Per-element state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeState {
    Idle,
    Checking,
    Fetching,
    Rendered,
    Errored,
}

/// Engine-side record of one attached include element
#[derive(Debug)]
pub struct IncludeElement {
    node: NodeId,
    state: IncludeState,
    ticket: Option<FetchTicket>,
    hooks: IncludeHooks,
}

impl IncludeElement {
    pub(crate) fn new(node: NodeId, hooks: IncludeHooks) -> Self {
        Self {
            node,
            state: IncludeState::Idle,
            ticket: None,
            hooks,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> IncludeState {
        self.state
    }

    /// Most recently issued fetch
    pub fn ticket(&self) -> Option<FetchTicket> {
        self.ticket
    }

    pub(crate) fn hooks(&self) -> &IncludeHooks {
        &self.hooks
    }

    pub(crate) fn begin_check(&mut self) {
        self.transition(IncludeState::Checking);
    }

    pub(crate) fn begin_fetch(&mut self, ticket: FetchTicket) {
        self.ticket = Some(ticket);
        self.transition(IncludeState::Fetching);
    }

    pub(crate) fn rendered(&mut self) {
        self.transition(IncludeState::Rendered);
    }

    pub(crate) fn errored(&mut self) {
        self.transition(IncludeState::Errored);
    }

    fn transition(&mut self, to: IncludeState) {
        tracing::debug!("Include {:?}: {:?} -> {:?}", self.node, self.state, to);
        self.state = to;
    }
}

/// Replace any earlier status token on the element's class list with
/// `included_<marker>`, keeping the author's own classes
pub(crate) fn set_status_class(tree: &mut DomTree, node: NodeId, marker: &str) {
    let status = format!("{CLASS_PREFIX}{marker}");
    let mut classes: Vec<&str> = tree
        .get_attribute(node, "class")
        .map(|list| {
            list.split_ascii_whitespace()
                .filter(|c| !c.starts_with(CLASS_PREFIX))
                .collect()
        })
        .unwrap_or_default();
    classes.push(&status);
    let value = classes.join(" ");
    tree.set_attribute(node, "class", &value);
}

/// Current status token of the element, if one was set
pub(crate) fn status_class(tree: &DomTree, node: NodeId) -> Option<&str> {
    tree.get_attribute(node, "class")?
        .split_ascii_whitespace()
        .find(|c| c.starts_with(CLASS_PREFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class_replaces_previous() {
        let mut tree = DomTree::new();
        let el = tree.create_element("h-include");
        tree.set_attribute(el, "class", "sidebar included_200 wide");

        set_status_class(&mut tree, el, "404");
        assert_eq!(tree.get_attribute(el, "class"), Some("sidebar wide included_404"));
        assert_eq!(status_class(&tree, el), Some("included_404"));
    }

    #[test]
    fn test_status_class_on_bare_element() {
        let mut tree = DomTree::new();
        let el = tree.create_element("h-include");
        assert_eq!(status_class(&tree, el), None);

        set_status_class(&mut tree, el, "200");
        assert_eq!(tree.get_attribute(el, "class"), Some("included_200"));
    }

    #[test]
    fn test_transitions() {
        let mut tree = DomTree::new();
        let node = tree.create_element("h-include");
        let mut element = IncludeElement::new(node, IncludeHooks::default());
        assert_eq!(element.state(), IncludeState::Idle);

        element.begin_check();
        assert_eq!(element.state(), IncludeState::Checking);
        element.errored();
        element.begin_check();
        assert_eq!(element.state(), IncludeState::Checking);
    }
}
