//! Document - High-level document API

use crate::{DomTree, NodeData, NodeId, Selector, SelectorError};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a document with an empty html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.append_child(tree.root(), html);
        tree.append_child(html, head);
        tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Create an empty document (no structure); call `finalize` once filled
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Locate and cache the html/head/body elements
    pub fn finalize(&mut self) {
        let html = self
            .tree
            .children(self.tree.root())
            .find(|(id, _)| self.tree.is_element_named(*id, "html"))
            .map(|(id, _)| id)
            .unwrap_or(NodeId::NONE);

        let child_named = |tag: &str| {
            self.tree
                .children(html)
                .find(|(id, _)| self.tree.is_element_named(*id, tag))
                .map(|(id, _)| id)
                .unwrap_or(NodeId::NONE)
        };
        let head = child_named("head");
        let body = child_named("body");

        self.html_element = html;
        self.head_element = head;
        self.body_element = body;
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get document title
    pub fn title(&self) -> String {
        self.elements_by_tag_name("title")
            .first()
            .map(|&id| self.tree.text_content(id).trim().to_string())
            .unwrap_or_default()
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Content of the first `<meta name=…>` with the given name
    pub fn meta_content(&self, name: &str) -> Option<&str> {
        self.tree
            .descendants(self.tree.root())
            .filter(|&id| self.tree.is_element_named(id, "meta"))
            .find(|&id| self.tree.get_attribute(id, "name") == Some(name))
            .and_then(|id| self.tree.get_attribute(id, "content"))
    }

    /// All connected elements with a tag name, in document order
    pub fn elements_by_tag_name(&self, tag: &str) -> Vec<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .filter(|&id| self.tree.is_element_named(id, tag))
            .collect()
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .find(|&node| self.tree.get_attribute(node, "id") == Some(id))
    }

    /// First element matching a selector
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(selector.query_first(&self.tree, self.tree.root()))
    }

    /// Doctype name, if the document declares one
    pub fn doctype(&self) -> Option<&str> {
        self.tree.children(self.tree.root()).find_map(|(_, node)| match &node.data {
            NodeData::Doctype { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
