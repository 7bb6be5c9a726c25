//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: detaching a node only unlinks it, so a `NodeId`
//! stays valid for the lifetime of the tree and liveness is a question of
//! whether the node still reaches the root.
//!
//! The children of a `<template>` element are its inert content: they are
//! stored in the tree so markup round-trips, but descendant walks and
//! liveness checks do not see them.

use crate::{Attribute, ElementData, InternedString, Node, NodeData, NodeId, StringInterner};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    interner: StringInterner,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeData::Document)],
            interner: StringInterner::new(),
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Check that `id` refers to a node of this tree
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.is_valid() && id.index() < self.nodes.len()
    }

    /// Number of nodes ever allocated, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut StringInterner {
        &mut self.interner
    }

    /// Resolve an interned name
    #[inline]
    pub fn resolve(&self, s: InternedString) -> &str {
        self.interner.get(s)
    }

    /// Allocate an unlinked node
    pub fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(data));
        id
    }

    /// Create an unlinked element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = self.interner.intern(tag);
        self.alloc(NodeData::Element(ElementData::new(name)))
    }

    /// Create an unlinked text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()))
    }

    /// Create an unlinked comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            tracing::warn!("append_child with unknown node: {:?} -> {:?}", child, parent);
            return;
        }
        // A childless node cannot be an ancestor of `parent`
        let has_children = self.nodes[child.index()].first_child.is_valid();
        if parent == child || (has_children && self.ancestors(parent).any(|a| a == child)) {
            tracing::warn!("append_child would create a cycle: {:?} -> {:?}", child, parent);
            return;
        }

        self.detach(child);

        let last = self.nodes[parent.index()].last_child;
        {
            let node = &mut self.nodes[child.index()];
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.nodes[last.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        self.nodes[parent.index()].last_child = child;
    }

    /// Unlink a node (and its subtree) from its parent
    pub fn detach(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        let (parent, prev, next) = {
            let node = &self.nodes[id.index()];
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return;
        }

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }

        let node = &mut self.nodes[id.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
    }

    /// Detach every child of `parent`
    pub fn remove_children(&mut self, parent: NodeId) {
        while let Some(child) = self.get(parent).map(|n| n.first_child).filter(|c| c.is_valid()) {
            self.detach(child);
        }
    }

    /// Parent of a node, if linked
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Iterate direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next }
    }

    /// Iterate ancestors from the parent upward
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id).unwrap_or(NodeId::NONE),
        }
    }

    /// Iterate descendants in document order, excluding `id` itself.
    /// Template content is skipped unless `id` is the template.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Descendants { tree: self, scope: id, next }
    }

    /// True if the node reaches the document node through parent links
    /// without passing through template content
    pub fn is_connected(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        if id == NodeId::ROOT {
            return true;
        }
        for ancestor in self.ancestors(id) {
            if ancestor == NodeId::ROOT {
                return true;
            }
            if self.is_template(ancestor) {
                return false;
            }
        }
        false
    }

    /// Check whether `id` is a `<template>` element
    pub fn is_template(&self, id: NodeId) -> bool {
        self.is_element_named(id, "template")
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        let elem = self.get(id)?.as_element()?;
        Some(self.resolve(elem.name))
    }

    /// Check whether `id` is an element with the given tag (ASCII case-insensitive)
    pub fn is_element_named(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let key = self.interner.lookup(name)?;
        self.get(id)?.as_element()?.get_attr(key)
    }

    /// Set an attribute; returns false when `id` is not an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> bool {
        let key = self.interner.intern(name);
        match self.get_mut(id).and_then(Node::as_element_mut) {
            Some(elem) => {
                elem.set_attr(key, value.to_string());
                true
            }
            None => false,
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let key = self.interner.lookup(name)?;
        self.get_mut(id)?.as_element_mut()?.remove_attr(key)
    }

    /// Check whether the element's class list contains `class`
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get_attribute(id, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for desc in self.descendants(id) {
            if let Some(text) = self.get(desc).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }

    /// Deep-copy `node` from another tree into this one, returning the
    /// unlinked copy. Document nodes cannot be imported.
    pub fn import_node(&mut self, src: &DomTree, node: NodeId) -> Option<NodeId> {
        let data = self.import_data(src, node)?;
        let id = self.alloc(data);

        // Explicit work stack; nesting depth is unbounded in fetched markup
        let mut stack: Vec<(NodeId, NodeId)> = Vec::new();
        push_children_reversed(src, node, id, &mut stack);
        while let Some((src_node, parent)) = stack.pop() {
            let Some(data) = self.import_data(src, src_node) else {
                continue;
            };
            let copy = self.alloc(data);
            self.append_child(parent, copy);
            push_children_reversed(src, src_node, copy, &mut stack);
        }
        Some(id)
    }

    /// Node data re-interned into this tree's string table
    fn import_data(&mut self, src: &DomTree, node: NodeId) -> Option<NodeData> {
        let data = match &src.get(node)?.data {
            NodeData::Document => return None,
            NodeData::Element(elem) => {
                let mut copy = ElementData::new(self.interner.intern(src.resolve(elem.name)));
                for attr in &elem.attrs {
                    copy.attrs.push(Attribute {
                        name: self.interner.intern(src.resolve(attr.name)),
                        value: attr.value.clone(),
                    });
                }
                NodeData::Element(copy)
            }
            other => other.clone(),
        };
        Some(data)
    }

    /// Replace the children of `parent` with copies of the children of
    /// `from` in `src`
    pub fn replace_children_from(&mut self, parent: NodeId, src: &DomTree, from: NodeId) {
        self.remove_children(parent);
        let children: Vec<NodeId> = src.children(from).map(|(child, _)| child).collect();
        for child in children {
            if let Some(copy) = self.import_node(src, child) {
                self.append_child(parent, copy);
            }
        }
    }
}

/// Queue `(child, copy_parent)` pairs so that popping yields document order
fn push_children_reversed(
    src: &DomTree,
    node: NodeId,
    copy_parent: NodeId,
    stack: &mut Vec<(NodeId, NodeId)>,
) {
    let start = stack.len();
    stack.extend(src.children(node).map(|(child, _)| (child, copy_parent)));
    stack[start..].reverse();
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Iterator from a node's parent up to the document node
pub struct Ancestors<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.parent;
        Some(id)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    scope: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        let node = self.tree.get(current)?;

        if node.first_child.is_valid() && !self.tree.is_template(current) {
            self.next = node.first_child;
            return Some(current);
        }

        // Climb until a next sibling exists, never leaving the scope
        let mut cursor = current;
        self.next = NodeId::NONE;
        while cursor != self.scope {
            let Some(n) = self.tree.get(cursor) else { break };
            if n.next_sibling.is_valid() {
                self.next = n.next_sibling;
                break;
            }
            cursor = n.parent;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let p = tree.create_element("p");
        let text = tree.create_text("hi");
        tree.append_child(tree.root(), div);
        tree.append_child(div, p);
        tree.append_child(p, text);
        (tree, div, p, text)
    }

    #[test]
    fn test_append_and_children() {
        let (tree, div, p, _) = sample();
        let kids: Vec<NodeId> = tree.children(div).map(|(id, _)| id).collect();
        assert_eq!(kids, vec![p]);
        assert_eq!(tree.parent(p), Some(div));
    }

    #[test]
    fn test_detach_disconnects_subtree() {
        let (mut tree, div, p, text) = sample();
        assert!(tree.is_connected(text));

        tree.detach(p);
        assert!(!tree.is_connected(text));
        assert!(tree.is_connected(div));
        assert_eq!(tree.children(div).count(), 0);
    }

    #[test]
    fn test_descendants_preorder() {
        let (tree, div, p, text) = sample();
        let order: Vec<NodeId> = tree.descendants(tree.root()).collect();
        assert_eq!(order, vec![div, p, text]);
        assert_eq!(tree.descendants(p).collect::<Vec<_>>(), vec![text]);
    }

    #[test]
    fn test_append_rejects_cycle() {
        let (mut tree, div, p, _) = sample();
        tree.append_child(p, div);
        assert_eq!(tree.parent(div), Some(tree.root()));
    }

    #[test]
    fn test_import_node_reinterns_names() {
        let (src, div, _, _) = sample();
        let mut dst = DomTree::new();
        let copy = dst.import_node(&src, div).unwrap();

        assert_eq!(dst.tag_name(copy), Some("div"));
        assert_eq!(dst.text_content(copy), "hi");
        assert!(!dst.is_connected(copy));
    }

    #[test]
    fn test_template_content_is_inert() {
        let (mut tree, div, _, _) = sample();
        let template = tree.create_element("template");
        let inner = tree.create_element("span");
        let after = tree.create_element("em");
        tree.append_child(div, template);
        tree.append_child(template, inner);
        tree.append_child(div, after);

        assert!(tree.is_connected(template));
        assert!(!tree.is_connected(inner));
        let walked: Vec<NodeId> = tree.descendants(div).collect();
        assert!(walked.contains(&template) && walked.contains(&after));
        assert!(!walked.contains(&inner));
        assert_eq!(tree.descendants(template).collect::<Vec<_>>(), vec![inner]);
        assert_eq!(tree.children(template).count(), 1);
    }

    #[test]
    fn test_import_deep_chain() {
        let mut src = DomTree::new();
        let mut parent = src.root();
        for _ in 0..100_000 {
            let div = src.create_element("div");
            src.append_child(parent, div);
            parent = div;
        }
        let leaf = src.create_text("bottom");
        src.append_child(parent, leaf);
        let top = src.children(src.root()).next().map(|(id, _)| id).unwrap();

        let mut dst = DomTree::new();
        let copy = dst.import_node(&src, top).unwrap();
        assert_eq!(dst.descendants(copy).count(), 100_000);
        assert_eq!(dst.text_content(copy), "bottom");
    }

    #[test]
    fn test_attributes_and_classes() {
        let (mut tree, div, _, _) = sample();
        assert!(tree.set_attribute(div, "class", "a included_200"));
        assert!(tree.has_class(div, "included_200"));
        assert_eq!(tree.remove_attribute(div, "class").as_deref(), Some("a included_200"));
        assert!(!tree.has_class(div, "a"));
    }
}
