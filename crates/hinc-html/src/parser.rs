//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it into the arena DOM. The parse is
//! inert: nothing is fetched and no script runs.

use hinc_dom::{Attribute, Document, DomTree, ElementData, NodeData, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a document URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut document = Document::empty(url);
        let root = document.tree().root();
        self.convert_node(&dom.document, document.tree_mut(), root);
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        document
    }

    /// Convert an RcDom node (and its subtree) into the arena. Template
    /// contents become the template's children, which the arena treats
    /// as inert.
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        let mut stack: Vec<(Handle, NodeId)> = vec![(handle.clone(), parent)];

        while let Some((handle, parent)) = stack.pop() {
            let children_of = match &handle.data {
                RcNodeData::Document => parent,
                RcNodeData::Doctype { name, public_id, system_id } => {
                    let id = tree.alloc(NodeData::Doctype {
                        name: name.to_string(),
                        public_id: public_id.to_string(),
                        system_id: system_id.to_string(),
                    });
                    tree.append_child(parent, id);
                    continue;
                }
                RcNodeData::Text { contents } => {
                    let id = tree.create_text(&contents.borrow());
                    tree.append_child(parent, id);
                    continue;
                }
                RcNodeData::Comment { contents } => {
                    let id = tree.create_comment(contents);
                    tree.append_child(parent, id);
                    continue;
                }
                RcNodeData::Element { name, attrs, template_contents, .. } => {
                    let mut elem = ElementData::new(tree.interner_mut().intern(&name.local));
                    for attr in attrs.borrow().iter() {
                        let attr_name = tree.interner_mut().intern(&attr.name.local);
                        elem.attrs.push(Attribute {
                            name: attr_name,
                            value: attr.value.to_string(),
                        });
                    }

                    let id = tree.alloc(NodeData::Element(elem));
                    tree.append_child(parent, id);

                    if let Some(contents) = template_contents.borrow().as_ref() {
                        push_reversed(contents, id, &mut stack);
                    }
                    id
                }
                // Not produced by the HTML tree builder
                RcNodeData::ProcessingInstruction { .. } => continue,
            };
            push_reversed(&handle, children_of, &mut stack);
        }
    }
}

/// Queue the children of `handle` so that popping yields document order
fn push_reversed(handle: &Handle, parent: NodeId, stack: &mut Vec<(Handle, NodeId)>) {
    let children = handle.children.borrow();
    stack.extend(children.iter().rev().map(|child| (child.clone(), parent)));
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}
