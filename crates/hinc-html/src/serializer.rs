//! HTML Serialization (innerHTML/outerHTML)
//!
//! Serializes arena DOM nodes back to markup with HTML escaping and
//! void/raw-text element handling.

use hinc_dom::{DomTree, NodeData, NodeId};

/// HTML serializer
#[derive(Debug, Default)]
pub struct HtmlSerializer;

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
];

/// Raw text elements (content is not escaped)
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        let mut stack = Vec::new();
        push_children(tree, node_id, &mut stack);
        self.run(tree, stack, &mut output);
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.run(tree, vec![Step::Open(node_id)], &mut output);
        output
    }

    /// Drain the work stack; nesting depth never touches the call stack
    fn run(&self, tree: &DomTree, mut stack: Vec<Step>, output: &mut String) {
        while let Some(step) = stack.pop() {
            let node_id = match step {
                Step::Open(id) => id,
                Step::Close(id) => {
                    output.push_str("</");
                    output.push_str(tree.tag_name(id).unwrap_or_default());
                    output.push('>');
                    continue;
                }
            };
            let Some(node) = tree.get(node_id) else {
                continue;
            };

            match &node.data {
                NodeData::Document => push_children(tree, node_id, &mut stack),
                NodeData::Element(elem) => {
                    let tag = tree.resolve(elem.name);

                    output.push('<');
                    output.push_str(tag);
                    for attr in &elem.attrs {
                        output.push(' ');
                        output.push_str(tree.resolve(attr.name));
                        output.push_str("=\"");
                        escape_attribute(&attr.value, output);
                        output.push('"');
                    }
                    output.push('>');

                    if VOID_ELEMENTS.contains(&tag) {
                        continue;
                    }

                    if RAW_TEXT_ELEMENTS.contains(&tag) {
                        for (_, child) in tree.children(node_id) {
                            if let Some(text) = child.as_text() {
                                output.push_str(text);
                            }
                        }
                        output.push_str("</");
                        output.push_str(tag);
                        output.push('>');
                    } else {
                        stack.push(Step::Close(node_id));
                        push_children(tree, node_id, &mut stack);
                    }
                }
                NodeData::Text(text) => {
                    escape_text(text, output);
                }
                NodeData::Comment(text) => {
                    output.push_str("<!--");
                    output.push_str(text);
                    output.push_str("-->");
                }
                NodeData::Doctype { name, .. } => {
                    output.push_str("<!DOCTYPE ");
                    output.push_str(name);
                    output.push('>');
                }
            }
        }
    }
}

enum Step {
    Open(NodeId),
    /// End tag owed to an element whose children are written
    Close(NodeId),
}

/// Queue children so that popping yields document order
fn push_children(tree: &DomTree, parent: NodeId, stack: &mut Vec<Step>) {
    let start = stack.len();
    stack.extend(tree.children(parent).map(|(id, _)| Step::Open(id)));
    stack[start..].reverse();
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            _ => output.push(c),
        }
    }
}
