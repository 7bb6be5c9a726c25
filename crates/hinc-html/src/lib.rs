//! hinclude HTML
//!
//! HTML5 parsing built on html5ever, and innerHTML/outerHTML serialization
//! of the arena DOM.

mod parser;
mod serializer;

pub use hinc_dom::Document;
pub use parser::HtmlParser;
pub use serializer::HtmlSerializer;

/// Parse an HTML string into a Document with the given URL
pub fn parse(html: &str, url: &str) -> Document {
    HtmlParser::new().parse_with_url(html, url)
}

/// Serialize the children of a node
pub fn inner_html(doc: &Document, node: hinc_dom::NodeId) -> String {
    HtmlSerializer::new().serialize_inner(doc.tree(), node)
}
