//! Per-include customization
//!
//! Each field is optional and falls back to the built-in behaviour. Hooks
//! are resolved once when an element attaches.

use hinc_dom::{Document, NodeId};
use hinc_html::HtmlParser;
use std::fmt;
use std::rc::Rc;
use url::Url;

/// Parses a fetched body into an isolated document
pub type ParseHtml = Rc<dyn Fn(&str, &Url) -> Document>;

/// Called after an include renders new content
pub type OnSuccess = Rc<dyn Fn(&Document, NodeId)>;

/// Optional overrides for parsing and success notification
#[derive(Clone, Default)]
pub struct IncludeHooks {
    pub parse_html: Option<ParseHtml>,
    pub on_success: Option<OnSuccess>,
}

impl IncludeHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse_html(mut self, parse: impl Fn(&str, &Url) -> Document + 'static) -> Self {
        self.parse_html = Some(Rc::new(parse));
        self
    }

    pub fn with_on_success(mut self, callback: impl Fn(&Document, NodeId) + 'static) -> Self {
        self.on_success = Some(Rc::new(callback));
        self
    }

    /// Fill unset fields from `fallback`
    pub(crate) fn or(&self, fallback: &IncludeHooks) -> IncludeHooks {
        IncludeHooks {
            parse_html: self.parse_html.clone().or_else(|| fallback.parse_html.clone()),
            on_success: self.on_success.clone().or_else(|| fallback.on_success.clone()),
        }
    }

    /// Parser to use, defaulting to the html5ever parser
    pub(crate) fn parser(&self) -> ParseHtml {
        self.parse_html.clone().unwrap_or_else(|| {
            Rc::new(|body: &str, url: &Url| HtmlParser::new().parse_with_url(body, url.as_str()))
        })
    }
}

impl fmt::Debug for IncludeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeHooks")
            .field("parse_html", &self.parse_html.is_some())
            .field("on_success", &self.on_success.is_some())
            .finish()
    }
}
