//! hinclude Engine
//!
//! Declarative `<h-include>` elements: each one fetches a remote HTML
//! document, extracts a fragment from it and splices the fragment's markup
//! into itself. Included content may contain further includes.
//!
//! The engine is sans-IO. It queues [`FetchRequest`]s and [`TimerRequest`]s
//! for the host and is fed completions and timer firings back;
//! [`IncludeRuntime`] is a ready-made host loop on smol.
//!
//! # Example
//! ```rust,ignore
//! use hinc_engine::{IncludeEngine, IncludeRuntime};
//! use hinc_net::ResourceLoader;
//!
//! let document = hinc_html::parse(&markup, "https://example.com/");
//! let engine = IncludeEngine::new(document)?;
//! let mut runtime = IncludeRuntime::new(engine, ResourceLoader::new()?);
//! runtime.run();
//! ```

mod config;
mod delivery;
mod engine;
mod error;
mod extract;
mod fetch;
mod hooks;
mod lifecycle;
mod media;
mod recursion;
mod runtime;
pub mod url_resolver;

pub use config::{DeliveryMode, IncludeConfig};
pub use delivery::{Delivery, Dispatch, FlushCoordinator, TimerId};
pub use engine::{IncludeEngine, IncludeEngineBuilder, TimerRequest};
pub use error::IncludeError;
pub use extract::{ContentExtractor, Extracted};
pub use fetch::{Completion, FetchEvent, FetchPipeline, FetchRequest, FetchTicket};
pub use hooks::{IncludeHooks, OnSuccess, ParseHtml};
pub use lifecycle::{IncludeElement, IncludeState};
pub use media::{AllMedia, MediaMatcher, MediaType, Viewport};
pub use recursion::check_recursion;
pub use runtime::IncludeRuntime;

/// Tag name of the include element
pub const INCLUDE_TAG: &str = "h-include";

/// Attribute holding the URL to fetch
pub const SOURCE_ATTR: &str = "source";

/// Shorthand source attribute, read when `source` is absent
pub const SOURCE_ALIAS_ATTR: &str = "src";

/// Attribute holding the fragment selector
pub const FRAGMENT_ATTR: &str = "fragment";

/// Attribute holding the media query gate
pub const MEDIA_ATTR: &str = "media";

/// Fragment extracted when the element names none
pub const DEFAULT_FRAGMENT: &str = "body";

/// Prefix of the status class token
pub const CLASS_PREFIX: &str = "included_";

/// Status marker used for failures that carry no HTTP status
pub const ERROR_MARKER: &str = "error";

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Raw source attribute of an include element
pub fn source_attribute(tree: &hinc_dom::DomTree, node: hinc_dom::NodeId) -> Option<&str> {
    tree.get_attribute(node, SOURCE_ATTR)
        .or_else(|| tree.get_attribute(node, SOURCE_ALIAS_ATTR))
}
