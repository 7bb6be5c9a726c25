//! Include engine
//!
//! Page-scoped coordinator: owns the hosting document, the fetch pipeline,
//! the delivery mode and one lifecycle record per attached include. All
//! mutation happens through `&mut self`, i.e. on the host's single event
//! thread.

use crate::config::IncludeConfig;
use crate::delivery::{Delivery, Dispatch, TimerId};
use crate::extract::ContentExtractor;
use crate::fetch::{Completion, FetchEvent, FetchPipeline, FetchRequest, FetchTicket};
use crate::hooks::IncludeHooks;
use crate::lifecycle::{self, IncludeElement, IncludeState};
use crate::media::{MediaMatcher, Viewport};
use crate::recursion::check_recursion;
use crate::url_resolver::{self, document_base, resolve};
use crate::{
    DEFAULT_FRAGMENT, FRAGMENT_ATTR, INCLUDE_TAG, IncludeError, MEDIA_ATTR, SOURCE_ALIAS_ATTR,
    SOURCE_ATTR, source_attribute,
};
use hinc_dom::{Document, NodeId};
use hinc_html::HtmlSerializer;
use hinc_net::{NetError, Response};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// A flush timer the host must schedule, then report via `fire_timer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub id: TimerId,
    pub delay: Duration,
}

/// Builder for [`IncludeEngine`]
pub struct IncludeEngineBuilder {
    document: Document,
    config: Option<IncludeConfig>,
    media: Box<dyn MediaMatcher>,
    hooks: IncludeHooks,
}

impl IncludeEngineBuilder {
    /// Use this configuration instead of reading the page's meta elements
    pub fn config(mut self, config: IncludeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn media(mut self, media: impl MediaMatcher + 'static) -> Self {
        self.media = Box::new(media);
        self
    }

    /// Page-wide hooks; per-element hooks set with `set_hooks` take precedence
    pub fn hooks(mut self, hooks: IncludeHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> Result<IncludeEngine, IncludeError> {
        let page_url = url_resolver::parse(self.document.url())?;
        let base_url = document_base(&self.document, &page_url);
        let config = self
            .config
            .unwrap_or_else(|| IncludeConfig::from_document(&self.document));

        tracing::debug!("Include engine for {} ({:?} delivery)", page_url, config.mode);

        Ok(IncludeEngine {
            document: self.document,
            page_url,
            base_url,
            delivery: Delivery::new(config.mode),
            config,
            media: self.media,
            hooks: self.hooks,
            overrides: HashMap::new(),
            pipeline: FetchPipeline::new(),
            elements: HashMap::new(),
            timers: Vec::new(),
        })
    }
}

/// Page-scoped include engine
pub struct IncludeEngine {
    document: Document,
    page_url: Url,
    /// Page URL adjusted by the page's own `<base href>`
    base_url: Url,
    config: IncludeConfig,
    media: Box<dyn MediaMatcher>,
    hooks: IncludeHooks,
    overrides: HashMap<NodeId, IncludeHooks>,
    pipeline: FetchPipeline,
    delivery: Delivery,
    elements: HashMap<NodeId, IncludeElement>,
    timers: Vec<TimerRequest>,
}

impl IncludeEngine {
    /// Engine configured from the document's own meta elements
    pub fn new(document: Document) -> Result<Self, IncludeError> {
        Self::builder(document).build()
    }

    pub fn builder(document: Document) -> IncludeEngineBuilder {
        IncludeEngineBuilder {
            document,
            config: None,
            media: Box::new(Viewport::default()),
            hooks: IncludeHooks::default(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct document access. Source changes made here are not observed;
    /// use `set_attribute` for those.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn config(&self) -> &IncludeConfig {
        &self.config
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Attach every connected include element not yet attached, in
    /// document order. Returns how many were attached.
    pub fn connect_all(&mut self) -> usize {
        let pending: Vec<NodeId> = self
            .document
            .elements_by_tag_name(INCLUDE_TAG)
            .into_iter()
            .filter(|id| !self.elements.contains_key(id))
            .collect();

        for &node in &pending {
            if let Err(e) = self.attach(node) {
                tracing::warn!("Could not attach {:?}: {}", node, e);
            }
        }
        pending.len()
    }

    /// Element hooks for `node`, applied when it next attaches
    pub fn set_hooks(&mut self, node: NodeId, hooks: IncludeHooks) {
        self.overrides.insert(node, hooks);
    }

    /// Lifecycle entry point for an include element joining the document
    pub fn attach(&mut self, node: NodeId) -> Result<(), IncludeError> {
        let tree = self.document.tree();
        if !tree.is_element_named(node, INCLUDE_TAG) {
            return Err(IncludeError::NotAnInclude(node));
        }
        if !tree.is_connected(node) {
            tracing::debug!("Ignoring attach of detached include {:?}", node);
            return Ok(());
        }
        if self.elements.contains_key(&node) {
            self.activate(node);
            return Ok(());
        }

        let hooks = self
            .overrides
            .remove(&node)
            .unwrap_or_default()
            .or(&self.hooks);
        self.elements.insert(node, IncludeElement::new(node, hooks));
        self.activate(node);
        Ok(())
    }

    /// Re-run the fetch cycle for an include, attaching it if needed
    pub fn refresh(&mut self, node: NodeId) -> Result<(), IncludeError> {
        if !self.elements.contains_key(&node) {
            return self.attach(node);
        }
        self.activate(node);
        Ok(())
    }

    /// Set an attribute; changing an attached include's source refreshes it
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.document.tree_mut().set_attribute(node, name, value);
        if (name == SOURCE_ATTR || name == SOURCE_ALIAS_ATTR) && self.elements.contains_key(&node) {
            self.activate(node);
        }
    }

    /// Remove a node from the document. Includes inside it stop being
    /// tracked; their in-flight fetches still settle but render nothing.
    pub fn remove(&mut self, node: NodeId) {
        self.forget(node);
        self.forget_descendants(node);
        self.document.tree_mut().detach(node);
    }

    /// Requests issued since the last call
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.pipeline.take_requests()
    }

    /// Flush timers armed since the last call
    pub fn take_timers(&mut self) -> Vec<TimerRequest> {
        std::mem::take(&mut self.timers)
    }

    /// Deliver the result of a fetch issued through `take_requests`
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Response, NetError>) {
        if let Some(event) = self.pipeline.complete(ticket, result) {
            let dispatch = self.delivery.observe(event);
            self.dispatch(dispatch);
        }
    }

    /// A timer from `take_timers` elapsed
    pub fn fire_timer(&mut self, id: TimerId) {
        let completions = self.delivery.on_timer(id);
        self.render_all(completions);
    }

    /// Render whatever is buffered right now
    pub fn flush(&mut self) {
        let completions = self.delivery.flush();
        self.render_all(completions);
    }

    /// True while fetches are in flight or completions await a flush
    pub fn has_pending_work(&self) -> bool {
        self.pipeline.in_flight() > 0 || self.delivery.pending() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.pipeline.in_flight()
    }

    pub fn element(&self, node: NodeId) -> Option<&IncludeElement> {
        self.elements.get(&node)
    }

    pub fn state(&self, node: NodeId) -> Option<IncludeState> {
        self.elements.get(&node).map(IncludeElement::state)
    }

    /// Current `included_*` status token of an element
    pub fn status_class(&self, node: NodeId) -> Option<&str> {
        lifecycle::status_class(self.document.tree(), node)
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        HtmlSerializer::new().serialize_inner(self.document.tree(), node)
    }

    /// Checking: resolve, guard against recursion, apply the media gate,
    /// then start the fetch
    fn activate(&mut self, node: NodeId) {
        let Some(element) = self.elements.get_mut(&node) else {
            return;
        };
        element.begin_check();

        let source = match self.check(node) {
            Ok(Some(source)) => source,
            Ok(None) => {
                tracing::debug!("Include {:?} inert: media query does not match", node);
                if let Some(element) = self.elements.get_mut(&node) {
                    element.errored();
                }
                return;
            }
            Err(e) => return self.fail(node, e),
        };

        match self.pipeline.start(node, source) {
            Ok(event) => {
                if let (FetchEvent::Started { ticket, .. }, Some(element)) =
                    (&event, self.elements.get_mut(&node))
                {
                    element.begin_fetch(*ticket);
                }
                let dispatch = self.delivery.observe(event);
                self.dispatch(dispatch);
            }
            Err(e) => self.fail(node, e),
        }
    }

    /// Resolved source to fetch, `None` when the media gate closes it
    fn check(&self, node: NodeId) -> Result<Option<Url>, IncludeError> {
        let tree = self.document.tree();
        let src = source_attribute(tree, node).ok_or(IncludeError::MissingSource(node))?;
        let source = resolve(src, &self.base_url)?;

        check_recursion(tree, node, &source, &self.page_url, &self.base_url)?;

        if let Some(media) = tree.get_attribute(node, MEDIA_ATTR) {
            if !self.media.matches(media) {
                return Ok(None);
            }
        }
        Ok(Some(source))
    }

    fn dispatch(&mut self, dispatch: Dispatch) {
        if let Some(id) = dispatch.arm_timer {
            tracing::debug!("Arming flush timer {:?} for {:?}", id, self.config.timeout);
            self.timers.push(TimerRequest {
                id,
                delay: self.config.timeout,
            });
        }
        self.render_all(dispatch.render);
    }

    fn render_all(&mut self, completions: Vec<Completion>) {
        for completion in completions {
            self.render(completion);
        }
    }

    /// Splice one completed fetch into its element
    fn render(&mut self, completion: Completion) {
        let Completion { element: node, url, result, .. } = completion;

        // The element may have been removed while its fetch was in flight
        if !self.document.tree().is_connected(node) || !self.elements.contains_key(&node) {
            tracing::debug!("Dropping delivery for detached include {:?}", node);
            return;
        }

        let response = match result {
            Ok(response) => response,
            Err(source) => {
                return self.fail(node, IncludeError::Transport { url: url.to_string(), source });
            }
        };
        if !matches!(response.status, 200 | 304) {
            let error = IncludeError::Http {
                status: response.status,
                url: url.to_string(),
            };
            return self.fail(node, error);
        }

        let selector = self
            .document
            .tree()
            .get_attribute(node, FRAGMENT_ATTR)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_FRAGMENT)
            .to_string();
        let hooks = match self.elements.get(&node) {
            Some(element) => element.hooks().clone(),
            None => return,
        };

        let extractor = ContentExtractor::new(hooks.parser());
        let extracted = match extractor.extract(&response.text(), &selector, &url) {
            Ok(extracted) => extracted,
            Err(e) => return self.fail(node, e),
        };

        // Includes inside the content being replaced leave with it
        self.forget_descendants(node);
        let tree = self.document.tree_mut();
        tree.replace_children_from(node, extracted.document.tree(), extracted.node);
        lifecycle::set_status_class(tree, node, &response.status.to_string());
        if let Some(element) = self.elements.get_mut(&node) {
            element.rendered();
        }
        tracing::debug!("Include {:?} rendered {} from {}", node, selector, url);

        if let Some(on_success) = &hooks.on_success {
            on_success(&self.document, node);
        }

        self.attach_nested(node);
    }

    /// Drop the records of every include below `node`
    fn forget_descendants(&mut self, node: NodeId) {
        let below: Vec<NodeId> = self.document.tree().descendants(node).collect();
        for id in below {
            self.forget(id);
        }
    }

    fn forget(&mut self, id: NodeId) {
        self.overrides.remove(&id);
        if self.elements.remove(&id).is_some() {
            tracing::debug!("Include {:?} removed", id);
        }
    }

    /// Included content may itself contain includes
    fn attach_nested(&mut self, node: NodeId) {
        let tree = self.document.tree();
        let nested: Vec<NodeId> = tree
            .descendants(node)
            .filter(|&id| tree.is_element_named(id, INCLUDE_TAG))
            .collect();

        for id in nested {
            if let Err(e) = self.attach(id) {
                tracing::warn!("Could not attach nested include {:?}: {}", id, e);
            }
        }
    }

    /// Contain an include error: status class, log line, `Errored` state
    fn fail(&mut self, node: NodeId, error: IncludeError) {
        tracing::warn!("Include {:?} failed: {}", node, error);
        if self.document.tree().is_connected(node) {
            lifecycle::set_status_class(self.document.tree_mut(), node, &error.status_marker());
        }
        if let Some(element) = self.elements.get_mut(&node) {
            element.errored();
        }
    }
}

impl std::fmt::Debug for IncludeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncludeEngine")
            .field("page_url", &self.page_url.as_str())
            .field("config", &self.config)
            .field("elements", &self.elements.len())
            .field("in_flight", &self.pipeline.in_flight())
            .finish()
    }
}
