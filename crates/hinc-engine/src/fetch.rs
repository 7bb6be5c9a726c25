//! Fetch pipeline
//!
//! Issues one GET per include activation and reports a `Started` event
//! right away and a `Completed` event once the host hands the result back.
//! Requests are queued for the host to perform; nothing here does I/O.

use crate::IncludeError;
use hinc_dom::NodeId;
use hinc_net::{NetError, Response};
use std::collections::{HashMap, VecDeque};
use url::Url;

/// Identifies one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// A GET the host must perform and report back with the same ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub url: Url,
}

/// Finished fetch, owned by whoever renders it
#[derive(Debug)]
pub struct Completion {
    pub ticket: FetchTicket,
    pub element: NodeId,
    pub url: Url,
    pub result: Result<Response, NetError>,
}

/// Lifecycle events observed by the delivery mode
#[derive(Debug)]
pub enum FetchEvent {
    Started { ticket: FetchTicket, element: NodeId },
    Completed(Completion),
}

#[derive(Debug)]
struct InFlight {
    element: NodeId,
    url: Url,
}

/// Tracks issued and in-flight fetches
#[derive(Debug, Default)]
pub struct FetchPipeline {
    next_ticket: u64,
    outbox: VecDeque<FetchRequest>,
    in_flight: HashMap<FetchTicket, InFlight>,
}

impl FetchPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a GET for `element`.
    ///
    /// Inline `data:` payloads are refused rather than spliced in unchecked.
    pub fn start(&mut self, element: NodeId, url: Url) -> Result<FetchEvent, IncludeError> {
        if url.scheme().eq_ignore_ascii_case("data") {
            return Err(IncludeError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
                url: url.to_string(),
            });
        }

        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;

        tracing::info!("Include fetch {:?} for {:?}: GET {}", ticket, element, url);

        self.outbox.push_back(FetchRequest { ticket, url: url.clone() });
        self.in_flight.insert(ticket, InFlight { element, url });

        Ok(FetchEvent::Started { ticket, element })
    }

    /// Drain requests issued since the last call, oldest first
    pub fn take_requests(&mut self) -> Vec<FetchRequest> {
        self.outbox.drain(..).collect()
    }

    /// Record the result of a fetch. Unknown or already-completed tickets
    /// yield `None`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<Response, NetError>,
    ) -> Option<FetchEvent> {
        let Some(InFlight { element, url }) = self.in_flight.remove(&ticket) else {
            tracing::warn!("Completion for unknown fetch {:?}", ticket);
            return None;
        };

        match &result {
            Ok(response) => {
                tracing::debug!("Fetch {:?} finished: HTTP {} {}", ticket, response.status, url)
            }
            Err(e) => tracing::debug!("Fetch {:?} failed: {} ({})", ticket, url, e),
        }

        Some(FetchEvent::Completed(Completion { ticket, element, url, result }))
    }

    /// Fetches started but not yet completed
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Check whether a ticket is still outstanding
    pub fn is_in_flight(&self, ticket: FetchTicket) -> bool {
        self.in_flight.contains_key(&ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hinc_dom::DomTree;

    fn element() -> NodeId {
        let mut tree = DomTree::new();
        tree.create_element("h-include")
    }

    #[test]
    fn test_start_queues_request() {
        let mut pipeline = FetchPipeline::new();
        let url = Url::parse("http://example.com/a.html").unwrap();

        let event = pipeline.start(element(), url.clone()).unwrap();
        let FetchEvent::Started { ticket, .. } = event else {
            panic!("expected Started");
        };

        let requests = pipeline.take_requests();
        assert_eq!(requests, vec![FetchRequest { ticket, url }]);
        assert!(pipeline.take_requests().is_empty());
        assert_eq!(pipeline.in_flight(), 1);
    }

    #[test]
    fn test_data_scheme_rejected() {
        let mut pipeline = FetchPipeline::new();
        let url = Url::parse("data:text/html,<p>hi</p>").unwrap();

        assert!(matches!(
            pipeline.start(element(), url),
            Err(IncludeError::UnsupportedScheme { .. })
        ));
        assert_eq!(pipeline.in_flight(), 0);
        assert!(pipeline.take_requests().is_empty());
    }

    #[test]
    fn test_complete_once() {
        let mut pipeline = FetchPipeline::new();
        let url = Url::parse("http://example.com/a.html").unwrap();
        let FetchEvent::Started { ticket, .. } = pipeline.start(element(), url).unwrap() else {
            panic!("expected Started");
        };

        let first = pipeline.complete(ticket, Ok(Response::new(200, "<p>x</p>")));
        assert!(matches!(first, Some(FetchEvent::Completed(_))));
        assert!(pipeline.complete(ticket, Ok(Response::new(200, ""))).is_none());
        assert!(!pipeline.is_in_flight(ticket));
    }
}
