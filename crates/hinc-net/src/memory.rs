//! In-memory fetcher
//!
//! Serves canned responses keyed by absolute URL. Requests are recorded so
//! callers can assert on what was fetched.

use crate::{Fetch, NetError, Response};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

/// Fetcher backed by a URL → response map
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    routes: HashMap<String, Result<Response, String>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 at `url`
    pub fn page(self, url: &str, body: &str) -> Self {
        self.respond(url, Response::new(200, body))
    }

    /// Serve an arbitrary response at `url`
    pub fn respond(mut self, url: &str, response: Response) -> Self {
        self.routes.insert(url.to_string(), Ok(response));
        self
    }

    /// Fail requests to `url` with a network error
    pub fn fail(mut self, url: &str, message: &str) -> Self {
        self.routes.insert(url.to_string(), Err(message.to_string()));
        self
    }

    /// URLs requested so far, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, url: &Url) -> Result<Response, NetError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        match self.routes.get(url.as_str()) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(message)) => Err(NetError::Network(message.clone())),
            None => Ok(Response::new(404, Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_and_recording() {
        let fetcher = MemoryFetcher::new()
            .page("http://example.com/a.html", "<p>a</p>")
            .fail("http://example.com/down.html", "connection refused");

        let a = Url::parse("http://example.com/a.html").unwrap();
        let down = Url::parse("http://example.com/down.html").unwrap();
        let missing = Url::parse("http://example.com/nope.html").unwrap();

        assert_eq!(fetcher.fetch(&a).unwrap().text(), "<p>a</p>");
        assert!(matches!(fetcher.fetch(&down), Err(NetError::Network(_))));
        assert_eq!(fetcher.fetch(&missing).unwrap().status, 404);
        assert_eq!(fetcher.requests().len(), 3);
    }
}
