//! smol host loop
//!
//! Performs the engine's queued fetches on the blocking thread pool, runs
//! its flush timers and feeds both back on the calling thread until the
//! page settles.

use crate::delivery::TimerId;
use crate::engine::IncludeEngine;
use crate::fetch::FetchTicket;
use hinc_net::{Fetch, NetError, Response};
use smol::channel::{self, Sender};
use std::sync::Arc;

enum Event {
    Fetched(FetchTicket, Result<Response, NetError>),
    Timer(TimerId),
}

/// Drives an [`IncludeEngine`] with a [`Fetch`] implementation
pub struct IncludeRuntime<F: Fetch> {
    engine: IncludeEngine,
    fetcher: Arc<F>,
}

impl<F: Fetch> IncludeRuntime<F> {
    pub fn new(engine: IncludeEngine, fetcher: F) -> Self {
        Self {
            engine,
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn engine(&self) -> &IncludeEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut IncludeEngine {
        &mut self.engine
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn into_engine(self) -> IncludeEngine {
        self.engine
    }

    /// Attach every include in the document and drive until settled
    pub fn run(&mut self) {
        let attached = self.engine.connect_all();
        tracing::info!("Attached {} include(s) on {}", attached, self.engine.page_url());
        self.drive();
    }

    /// Process fetches and timers until no work remains.
    ///
    /// Returns once nothing is in flight and nothing is buffered. Timers
    /// still pending at that point fire into a closed channel and are
    /// dropped.
    pub fn drive(&mut self) {
        let (tx, rx) = channel::unbounded();

        smol::block_on(async {
            loop {
                self.dispatch(&tx);
                if !self.engine.has_pending_work() {
                    break;
                }

                match rx.recv().await {
                    Ok(Event::Fetched(ticket, result)) => self.engine.complete(ticket, result),
                    Ok(Event::Timer(id)) => self.engine.fire_timer(id),
                    Err(_) => break,
                }
            }
        });

        tracing::debug!("Include runtime settled");
    }

    /// Spawn tasks for everything the engine queued
    fn dispatch(&mut self, tx: &Sender<Event>) {
        for request in self.engine.take_requests() {
            let fetcher = Arc::clone(&self.fetcher);
            let tx = tx.clone();
            tracing::debug!("GET {}", request.url);

            smol::spawn(async move {
                let url = request.url;
                let result = smol::unblock(move || fetcher.fetch(&url)).await;
                let _ = tx.send(Event::Fetched(request.ticket, result)).await;
            })
            .detach();
        }

        for timer in self.engine.take_timers() {
            let tx = tx.clone();
            smol::spawn(async move {
                smol::Timer::after(timer.delay).await;
                let _ = tx.send(Event::Timer(timer.id)).await;
            })
            .detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeliveryMode, IncludeConfig, IncludeState};
    use hinc_net::MemoryFetcher;

    #[test]
    fn test_run_renders_includes() {
        let document = hinc_html::parse(
            r#"<h-include id="a" source="/a.html"></h-include>"#,
            "http://example.com/",
        );
        let engine = IncludeEngine::builder(document)
            .config(IncludeConfig::default().with_mode(DeliveryMode::Immediate))
            .build()
            .unwrap();
        let fetcher = MemoryFetcher::new().page("http://example.com/a.html", "<p>A</p>");

        let mut runtime = IncludeRuntime::new(engine, fetcher);
        runtime.run();

        let engine = runtime.engine();
        let a = engine.document().get_element_by_id("a").unwrap();
        assert_eq!(engine.inner_html(a), "<p>A</p>");
        assert_eq!(engine.state(a), Some(IncludeState::Rendered));
        assert!(!engine.has_pending_work());
    }
}
