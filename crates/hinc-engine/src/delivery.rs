//! Delivery modes
//!
//! Immediate delivery renders each completion as it arrives. Buffered
//! delivery holds completions in a page-wide buffer and releases them in one
//! flush once every started fetch has completed or the flush timer fires,
//! whichever comes first.

use crate::config::DeliveryMode;
use crate::fetch::{Completion, FetchEvent};

/// Identifies one armed flush timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// What the engine must do after an event
#[derive(Debug, Default)]
pub struct Dispatch {
    /// Completions to render now, in completion order
    pub render: Vec<Completion>,
    /// Newly armed flush timer to schedule
    pub arm_timer: Option<TimerId>,
}

/// Page-scoped buffering state.
///
/// `outstanding` always equals fetches started minus fetches completed.
/// A buffering window opens at the first start after a flush and arms one
/// timer; the window closes at the next flush, so a timer from an earlier
/// window is ignored when it fires.
#[derive(Debug, Default)]
pub struct FlushCoordinator {
    outstanding: usize,
    buffer: Vec<Completion>,
    armed: Option<TimerId>,
    next_timer: u64,
    flushes: usize,
}

impl FlushCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a started fetch; returns a timer to arm if no window is open
    pub fn on_started(&mut self) -> Option<TimerId> {
        self.outstanding += 1;
        if self.armed.is_some() {
            return None;
        }
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.armed = Some(id);
        Some(id)
    }

    /// Buffer a completion; flushes when it was the last outstanding fetch
    pub fn on_completed(&mut self, completion: Completion) -> Vec<Completion> {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.buffer.push(completion);
        if self.outstanding == 0 {
            self.flush()
        } else {
            Vec::new()
        }
    }

    /// Flush if `id` is the timer of the open window
    pub fn on_timer(&mut self, id: TimerId) -> Vec<Completion> {
        if self.armed != Some(id) {
            tracing::trace!("Ignoring stale flush timer {:?}", id);
            return Vec::new();
        }
        tracing::debug!("Flush timer fired with {} fetches outstanding", self.outstanding);
        self.flush()
    }

    /// Release everything buffered, oldest completion first. Closes the
    /// current window. Flushing an empty buffer is a no-op.
    pub fn flush(&mut self) -> Vec<Completion> {
        self.armed = None;
        if self.buffer.is_empty() {
            return Vec::new();
        }
        self.flushes += 1;
        tracing::debug!("Flushing {} buffered includes", self.buffer.len());
        std::mem::take(&mut self.buffer)
    }

    /// Fetches started but not completed
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Completions waiting for a flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Number of non-empty flushes so far
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Timer of the open window, if any
    pub fn armed_timer(&self) -> Option<TimerId> {
        self.armed
    }
}

/// Delivery strategy selected once per page
#[derive(Debug)]
pub enum Delivery {
    Immediate,
    Buffered(FlushCoordinator),
}

impl Delivery {
    pub fn new(mode: DeliveryMode) -> Self {
        match mode {
            DeliveryMode::Immediate => Delivery::Immediate,
            DeliveryMode::Buffered => Delivery::Buffered(FlushCoordinator::new()),
        }
    }

    /// Feed a fetch lifecycle event
    pub fn observe(&mut self, event: FetchEvent) -> Dispatch {
        match (self, event) {
            (Delivery::Immediate, FetchEvent::Started { .. }) => Dispatch::default(),
            (Delivery::Immediate, FetchEvent::Completed(completion)) => Dispatch {
                render: vec![completion],
                arm_timer: None,
            },
            (Delivery::Buffered(coordinator), FetchEvent::Started { .. }) => Dispatch {
                render: Vec::new(),
                arm_timer: coordinator.on_started(),
            },
            (Delivery::Buffered(coordinator), FetchEvent::Completed(completion)) => Dispatch {
                render: coordinator.on_completed(completion),
                arm_timer: None,
            },
        }
    }

    /// A flush timer fired
    pub fn on_timer(&mut self, id: TimerId) -> Vec<Completion> {
        match self {
            Delivery::Immediate => Vec::new(),
            Delivery::Buffered(coordinator) => coordinator.on_timer(id),
        }
    }

    /// Force a flush of whatever is buffered
    pub fn flush(&mut self) -> Vec<Completion> {
        match self {
            Delivery::Immediate => Vec::new(),
            Delivery::Buffered(coordinator) => coordinator.flush(),
        }
    }

    /// Completions held back for a later flush
    pub fn pending(&self) -> usize {
        match self {
            Delivery::Immediate => 0,
            Delivery::Buffered(coordinator) => coordinator.pending(),
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        match self {
            Delivery::Immediate => DeliveryMode::Immediate,
            Delivery::Buffered(_) => DeliveryMode::Buffered,
        }
    }

    pub fn coordinator(&self) -> Option<&FlushCoordinator> {
        match self {
            Delivery::Immediate => None,
            Delivery::Buffered(coordinator) => Some(coordinator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchPipeline;
    use hinc_dom::DomTree;
    use hinc_net::Response;
    use url::Url;

    /// Start `n` fetches and return their completions in ticket order
    fn run_fetches(
        pipeline: &mut FetchPipeline,
        delivery: &mut Delivery,
        n: usize,
    ) -> (Vec<Completion>, Vec<TimerId>) {
        let mut tree = DomTree::new();
        let mut tickets = Vec::new();
        let mut timers = Vec::new();
        for i in 0..n {
            let el = tree.create_element("h-include");
            let url = Url::parse(&format!("http://example.com/{i}.html")).unwrap();
            let started = pipeline.start(el, url).unwrap();
            if let FetchEvent::Started { ticket, .. } = &started {
                tickets.push(*ticket);
            }
            timers.extend(delivery.observe(started).arm_timer);
        }
        let completions = tickets
            .into_iter()
            .map(|t| match pipeline.complete(t, Ok(Response::new(200, ""))) {
                Some(FetchEvent::Completed(c)) => c,
                _ => panic!("expected completion"),
            })
            .collect();
        (completions, timers)
    }

    fn complete(delivery: &mut Delivery, completion: Completion) -> Vec<Completion> {
        delivery.observe(FetchEvent::Completed(completion)).render
    }

    #[test]
    fn test_immediate_renders_each() {
        let mut pipeline = FetchPipeline::new();
        let mut delivery = Delivery::new(DeliveryMode::Immediate);
        let (completions, timers) = run_fetches(&mut pipeline, &mut delivery, 2);
        assert!(timers.is_empty());

        for completion in completions {
            assert_eq!(complete(&mut delivery, completion).len(), 1);
        }
    }

    #[test]
    fn test_buffered_single_flush_in_completion_order() {
        let mut pipeline = FetchPipeline::new();
        let mut delivery = Delivery::new(DeliveryMode::Buffered);
        let (mut completions, timers) = run_fetches(&mut pipeline, &mut delivery, 3);
        assert_eq!(timers.len(), 1);

        // Complete out of declaration order: 2, 0, 1
        let third = completions.remove(2);
        let first = completions.remove(0);
        let second = completions.remove(0);
        let order = vec![third.ticket, first.ticket, second.ticket];

        assert!(complete(&mut delivery, third).is_empty());
        assert!(complete(&mut delivery, first).is_empty());
        let flushed = complete(&mut delivery, second);

        assert_eq!(flushed.iter().map(|c| c.ticket).collect::<Vec<_>>(), order);
        assert_eq!(delivery.coordinator().unwrap().flushes(), 1);

        // The window is closed; the timer firing later does nothing
        assert!(delivery.on_timer(timers[0]).is_empty());
        assert_eq!(delivery.coordinator().unwrap().flushes(), 1);
    }

    #[test]
    fn test_buffered_timeout_then_late_completion() {
        let mut pipeline = FetchPipeline::new();
        let mut delivery = Delivery::new(DeliveryMode::Buffered);
        let (mut completions, timers) = run_fetches(&mut pipeline, &mut delivery, 3);

        let slow = completions.pop().unwrap();
        for completion in completions {
            assert!(complete(&mut delivery, completion).is_empty());
        }

        assert_eq!(delivery.on_timer(timers[0]).len(), 2);
        assert_eq!(delivery.coordinator().unwrap().outstanding(), 1);

        // The straggler brings the counter to zero and flushes on its own
        assert_eq!(complete(&mut delivery, slow).len(), 1);
        assert_eq!(delivery.coordinator().unwrap().flushes(), 2);
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut delivery = Delivery::new(DeliveryMode::Buffered);
        assert!(delivery.flush().is_empty());
        assert!(delivery.flush().is_empty());
        assert_eq!(delivery.coordinator().unwrap().flushes(), 0);
    }

    #[test]
    fn test_new_window_arms_new_timer() {
        let mut pipeline = FetchPipeline::new();
        let mut delivery = Delivery::new(DeliveryMode::Buffered);

        let (completions, first_timers) = run_fetches(&mut pipeline, &mut delivery, 1);
        for completion in completions {
            complete(&mut delivery, completion);
        }
        let (_, second_timers) = run_fetches(&mut pipeline, &mut delivery, 1);

        assert_eq!(first_timers.len(), 1);
        assert_eq!(second_timers.len(), 1);
        assert_ne!(first_timers[0], second_timers[0]);
    }
}
