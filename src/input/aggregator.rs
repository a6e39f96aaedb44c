//! Merging raw backend events into one deduplicated token stream

use super::{normalize, BackendError, InputBackend, InputEventType, RawEvent, Token, TokenEvent};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long [`InputThread::stop`] waits for the thread by default
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(1);

/// Builds a backend on the aggregator thread
pub type BackendFactory =
    Box<dyn FnOnce() -> Result<Box<dyn InputBackend>, BackendError> + Send + 'static>;

/// Watch-set filter and per-token press deduplication
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    watch: HashSet<Token>,
    down: HashSet<Token>,
}

impl Aggregator {
    pub fn new(watch: HashSet<Token>) -> Self {
        Self {
            watch,
            down: HashSet::new(),
        }
    }

    pub fn watch_set(&self) -> &HashSet<Token> {
        &self.watch
    }

    pub fn is_down(&self, token: &Token) -> bool {
        self.down.contains(token)
    }

    /// Process one raw event and return the notification to forward, if any.
    ///
    /// A press is forwarded only when the token was not already down, no
    /// matter which backend reported it. Releases of watched tokens are
    /// always forwarded.
    pub fn process(&mut self, event: &RawEvent, now: Instant) -> Option<TokenEvent> {
        let token = normalize(&event.input)?;
        if !self.watch.contains(&token) {
            return None;
        }

        match event.event_type {
            InputEventType::Press => {
                if !self.down.insert(token.clone()) {
                    return None;
                }
            }
            InputEventType::Release => {
                self.down.remove(&token);
            }
        }

        Some(TokenEvent::new(token, event.event_type, now))
    }

    /// Forget every held token
    pub fn reset(&mut self) {
        self.down.clear();
    }
}

/// Handle to the background thread that polls backends and feeds the aggregator
pub struct InputThread {
    stop_tx: Option<Sender<()>>,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
}

impl InputThread {
    /// Spawn the `input-aggregator` thread.
    ///
    /// Backends are built on the new thread from `factories`; one that fails
    /// to start is logged and skipped. Token events are sent on `events`
    /// until [`stop`](Self::stop) is called or the receiver is dropped.
    pub fn spawn(
        aggregator: Aggregator,
        factories: Vec<BackendFactory>,
        poll_interval: Duration,
        events: Sender<TokenEvent>,
    ) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("input-aggregator".to_string())
            .spawn(move || {
                let backends = start_backends(factories);
                run(aggregator, backends, poll_interval, &stop_rx, &events);
                let _ = done_tx.send(());
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            done_rx,
            handle: Some(handle),
        })
    }

    /// True until the thread has been stopped or has exited on its own
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Ask the thread to exit and wait up to `timeout` for it.
    ///
    /// Returns true when the thread finished in time and was joined. A
    /// thread that does not answer is detached.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        let Some(handle) = self.handle.take() else {
            return true;
        };
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        match self.done_rx.recv_timeout(timeout) {
            // A disconnected channel means the thread is already gone
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if handle.join().is_err() {
                    warn!("input thread panicked");
                }
                info!("input thread stopped");
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "input thread did not stop within {:?}, detaching",
                    timeout
                );
                false
            }
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.stop(DEFAULT_STOP_TIMEOUT);
    }
}

/// Build every backend, skipping those that fail or panic during start-up
fn start_backends(factories: Vec<BackendFactory>) -> Vec<Box<dyn InputBackend>> {
    let mut backends = Vec::new();
    for factory in factories {
        match panic::catch_unwind(AssertUnwindSafe(factory)) {
            Ok(Ok(backend)) => {
                info!("input backend '{}' started", backend.name());
                backends.push(backend);
            }
            Ok(Err(e)) => warn!("input backend skipped: {}", e),
            Err(_) => warn!("input backend panicked during start-up, skipped"),
        }
    }
    if backends.is_empty() {
        warn!("no input backend available, counters will not change");
    }
    backends
}

fn run(
    mut aggregator: Aggregator,
    mut backends: Vec<Box<dyn InputBackend>>,
    poll_interval: Duration,
    stop_rx: &Receiver<()>,
    events: &Sender<TokenEvent>,
) {
    let mut raw = Vec::new();

    'poll: loop {
        backends.retain_mut(|backend| match backend.poll(&mut raw) {
            Ok(()) => true,
            Err(e) => {
                warn!("disabling input backend '{}': {}", backend.name(), e);
                if let Err(e) = backend.stop() {
                    warn!("input backend '{}' failed to stop: {}", backend.name(), e);
                }
                false
            }
        });

        let now = Instant::now();
        for event in raw.drain(..) {
            if let Some(token_event) = aggregator.process(&event, now) {
                debug!("{:?} {}", token_event.event_type, token_event.token);
                if events.send(token_event).is_err() {
                    debug!("event receiver dropped, input thread exiting");
                    break 'poll;
                }
            }
        }

        match stop_rx.recv_timeout(poll_interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    for backend in &mut backends {
        if let Err(e) = backend.stop() {
            warn!("input backend '{}' failed to stop: {}", backend.name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseButton, RawInput};
    use std::sync::{Arc, Mutex};

    fn token(name: &str) -> Token {
        Token::from_name(name).unwrap()
    }

    fn watching(names: &[&str]) -> Aggregator {
        Aggregator::new(names.iter().map(|n| token(n)).collect())
    }

    /// Backend that replays events pushed through a channel
    struct ScriptedBackend {
        rx: Receiver<RawEvent>,
        stopped: Arc<Mutex<bool>>,
    }

    impl InputBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn poll(&mut self, out: &mut Vec<RawEvent>) -> Result<(), BackendError> {
            out.extend(self.rx.try_iter());
            Ok(())
        }

        fn stop(&mut self) -> Result<(), BackendError> {
            *self.stopped.lock().unwrap() = true;
            Ok(())
        }
    }

    struct FailingBackend;

    impl InputBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn poll(&mut self, _out: &mut Vec<RawEvent>) -> Result<(), BackendError> {
            Err(BackendError::Unavailable {
                backend: "failing",
                reason: "test".to_string(),
            })
        }
    }

    fn scripted() -> (Sender<RawEvent>, Arc<Mutex<bool>>, BackendFactory) {
        let (tx, rx) = mpsc::channel();
        let stopped = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&stopped);
        let factory: BackendFactory = Box::new(move || {
            Ok(Box::new(ScriptedBackend { rx, stopped: flag }) as Box<dyn InputBackend>)
        });
        (tx, stopped, factory)
    }

    #[test]
    fn duplicate_press_suppressed_across_backends() {
        let mut agg = watching(&["q"]);
        let now = Instant::now();

        // Same key reported by two backends in different vocabularies
        let first = agg.process(&RawEvent::press(RawInput::Char('q')), now);
        let second = agg.process(&RawEvent::press(RawInput::Code(0x51)), now);

        assert!(first.is_some_and(|e| e.is_press()));
        assert!(second.is_none());
        assert!(agg.is_down(&token("q")));
    }

    #[test]
    fn press_after_release_is_forwarded_again() {
        let mut agg = watching(&["q"]);
        let now = Instant::now();

        assert!(agg.process(&RawEvent::press(RawInput::Char('q')), now).is_some());
        assert!(agg.process(&RawEvent::release(RawInput::Char('q')), now).is_some());
        assert!(agg.process(&RawEvent::press(RawInput::Char('q')), now).is_some());
    }

    #[test]
    fn release_forwarded_unconditionally() {
        let mut agg = watching(&["q"]);
        let now = Instant::now();

        let first = agg.process(&RawEvent::release(RawInput::Char('q')), now);
        let second = agg.process(&RawEvent::release(RawInput::Char('Q')), now);

        assert_eq!(first.map(|e| e.event_type), Some(InputEventType::Release));
        assert_eq!(second.map(|e| e.event_type), Some(InputEventType::Release));
    }

    #[test]
    fn unwatched_and_unknown_inputs_dropped() {
        let mut agg = watching(&["q", "mouse4"]);
        let now = Instant::now();

        assert!(agg.process(&RawEvent::press(RawInput::Char('w')), now).is_none());
        assert!(agg.process(&RawEvent::release(RawInput::Char('w')), now).is_none());
        assert!(agg.process(&RawEvent::press(RawInput::Code(0x30)), now).is_none());
        assert!(agg
            .process(&RawEvent::press(RawInput::Mouse(MouseButton::X1)), now)
            .is_some());
    }

    #[test]
    fn event_carries_observation_time() {
        let mut agg = watching(&["e"]);
        let now = Instant::now();
        let event = agg.process(&RawEvent::press(RawInput::Char('e')), now).unwrap();
        assert_eq!(event.timestamp, now);
        assert_eq!(event.token, token("e"));
    }

    #[test]
    fn reset_clears_held_tokens() {
        let mut agg = watching(&["q"]);
        agg.process(&RawEvent::press(RawInput::Char('q')), Instant::now());
        agg.reset();
        assert!(!agg.is_down(&token("q")));
    }

    #[test]
    fn thread_forwards_deduplicated_events() {
        let (raw_a, _, factory_a) = scripted();
        let (raw_b, _, factory_b) = scripted();
        let (tx, rx) = mpsc::channel();

        let mut input = InputThread::spawn(
            watching(&["q"]),
            vec![factory_a, factory_b],
            Duration::from_millis(1),
            tx,
        )
        .unwrap();

        raw_a.send(RawEvent::press(RawInput::Char('q'))).unwrap();
        raw_b.send(RawEvent::press(RawInput::named("Q"))).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(first.is_press());
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        raw_a.send(RawEvent::release(RawInput::Char('q'))).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(second.event_type, InputEventType::Release);

        assert!(input.stop(DEFAULT_STOP_TIMEOUT));
        assert!(!input.is_running());
    }

    #[test]
    fn stop_is_prompt_with_long_poll_interval() {
        let (_raw, stopped, factory) = scripted();
        let (tx, _rx) = mpsc::channel();

        let mut input = InputThread::spawn(
            watching(&["q"]),
            vec![factory],
            Duration::from_secs(30),
            tx,
        )
        .unwrap();

        let start = Instant::now();
        assert!(input.stop(DEFAULT_STOP_TIMEOUT));
        assert!(start.elapsed() < DEFAULT_STOP_TIMEOUT);
        assert!(*stopped.lock().unwrap());

        // A second stop is a no-op
        assert!(input.stop(DEFAULT_STOP_TIMEOUT));
    }

    #[test]
    fn failing_backends_do_not_stop_others() {
        let (raw, _, factory) = scripted();
        let (tx, rx) = mpsc::channel();

        let failing_start: BackendFactory = Box::new(|| {
            Err(BackendError::Unavailable {
                backend: "absent",
                reason: "test".to_string(),
            })
        });
        let panicking_start: BackendFactory = Box::new(|| panic!("no display"));
        let failing_poll: BackendFactory =
            Box::new(|| Ok(Box::new(FailingBackend) as Box<dyn InputBackend>));

        let mut input = InputThread::spawn(
            watching(&["e"]),
            vec![failing_start, panicking_start, failing_poll, factory],
            Duration::from_millis(1),
            tx,
        )
        .unwrap();

        raw.send(RawEvent::press(RawInput::Char('e'))).unwrap();
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event.token, token("e"));

        assert!(input.stop(DEFAULT_STOP_TIMEOUT));
    }

    #[test]
    fn thread_exits_when_receiver_dropped() {
        let (raw, stopped, factory) = scripted();
        let (tx, rx) = mpsc::channel();

        let mut input =
            InputThread::spawn(watching(&["q"]), vec![factory], Duration::from_millis(1), tx)
                .unwrap();
        drop(rx);
        raw.send(RawEvent::press(RawInput::Char('q'))).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while input.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!input.is_running());
        assert!(*stopped.lock().unwrap());
        assert!(input.stop(DEFAULT_STOP_TIMEOUT));
    }
}
