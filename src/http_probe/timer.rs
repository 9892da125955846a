use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Raw lifecycle timestamps of one request. `None` until the phase is reached.
#[derive(Debug, Default, Clone, Copy)]
struct Timestamps {
    start: Option<Instant>,
    dns_start: Option<Instant>,
    dns_done: Option<Instant>,
    connect_done: Option<Instant>,
    request_written: Option<Instant>,
    first_response_byte: Option<Instant>,
    request_done: Option<Instant>,
}

/// Durations of the five phases of a request plus the wall-clock total.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDurations {
    pub resolving: Duration,
    pub connecting: Duration,
    pub sending: Duration,
    pub waiting: Duration,
    pub receiving: Duration,
    pub total: Duration,
}

/// A consistent, read-only copy of a [`PhaseTimer`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimingSnapshot {
    pub name: String,
    pub uri: String,
    pub durations: PhaseDurations,
    pub status_code: u16,
    pub error: Option<String>,
    pub body_size: usize,
}

impl TimingSnapshot {
    /// A transport error always wins over the status code: a probe that
    /// never got a response still has `status_code == 0`.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.status_code < 400
    }

    pub fn is_redirect(&self) -> bool {
        self.error.is_none() && (300..400).contains(&self.status_code)
    }
}

#[derive(Debug, Default)]
struct State {
    name: String,
    uri: String,
    stamps: Timestamps,
    durations: PhaseDurations,
    status_code: u16,
    error: Option<String>,
    body_size: usize,
}

impl State {
    /// `at - baseline`, falling back to the request start when the baseline
    /// phase was skipped. Never negative.
    fn since(&self, at: Instant, baseline: Option<Instant>) -> Duration {
        match baseline.or(self.stamps.start) {
            Some(baseline) => at.saturating_duration_since(baseline),
            None => Duration::ZERO,
        }
    }
}

/// Lifecycle record of one probe.
///
/// Cloning yields another handle on the same record, which is how the
/// instrumented transport and the prober share it. Every transition takes
/// the single lock, so hooks may fire from any task or thread.
#[derive(Debug, Default, Clone)]
pub struct PhaseTimer {
    state: Arc<Mutex<State>>,
}

impl PhaseTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the timer and resets everything recorded so far.
    pub fn start(&self, name: &str, uri: &str) {
        self.start_at(name, uri, Instant::now());
    }

    pub fn dns_start(&self) {
        self.dns_start_at(Instant::now());
    }

    pub fn dns_done(&self) {
        self.dns_done_at(Instant::now());
    }

    pub fn connect_done(&self) {
        self.connect_done_at(Instant::now());
    }

    pub fn request_written(&self) {
        self.request_written_at(Instant::now());
    }

    pub fn first_response_byte(&self) {
        self.first_response_byte_at(Instant::now());
    }

    /// Must only be called once the body has been read to EOF.
    pub fn finish(&self, status_code: u16) {
        self.finish_at(status_code, Instant::now());
    }

    pub fn set_body_size(&self, size: usize) {
        self.state.lock().body_size = size;
    }

    /// Records a transport failure. Durations past the failure point stay zero.
    pub fn fail(&self, error: impl Display) {
        self.state.lock().error = Some(error.to_string());
    }

    pub fn is_ok(&self) -> bool {
        self.snapshot().is_ok()
    }

    pub fn name(&self) -> String {
        self.state.lock().name.clone()
    }

    pub fn snapshot(&self) -> TimingSnapshot {
        let state = self.state.lock();
        TimingSnapshot {
            name: state.name.clone(),
            uri: state.uri.clone(),
            durations: state.durations,
            status_code: state.status_code,
            error: state.error.clone(),
            body_size: state.body_size,
        }
    }

    fn start_at(&self, name: &str, uri: &str, at: Instant) {
        let mut state = self.state.lock();
        *state = State {
            name: name.to_string(),
            uri: uri.to_string(),
            ..State::default()
        };
        state.stamps.start = Some(at);
    }

    fn dns_start_at(&self, at: Instant) {
        self.state.lock().stamps.dns_start = Some(at);
    }

    fn dns_done_at(&self, at: Instant) {
        let mut state = self.state.lock();
        state.stamps.dns_done = Some(at);
        state.durations.resolving = state.since(at, state.stamps.dns_start);
    }

    fn connect_done_at(&self, at: Instant) {
        let mut state = self.state.lock();
        state.stamps.connect_done = Some(at);
        // Literal IPs never resolve
        state.durations.connecting = state.since(at, state.stamps.dns_done);
    }

    fn request_written_at(&self, at: Instant) {
        let mut state = self.state.lock();
        state.stamps.request_written = Some(at);
        // A reused connection never connects
        state.durations.sending = state.since(at, state.stamps.connect_done);
    }

    fn first_response_byte_at(&self, at: Instant) {
        let mut state = self.state.lock();
        state.stamps.first_response_byte = Some(at);
        state.durations.waiting = state.since(at, state.stamps.request_written);
    }

    fn finish_at(&self, status_code: u16, at: Instant) {
        let mut state = self.state.lock();
        state.stamps.request_done = Some(at);
        state.durations.receiving = state.since(at, state.stamps.first_response_byte);
        state.durations.total = state.since(at, None);
        state.status_code = status_code;
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_full_lifecycle() {
        let t0 = Instant::now();
        let timer = PhaseTimer::new();
        timer.start_at("example", "https://example.com/", t0);
        timer.dns_start_at(t0 + ms(1));
        timer.dns_done_at(t0 + ms(11));
        timer.connect_done_at(t0 + ms(31));
        timer.request_written_at(t0 + ms(36));
        timer.first_response_byte_at(t0 + ms(136));
        timer.finish_at(200, t0 + ms(150));

        let snapshot = timer.snapshot();
        assert_eq!(snapshot.name, "example");
        assert_eq!(snapshot.uri, "https://example.com/");
        assert_eq!(snapshot.status_code, 200);
        assert_eq!(snapshot.durations.resolving, ms(10));
        assert_eq!(snapshot.durations.connecting, ms(20));
        assert_eq!(snapshot.durations.sending, ms(5));
        assert_eq!(snapshot.durations.waiting, ms(100));
        assert_eq!(snapshot.durations.receiving, ms(14));
        assert_eq!(snapshot.durations.total, ms(150));
        assert!(snapshot.is_ok());
    }

    #[test]
    fn test_phases_never_exceed_total() {
        let t0 = Instant::now();
        let timer = PhaseTimer::new();
        timer.start_at("a", "http://a/", t0);
        timer.dns_start_at(t0 + ms(2));
        timer.dns_done_at(t0 + ms(5));
        timer.connect_done_at(t0 + ms(9));
        timer.request_written_at(t0 + ms(10));
        timer.first_response_byte_at(t0 + ms(20));
        timer.finish_at(200, t0 + ms(21));

        let d = timer.snapshot().durations;
        let sum = d.resolving + d.connecting + d.sending + d.waiting + d.receiving;
        assert!(sum <= d.total);
        // The 2ms before dns_start is hidden from every phase
        assert_eq!(d.total - sum, ms(2));
    }

    #[test]
    fn test_literal_ip_skips_dns() {
        let t0 = Instant::now();
        let timer = PhaseTimer::new();
        timer.start_at("ip", "http://127.0.0.1/", t0);
        timer.connect_done_at(t0 + ms(3));
        timer.request_written_at(t0 + ms(4));

        let d = timer.snapshot().durations;
        assert_eq!(d.resolving, Duration::ZERO);
        assert_eq!(d.connecting, ms(3));
        assert_eq!(d.sending, ms(1));
    }

    #[test]
    fn test_reused_connection_skips_connect() {
        let t0 = Instant::now();
        let timer = PhaseTimer::new();
        timer.start_at("reuse", "http://reuse/", t0);
        timer.request_written_at(t0 + ms(7));
        timer.first_response_byte_at(t0 + ms(9));

        let d = timer.snapshot().durations;
        assert_eq!(d.connecting, Duration::ZERO);
        assert_eq!(d.sending, ms(7));
        assert_eq!(d.waiting, ms(2));
    }

    #[test]
    fn test_out_of_order_hook_is_clamped() {
        let t0 = Instant::now();
        let timer = PhaseTimer::new();
        timer.start_at("clamp", "http://clamp/", t0 + ms(10));
        timer.connect_done_at(t0);

        assert_eq!(timer.snapshot().durations.connecting, Duration::ZERO);
    }

    #[test]
    fn test_transport_error_overrides_status() {
        let timer = PhaseTimer::new();
        timer.start("down", "http://down.invalid/");
        assert!(timer.is_ok());

        timer.fail("connection refused");
        let snapshot = timer.snapshot();
        assert_eq!(snapshot.status_code, 0);
        assert_eq!(snapshot.error.as_deref(), Some("connection refused"));
        assert!(!snapshot.is_ok());
        assert!(!snapshot.is_redirect());
    }

    #[test]
    fn test_status_classification() {
        let timer = PhaseTimer::new();
        timer.start("s", "http://s/");

        timer.finish(302);
        assert!(timer.is_ok());
        assert!(timer.snapshot().is_redirect());

        timer.finish(399);
        assert!(timer.is_ok());

        timer.finish(400);
        assert!(!timer.is_ok());
        assert!(!timer.snapshot().is_redirect());
    }

    #[test]
    fn test_start_resets_previous_run() {
        let timer = PhaseTimer::new();
        timer.start("first", "http://first/");
        timer.fail("boom");
        timer.finish(500);
        timer.set_body_size(12);

        timer.start("second", "http://second/");
        let snapshot = timer.snapshot();
        assert_eq!(snapshot.name, "second");
        assert_eq!(snapshot.status_code, 0);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.body_size, 0);
        assert_eq!(snapshot.durations, PhaseDurations::default());
    }

    #[test]
    fn test_clones_share_state() {
        let timer = PhaseTimer::new();
        let hook = timer.clone();
        timer.start("shared", "http://shared/");

        std::thread::spawn(move || hook.finish(204))
            .join()
            .expect("hook thread panicked");

        assert_eq!(timer.snapshot().status_code, 204);
    }
}
