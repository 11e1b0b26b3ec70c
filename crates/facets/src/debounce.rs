use std::time::{Duration, Instant};

/// Trailing-edge debounce driven by caller-supplied time.
///
/// Each `schedule` replaces the payload and pushes the deadline out; `poll` hands the
/// payload back once the deadline has passed.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    /// `None` deadline: the delay does not fit in an `Instant`, so it never elapses.
    pending: Option<(Option<Instant>, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule(&mut self, now: Instant, payload: T) {
        self.pending = Some((now.checked_add(self.delay), payload));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((Some(deadline), _)) if *deadline <= now => self.pending.take().map(|(_, p)| p),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().and_then(|(d, _)| *d)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, p)| p)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
