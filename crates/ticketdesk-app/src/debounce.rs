use std::time::Duration;

use tokio::time::Instant;

/// Default quiet period before search input is applied.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds the latest pushed value until no new value has arrived for `delay`.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl<T> Debouncer<T> {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new value, restarting the quiet period.
    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now()));
    }

    /// Whether a value is waiting.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its quiet period has elapsed.
    pub fn poll(&mut self) -> Option<T> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() >= self.delay);
        if ready { self.pending.take().map(|(value, _)| value) } else { None }
    }

    /// Wait out the quiet period and take the pending value.
    pub async fn settled(&mut self) -> Option<T> {
        let (_, pushed_at) = self.pending.as_ref()?;
        tokio::time::sleep_until(*pushed_at + self.delay).await;
        self.pending.take().map(|(value, _)| value)
    }

    /// Drop any pending value.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
