//! Single-slot idle timer for search input.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Holds at most one armed timer. Arming again cancels the previous one, so
/// only the last keystroke in a burst ever fires.
#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    token: Option<CancellationToken>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, token: None }
    }

    /// Arm the timer; `fire` runs once the delay elapses without another
    /// `arm` or `cancel`.
    pub fn arm<F>(&mut self, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let token = CancellationToken::new();
        let child = token.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = child.cancelled() => {}
                _ = tokio::time::sleep(delay) => fire(),
            }
        });
        self.token = Some(token);
    }

    /// Cancel the pending timer. Returns true if one was armed.
    pub fn cancel(&mut self) -> bool {
        match self.token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Mark the armed timer as fired.
    pub fn fired(&mut self) {
        self.token = None;
    }

    pub fn is_armed(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
