//! Cooperative pacing. Every artificial delay in the pipeline races the
//! cancellation token, so an operator interrupt is honored within one sleep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct Pacer {
    cancel: CancellationToken,
}

impl Pacer {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Sleep for `ms`. Returns false when the sleep was interrupted or the
    /// token was already cancelled going in.
    pub async fn pause_ms(&self, ms: u64) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(Duration::from_millis(ms)) => true,
        }
    }

    /// Sleep a uniformly random duration inside `[min_ms, max_ms]`.
    pub async fn pause_between_ms(&self, min_ms: u64, max_ms: u64) -> bool {
        self.pause_ms(jitter_ms(min_ms, max_ms)).await
    }
}

/// Pick a delay inside the window. A degenerate window yields its minimum.
pub fn jitter_ms(min_ms: u64, max_ms: u64) -> u64 {
    if max_ms <= min_ms {
        min_ms
    } else {
        fastrand::u64(min_ms..=max_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn jitter_stays_inside_window() {
        for _ in 0..100 {
            let value = jitter_ms(200, 400);
            assert!((200..=400).contains(&value));
        }
        assert_eq!(jitter_ms(300, 300), 300);
        assert_eq!(jitter_ms(300, 100), 300);
    }

    #[tokio::test]
    async fn pause_completes_when_not_cancelled() {
        let pacer = Pacer::new(CancellationToken::new());
        assert!(pacer.pause_ms(5).await);
    }

    #[tokio::test]
    async fn cancelled_pause_returns_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        let pacer = Pacer::new(token);

        let started = Instant::now();
        assert!(!pacer.pause_ms(60_000).await);
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(pacer.is_cancelled());
    }
}
