use std::time::Duration;

use async_trait::async_trait;

/// Polite spacing between requests to a third-party API.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn wait(&self);
}

/// Sleeps for the same duration every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn wait(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn wait(&self) {}
}

/// Counts waits instead of sleeping.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CountingPacer(std::sync::atomic::AtomicUsize);

#[cfg(test)]
impl CountingPacer {
    pub(crate) fn waits(&self) -> usize {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Pacer for CountingPacer {
    async fn wait(&self) {
        self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}
