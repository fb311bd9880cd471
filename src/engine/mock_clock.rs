//! Clocks used by the request client to wait between throttled attempts
//!
//! Production code sleeps on the tokio timer. Tests swap in a `MockClock`,
//! which returns immediately and records every delay it was asked to wait,
//! so the backoff schedule can be asserted without real time passing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Source of waiting for retry backoff
#[async_trait]
pub trait Clock: Send + Sync + std::fmt::Debug {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock that never blocks
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    inner: Arc<RwLock<ClockState>>,
}

#[derive(Debug, Default)]
struct ClockState {
    /// Every requested sleep, in call order
    sleeps: Vec<Duration>,
    /// Total virtual time elapsed
    elapsed: Duration,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub async fn sleeps(&self) -> Vec<Duration> {
        self.inner.read().await.sleeps.clone()
    }

    /// Sum of all requested delays
    pub async fn elapsed(&self) -> Duration {
        self.inner.read().await.elapsed
    }

    pub async fn reset(&self) {
        let mut state = self.inner.write().await;
        state.sleeps.clear();
        state.elapsed = Duration::ZERO;
    }
}

#[async_trait]
impl Clock for MockClock {
    async fn sleep(&self, duration: Duration) {
        let mut state = self.inner.write().await;
        state.sleeps.push(duration);
        state.elapsed += duration;
    }
}
