//! Client-side request pacing.
//!
//! Analyzers call [`Pacer::pace`] before every request. The default
//! [`FixedDelay`] waits a constant delay between consecutive requests;
//! [`TokenBucket`] allows short bursts and then holds a steady rate.
use async_trait::async_trait;
use reachstat_common::{ReachError, Result};
use reachstat_config::PacingSettings;
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[async_trait]
pub trait Pacer: Send {
    /// Wait until the next request may be sent.
    async fn pace(&mut self);
}

/// Build the pacer described by configuration.
pub fn from_settings(settings: &PacingSettings) -> Result<Box<dyn Pacer>> {
    match *settings {
        PacingSettings::Fixed { delay_ms } => {
            Ok(Box::new(FixedDelay::new(Duration::from_millis(delay_ms))))
        }
        PacingSettings::TokenBucket { qps, burst } => {
            Ok(Box::new(TokenBucket::new(qps, burst)?))
        }
    }
}

/// Constant pause between requests. The first call returns immediately.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    primed: bool,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            primed: false,
        }
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pace(&mut self) {
        if !self.primed {
            self.primed = true;
            return;
        }
        if !self.delay.is_zero() {
            tracing::trace!(target: "pacing", delay_ms = self.delay.as_millis() as u64, "fixed delay");
            sleep(self.delay).await;
        }
    }
}

/// Token bucket: refills at `qps` tokens per second up to `burst`.
///
/// Each request takes one token. A request that finds the bucket empty goes
/// into debt and sleeps until the debt is repaid, so waiting callers never
/// get credited with tokens that accrued while they slept.
#[derive(Debug)]
pub struct TokenBucket {
    qps: f64,
    burst: f64,
    tokens: f64,
    last: Instant,
}

impl TokenBucket {
    pub fn new(qps: f64, burst: u32) -> Result<Self> {
        if !qps.is_finite() || qps <= 0.0 {
            return Err(ReachError::Config(format!(
                "token bucket qps must be positive, got {qps}"
            )));
        }
        if burst == 0 {
            return Err(ReachError::Config("token bucket burst must be at least 1".into()));
        }
        let burst = f64::from(burst);
        Ok(Self {
            qps,
            burst,
            tokens: burst,
            last: Instant::now(),
        })
    }

    /// Take `need` tokens and return how long the caller has to wait for them.
    fn needed_wait(&mut self, need: f64, now: Instant) -> Duration {
        let dt = now.saturating_duration_since(self.last).as_secs_f64();
        self.last = now;
        self.tokens = (self.tokens + dt * self.qps).min(self.burst);
        self.tokens -= need;

        if self.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-self.tokens / self.qps)
        }
    }
}

#[async_trait]
impl Pacer for TokenBucket {
    async fn pace(&mut self) {
        let wait = self.needed_wait(1.0, Instant::now());
        if !wait.is_zero() {
            tracing::trace!(target: "pacing", wait_ms = wait.as_millis() as u64, "token bucket wait");
            sleep(wait).await;
        }
    }
}
