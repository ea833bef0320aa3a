//! Retry with backoff, and chaining of a primary policy onto a fallback.
//!
//! Policies are stateless descriptions; each `run` builds its own attempt
//! counter and discards it on success or final failure. After the configured
//! retry count is exhausted the last error is returned **unchanged**;
//! callers distinguish retryable from fatal by branching on the error they
//! already own, not on a wrapper type.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Ephemeral per-attempt state, logged on each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    pub attempt: u32,
    pub retries_remaining: u32,
    pub next_delay: Duration,
}

/// Delay strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `min_timeout * factor^attempt`.
    Exponential { factor: f64 },
    /// Constant `min_timeout`.
    Linear,
    /// Constant `min_timeout` plus `random(0..=jitter)`.
    LinearJitter { jitter: Duration },
    /// Exponential growth plus `random(0..=jitter)`.
    ExponentialJitter { factor: f64, jitter: Duration },
}

/// A bounded-retry backoff policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub min_timeout: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Exponential backoff: retries 3, factor 2, min_timeout 7500 ms.
    pub fn exponential() -> Self {
        Self {
            retries: 3,
            min_timeout: Duration::from_millis(7500),
            backoff: Backoff::Exponential { factor: 2.0 },
        }
    }

    /// Constant delay: retries 5, min_timeout 7500 ms.
    pub fn linear() -> Self {
        Self {
            retries: 5,
            min_timeout: Duration::from_millis(7500),
            backoff: Backoff::Linear,
        }
    }

    /// Constant delay plus bounded jitter: retries 2, min_timeout 5000 ms,
    /// jitter 1000 ms.
    pub fn linear_jitter() -> Self {
        Self {
            retries: 2,
            min_timeout: Duration::from_millis(5000),
            backoff: Backoff::LinearJitter {
                jitter: Duration::from_millis(1000),
            },
        }
    }

    /// Exponential delay plus bounded jitter: retries 3, factor 2,
    /// min_timeout 7500 ms, jitter 1000 ms.
    pub fn exponential_jitter() -> Self {
        Self {
            retries: 3,
            min_timeout: Duration::from_millis(7500),
            backoff: Backoff::ExponentialJitter {
                factor: 2.0,
                jitter: Duration::from_millis(1000),
            },
        }
    }

    /// Override the retry count for a call site.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Override the base delay for a call site.
    pub fn with_min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    /// Compute the delay preceding re-invocation number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = match self.backoff {
            Backoff::Exponential { factor } | Backoff::ExponentialJitter { factor, .. } => {
                let scaled = self.min_timeout.as_secs_f64() * factor.powi(attempt as i32);
                Duration::from_secs_f64(scaled)
            }
            Backoff::Linear | Backoff::LinearJitter { .. } => self.min_timeout,
        };

        match self.backoff {
            Backoff::LinearJitter { jitter } | Backoff::ExponentialJitter { jitter, .. } => {
                let jitter_ms = rand::thread_rng().gen_range(0..=jitter.as_millis() as u64);
                base + Duration::from_millis(jitter_ms)
            }
            _ => base,
        }
    }

    /// Run `op`, retrying every failure up to the configured count.
    pub async fn run<T, E, F, Fut>(&self, op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: core::fmt::Display,
    {
        self.run_if(op, |_| true).await
    }

    /// Run `op`, retrying only failures for which `retryable` holds.
    ///
    /// A non-retryable failure is returned immediately without a delay.
    pub async fn run_if<T, E, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: core::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retries && retryable(&err) => {
                    let ctx = RetryContext {
                        attempt,
                        retries_remaining: self.retries - attempt,
                        next_delay: self.delay_for_attempt(attempt),
                    };
                    warn!(
                        attempt = ctx.attempt,
                        retries_remaining = ctx.retries_remaining,
                        delay_ms = ctx.next_delay.as_millis() as u64,
                        error = %err,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(ctx.next_delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Chain this policy onto a fallback attempted after this one exhausts.
    pub fn with_fallback(self, fallback: RetryPolicy) -> PolicyChain {
        PolicyChain {
            primary: self,
            fallback,
        }
    }
}

/// Primary-then-fallback policy composition.
///
/// On double exhaustion the error returned is the **fallback's** last
/// failure; callers that need a hard stop map it to a fatal error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyChain {
    pub primary: RetryPolicy,
    pub fallback: RetryPolicy,
}

impl PolicyChain {
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: core::fmt::Display,
    {
        match self.primary.run(&mut op).await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(error = %err, "primary policy exhausted, trying fallback");
                self.fallback.run(&mut op).await
            }
        }
    }
}
