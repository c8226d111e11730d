//! Retry policies for handling `FLOOD_WAIT`, server timeouts and transient
//! I/O errors.

use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::time::Duration;

use crate::errors::InvocationError;

/// Controls how the client reacts when an RPC call fails.
pub trait RetryPolicy: Send + Sync + 'static {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration>;
}

/// Context passed to [`RetryPolicy::should_retry`] on each failure.
pub struct RetryContext {
    pub fail_count:   NonZeroU32,
    pub slept_so_far: Duration,
    pub error:        InvocationError,
}

/// Never retry.
pub struct NoRetries;
impl RetryPolicy for NoRetries {
    fn should_retry(&self, _: &RetryContext) -> ControlFlow<(), Duration> {
        ControlFlow::Break(())
    }
}

/// Sleep the advised duration on FLOOD_WAIT and a fixed delay on timeouts or
/// I/O errors, up to `max_retries` times per call.
pub struct AutoSleep {
    /// Flood waits longer than this are surfaced to the caller.
    pub threshold:             Duration,
    /// Delay before retrying a timed-out or I/O-failed call; `None` disables.
    pub io_errors_as_flood_of: Option<Duration>,
    pub max_retries:           u32,
}

impl Default for AutoSleep {
    fn default() -> Self {
        Self {
            threshold:             Duration::from_secs(60),
            io_errors_as_flood_of: Some(Duration::from_secs(1)),
            max_retries:           3,
        }
    }
}

impl RetryPolicy for AutoSleep {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration> {
        if ctx.fail_count.get() > self.max_retries {
            return ControlFlow::Break(());
        }
        if let Some(secs) = ctx.error.flood_wait_seconds() {
            if secs <= self.threshold.as_secs() {
                tracing::info!("[courier] FLOOD_WAIT_{secs}, sleeping before retry");
                return ControlFlow::Continue(Duration::from_secs(secs));
            }
            return ControlFlow::Break(());
        }
        if ctx.error.is_timeout() || matches!(ctx.error, InvocationError::Io(_)) {
            if let Some(d) = self.io_errors_as_flood_of {
                tracing::info!("[courier] {}, sleeping {:?} before retry", ctx.error, d);
                return ControlFlow::Continue(d);
            }
        }
        ControlFlow::Break(())
    }
}

/// Retry exactly `attempts - 1` times on flood-wait or timeout, whatever the
/// advised wait.
pub struct Attempts(pub u32);

impl RetryPolicy for Attempts {
    fn should_retry(&self, ctx: &RetryContext) -> ControlFlow<(), Duration> {
        if ctx.fail_count.get() >= self.0 {
            return ControlFlow::Break(());
        }
        if let Some(secs) = ctx.error.flood_wait_seconds() {
            return ControlFlow::Continue(Duration::from_secs(secs));
        }
        if ctx.error.is_timeout() {
            return ControlFlow::Continue(Duration::from_secs(1));
        }
        ControlFlow::Break(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RpcError;

    fn ctx(n: u32, error: InvocationError) -> RetryContext {
        RetryContext {
            fail_count:   NonZeroU32::new(n).unwrap(),
            slept_so_far: Duration::ZERO,
            error,
        }
    }

    fn flood(secs: u32) -> InvocationError {
        RpcError::from_telegram(420, &format!("FLOOD_WAIT_{secs}")).into()
    }

    #[test]
    fn auto_sleep_honours_flood_wait() {
        let p = AutoSleep::default();
        assert_eq!(p.should_retry(&ctx(1, flood(5))), ControlFlow::Continue(Duration::from_secs(5)));
        assert_eq!(p.should_retry(&ctx(1, flood(3600))), ControlFlow::Break(()));
        assert_eq!(p.should_retry(&ctx(4, flood(5))), ControlFlow::Break(()));
    }

    #[test]
    fn auto_sleep_retries_timeouts() {
        let p = AutoSleep::default();
        assert_eq!(
            p.should_retry(&ctx(1, InvocationError::Timeout)),
            ControlFlow::Continue(Duration::from_secs(1)),
        );
        let bad = RpcError::from_telegram(400, "PEER_ID_INVALID").into();
        assert_eq!(p.should_retry(&ctx(1, bad)), ControlFlow::Break(()));
    }

    #[test]
    fn attempts_caps_total_calls() {
        let p = Attempts(2);
        assert!(matches!(p.should_retry(&ctx(1, flood(7))), ControlFlow::Continue(_)));
        assert_eq!(p.should_retry(&ctx(2, flood(7))), ControlFlow::Break(()));
    }
}
