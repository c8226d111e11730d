//! The seams between the session layer and the wire: [`Invoker`] executes one
//! remote call, [`Transport`] additionally owns the connection, and
//! [`UpdateHandler`] receives every update batch.

use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_tl as tl;
use courier_tl::{Function, Object, RemoteCall};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::errors::InvocationError;
use crate::retry::{RetryContext, RetryPolicy};
use crate::session_backend::SessionBackend;

// ─── Invoker ──────────────────────────────────────────────────────────────────

/// Executes one remote call and returns its decoded result.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        cancel:  &CancellationToken,
        request: Function,
    ) -> Result<Object, InvocationError>;
}

impl dyn Invoker + '_ {
    /// Invoke a typed request once.
    pub async fn call<R>(
        &self,
        cancel:  &CancellationToken,
        request: R,
    ) -> Result<R::Return, InvocationError>
    where
        R: RemoteCall + Send,
        R::Return: Send,
    {
        let object = self.invoke(cancel, request.into_function()).await?;
        R::unwrap_return(object).map_err(|got| InvocationError::UnexpectedResult {
            call: R::NAME,
            got:  got.kind(),
        })
    }

    /// Invoke a typed request, sleeping and retrying as `policy` allows.
    pub async fn call_with_retry<R>(
        &self,
        cancel:  &CancellationToken,
        policy:  &dyn RetryPolicy,
        request: R,
    ) -> Result<R::Return, InvocationError>
    where
        R: RemoteCall + Clone + Send,
        R::Return: Send,
    {
        let mut fail_count   = NonZeroU32::MIN;
        let mut slept_so_far = Duration::default();
        loop {
            match self.call(cancel, request.clone()).await {
                Ok(ret) => return Ok(ret),
                Err(e) => {
                    let ctx = RetryContext { fail_count, slept_so_far, error: e };
                    match policy.should_retry(&ctx) {
                        ControlFlow::Continue(delay) => {
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = cancel.cancelled() => return Err(InvocationError::Cancelled),
                            }
                            slept_so_far += delay;
                            fail_count = fail_count.saturating_add(1);
                        }
                        ControlFlow::Break(()) => return Err(ctx.error),
                    }
                }
            }
        }
    }
}

// ─── UpdateHandler ────────────────────────────────────────────────────────────

/// Receives update batches, pushed by the server or returned inline by calls.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(
        &self,
        cancel:  &CancellationToken,
        updates: tl::enums::Updates,
    ) -> Result<(), crate::update::UpdateError>;
}

// ─── Transport ────────────────────────────────────────────────────────────────

/// Everything [`Transport::run`] needs from the session that drives it.
pub struct Link {
    /// Persisted protocol session (auth key, DC, salts).
    pub session:   Arc<dyn SessionBackend>,
    /// Sink for every pushed update batch.
    pub updates:   Arc<dyn UpdateHandler>,
    /// Fired once the connection is established and calls may be issued.
    pub connected: oneshot::Sender<()>,
}

/// The connection to Telegram: encodes, frames and ships calls, and pushes
/// updates as they arrive.
#[async_trait]
pub trait Transport: Invoker {
    /// Connect and drive the link until `cancel` fires or the link breaks.
    async fn run(&self, cancel: CancellationToken, link: Link) -> Result<(), InvocationError>;
}

/// Builds a fresh transport for an account configuration.
pub trait TransportFactory: Send + Sync {
    fn transport(&self, config: &Config) -> Arc<dyn Transport>;
}
