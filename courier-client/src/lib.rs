//! # courier-client
//!
//! Telegram protocol-client session layer for the courier chat gateway.
//!
//! ## Features
//! - User login state machine (phone → code → 2FA SRP) with logout tokens
//! - Peer directory: access hashes, phone index, entity snapshots
//! - Call/update interception that keeps the directory warm and detects
//!   revoked sessions
//! - `FLOOD_WAIT` auto-retry with configurable policy
//! - Chunked media download into object storage, URL upload into Telegram
//! - Inbound message normalization into the gateway envelope
//! - Session run-loop with post-login dialog sync and persistence
//! - Batch peer resolution and broadcast
//! - HTTP control plane and the `gotd` [`Provider`](courier_gateway::Provider)

#![deny(unsafe_code)]

mod errors;
mod retry;
mod two_factor_auth;
pub mod auth;
pub mod broadcast;
pub mod config;
pub mod gateway;
pub mod http;
pub mod intercept;
pub mod invoker;
pub mod media;
pub mod peers;
pub mod provider;
pub mod session;
pub mod session_backend;
pub mod signal;
pub mod update;

pub use auth::Authenticator;
pub use broadcast::{BroadcastFailure, BroadcastRequest, BroadcastResponse, FailureReason};
pub use config::Config;
pub use errors::{
    AuthError, ConfigError, InvocationError, MediaError, ResolveError, RpcError, SessionError,
};
pub use gateway::GatewayHandle;
pub use intercept::Intercept;
pub use invoker::{Invoker, Link, Transport, TransportFactory, UpdateHandler};
pub use media::MediaTransfer;
pub use peers::{PeerDirectory, PeerKey, PeerKind, PeerValue};
pub use provider::{PROVIDER_NAME, TelegramApp};
pub use retry::{Attempts, AutoSleep, NoRetries, RetryContext, RetryPolicy};
pub use session::TelegramSession;
pub use session_backend::{InMemoryBackend, MetadataBackend, SessionBackend};
pub use signal::{AuthEvent, AuthSignal, AuthSubscription};
pub use update::{Normalizer, UpdateError};

use std::sync::{Arc, Weak};

use courier_tl as tl;
use courier_tl::RemoteCall;
use tokio_util::sync::CancellationToken;

/// Random id for `random_id` / `file_id` request fields.
pub(crate) fn random_i64() -> i64 {
    let mut b = [0u8; 8];
    match getrandom::getrandom(&mut b) {
        Ok(())  => i64::from_le_bytes(b),
        Err(_)  => uuid::Uuid::new_v4().as_u64_pair().0 as i64,
    }
}

// ─── Client ───────────────────────────────────────────────────────────────────

struct ClientInner {
    pipeline:     Arc<Intercept<dyn Transport>>,
    transport:    Arc<dyn Transport>,
    peers:        Arc<PeerDirectory>,
    signal:       Arc<AuthSignal>,
    config:       Config,
}

/// One Telegram account: the intercepted call pipeline plus the state it
/// feeds. Cheap to clone, internally Arc-wrapped.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Wrap `transport` in the interception pipeline.
    ///
    /// Nothing is sent until the transport is driven by a
    /// [`TelegramSession`] and a call is issued.
    pub fn new(transport: Arc<dyn Transport>, config: Config) -> Self {
        let peers  = Arc::new(PeerDirectory::new());
        let signal = Arc::new(AuthSignal::new());
        let pipeline = Arc::new(Intercept::new(
            Arc::clone(&transport),
            Arc::clone(&peers),
            Arc::clone(&signal),
            config.debug,
        ));
        Self { inner: Arc::new(ClientInner { pipeline, transport, peers, signal, config }) }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &Config { &self.inner.config }

    pub fn peers(&self) -> &Arc<PeerDirectory> { &self.inner.peers }

    pub fn signal(&self) -> &Arc<AuthSignal> { &self.inner.signal }

    /// The intercepted invoker every call goes through.
    pub fn invoker(&self) -> &dyn Invoker { &*self.inner.pipeline }

    /// The raw transport, for driving the connection.
    pub fn transport(&self) -> Arc<dyn Transport> { Arc::clone(&self.inner.transport) }

    /// Entry point for pushed updates: populates the directory, then
    /// forwards to the handler installed with [`Client::set_update_handler`].
    pub fn update_sink(&self) -> Arc<dyn UpdateHandler> {
        Arc::clone(&self.inner.pipeline) as Arc<dyn UpdateHandler>
    }

    /// Install the downstream update handler. Held weakly.
    pub fn set_update_handler(&self, handler: Weak<dyn UpdateHandler>) {
        self.inner.pipeline.set_update_handler(handler);
    }

    /// Currently authenticated user, if any.
    pub fn me(&self) -> Option<tl::types::User> { self.inner.signal.user() }

    pub fn is_authorized(&self) -> bool { self.inner.signal.is_authorized() }

    // ── Calls ──────────────────────────────────────────────────────────────

    /// Invoke a typed request once.
    pub async fn invoke<R>(&self, cancel: &CancellationToken, request: R) -> Result<R::Return, InvocationError>
    where
        R: RemoteCall + Send,
        R::Return: Send,
    {
        self.invoker().call(cancel, request).await
    }

    /// Invoke a typed request under the configured [`RetryPolicy`].
    pub async fn invoke_with_retry<R>(
        &self,
        cancel:  &CancellationToken,
        request: R,
    ) -> Result<R::Return, InvocationError>
    where
        R: RemoteCall + Clone + Send,
        R::Return: Send,
    {
        let policy = Arc::clone(&self.inner.config.retry_policy);
        self.invoker().call_with_retry(cancel, &*policy, request).await
    }

    /// Fetch the logged-in user via `users.getUsers([self])`.
    ///
    /// `Ok(None)` when the session carries no authorization yet.
    pub async fn get_me(&self, cancel: &CancellationToken) -> Result<Option<tl::types::User>, InvocationError> {
        let req = tl::functions::users::GetUsers { id: vec![tl::enums::InputUser::UserSelf] };
        match self.invoke(cancel, req).await {
            Ok(users) => Ok(users.into_iter().find_map(|u| match u {
                tl::enums::User::User(u) => Some(u),
                tl::enums::User::Empty(_) => None,
            })),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
