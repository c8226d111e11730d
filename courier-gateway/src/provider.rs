//! Channel provider abstraction and the registry that builds providers by
//! code name.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::envelope::Update;
use crate::error::{GatewayError, Result};
use crate::gateway::Gateway;

// ─── Provider ─────────────────────────────────────────────────────────────────

/// One external messaging platform adapter bound to a bot profile.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider code name, e.g. `"gotd"`.
    fn name(&self) -> &'static str;

    /// Deliver an outbound message to the external chat.
    async fn send_notify(&self, cancel: &CancellationToken, notify: &Update) -> Result<()>;

    /// Webhook and control-plane routes served under the bot's URI.
    fn router(&self) -> Router;

    /// Register the webhook callback URI (or start a persistent session).
    async fn register(&self, cancel: &CancellationToken, uri: &str) -> Result<()>;

    /// Deregister the webhook callback URI.
    async fn deregister(&self, cancel: &CancellationToken) -> Result<()>;

    /// Shut the provider and all its running sessions down.
    async fn close(&self) -> Result<()>;

    /// Upcast used by factories to reuse a running provider's state.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

// ─── ProviderRegistry ─────────────────────────────────────────────────────────

/// Factory building a provider for a bot profile.
///
/// `state` is the currently running provider for the same bot, if any; the
/// factory may hand it back (updated) instead of starting a new one.
pub type ProviderFactory = Arc<
    dyn Fn(Arc<dyn Gateway>, Option<Arc<dyn Provider>>) -> Result<Arc<dyn Provider>>
        + Send
        + Sync,
>;

/// Well-known providers, keyed by code name.
///
/// Built once at process start and handed to whatever assembles gateways.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, ProviderFactory>,
}

impl ProviderRegistry {
    pub fn new() -> Self { Self::default() }

    /// Register a factory under `name`.
    ///
    /// Fails when `name` is already taken.
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(Arc<dyn Gateway>, Option<Arc<dyn Provider>>) -> Result<Arc<dyn Provider>>
            + Send
            + Sync
            + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(GatewayError::internal(
                "chat.provider.duplicate",
                format!("chat: duplicate {name} provider register"),
            ));
        }
        self.factories.insert(name.to_string(), Arc::new(factory));
        tracing::debug!(provider = name, "[courier] provider registered");
        Ok(())
    }

    /// Factory registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<ProviderFactory> {
        self.factories.get(name).cloned()
    }

    /// Build (or refresh) the provider `name` for `gateway`.
    pub fn build(
        &self,
        name:    &str,
        gateway: Arc<dyn Gateway>,
        state:   Option<Arc<dyn Provider>>,
    ) -> Result<Arc<dyn Provider>> {
        let factory = self.get(name).ok_or_else(|| {
            GatewayError::not_found(
                "chat.provider.not_found",
                format!("chat: provider {name} not registered"),
            )
        })?;
        factory(gateway, state)
    }

    /// Registered code names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry").field("providers", &self.names()).finish()
    }
}
