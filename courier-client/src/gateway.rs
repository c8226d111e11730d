//! Swappable reference to the bot profile a session runs on behalf of.

use std::fmt;
use std::sync::{Arc, RwLock};

use courier_gateway::Gateway;

/// Shared, replaceable [`Gateway`].
///
/// A provider rebuilt for an updated bot profile keeps its running session
/// and only swaps the profile it reports to.
#[derive(Clone)]
pub struct GatewayHandle {
    inner: Arc<RwLock<Arc<dyn Gateway>>>,
}

impl GatewayHandle {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { inner: Arc::new(RwLock::new(gateway)) }
    }

    /// The current profile.
    pub fn get(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.inner.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Swap in an updated profile.
    pub fn replace(&self, gateway: Arc<dyn Gateway>) {
        *self.inner.write().unwrap_or_else(|e| e.into_inner()) = gateway;
    }
}

impl fmt::Debug for GatewayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gw = self.get();
        f.debug_struct("GatewayHandle")
            .field("bot_id", &gw.bot_id())
            .field("domain_id", &gw.domain_id())
            .finish()
    }
}
