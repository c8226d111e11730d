//! Contracts the surrounding gateway offers to a channel provider.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use axum::http::HeaderMap;
use tokio_util::sync::CancellationToken;

use crate::envelope::{Account, Channel, Update};
use crate::error::Result;

/// One bot profile as seen by its provider.
///
/// Implemented by the conversation service; providers only consume it.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Bot profile id.
    fn bot_id(&self) -> i64;

    /// Tenant the bot belongs to.
    fn domain_id(&self) -> i64;

    /// Whether the bot profile is enabled.
    fn bot_enabled(&self) -> bool;

    /// Public base URL of this gateway, e.g. `https://chat.example.com`.
    fn host_url(&self) -> String;

    /// Directory holding static provider assets (login forms…).
    fn web_root(&self) -> PathBuf;

    /// Snapshot of the bot's opaque key/value metadata.
    fn metadata(&self) -> HashMap<String, String>;

    /// Merge `metadata` into the bot's persisted key/value store.
    async fn set_metadata(
        &self,
        cancel:   &CancellationToken,
        metadata: HashMap<String, String>,
    ) -> Result<()>;

    /// Resolve or create the conversation channel for an external chat.
    async fn get_channel(
        &self,
        cancel:  &CancellationToken,
        chat_id: &str,
        contact: &Account,
    ) -> Result<Channel>;

    /// Deliver one normalized inbound message.
    async fn read(&self, cancel: &CancellationToken, update: Update) -> Result<()>;

    /// Check that the request headers carry administrator credentials.
    fn authorize_admin(&self, headers: &HeaderMap) -> Result<()>;
}
