//! Pluggable persistence for the protocol session blob, the logout tokens
//! and the known user access hashes.
//!
//! The [`SessionBackend`] trait abstracts over where the opaque transport
//! session (auth key, home DC, salts) lives. Two backends are provided:
//! * [`MetadataBackend`]: the bot profile metadata, key `.gotd` (default).
//! * [`InMemoryBackend`]: nothing leaves the process; for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::keys;
use crate::errors::SessionError;
use crate::gateway::GatewayHandle;

/// Logout tokens kept at any time.
pub const MAX_LOGOUT_TOKENS: usize = 20;

// ─── Trait ────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Load the persisted session, or `None` if there is none yet.
    async fn load(&self, cancel: &CancellationToken) -> Result<Option<Vec<u8>>, SessionError>;

    /// Persist `data`.
    async fn save(&self, cancel: &CancellationToken, data: &[u8]) -> Result<(), SessionError>;

    /// Write out anything held back by [`save`](Self::save).
    async fn flush(&self, cancel: &CancellationToken) -> Result<(), SessionError>;

    /// Human-readable name of this backend (for log messages).
    fn name(&self) -> &str;
}

// ─── MetadataBackend ──────────────────────────────────────────────────────────

/// Stores the session in the bot profile metadata, base64 without padding.
///
/// A profile that has not been created yet (`bot_id == 0`) cannot be written;
/// saves are then cached in memory until the next [`flush`](SessionBackend::flush).
pub struct MetadataBackend {
    gateway: GatewayHandle,
    cache:   Mutex<Option<Vec<u8>>>,
}

impl MetadataBackend {
    pub fn new(gateway: GatewayHandle) -> Self {
        Self { gateway, cache: Mutex::new(None) }
    }

    fn cached(&self) -> Option<Vec<u8>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn take_cached(&self) -> Option<Vec<u8>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn set_cached(&self, data: Option<Vec<u8>>) {
        *self.cache.lock().unwrap_or_else(|e| e.into_inner()) = data;
    }

    async fn write(&self, cancel: &CancellationToken, data: &[u8]) -> Result<(), SessionError> {
        let gateway = self.gateway.get();
        gateway
            .set_metadata(cancel, [(keys::SESSION.to_string(), STANDARD_NO_PAD.encode(data))].into())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionBackend for MetadataBackend {
    async fn load(&self, _cancel: &CancellationToken) -> Result<Option<Vec<u8>>, SessionError> {
        if let Some(data) = self.cached().filter(|d| !d.is_empty()) {
            return Ok(Some(data));
        }
        let gateway = self.gateway.get();
        if gateway.bot_id() == 0 {
            return Ok(None);
        }
        let encoded = gateway.metadata().remove(keys::SESSION).unwrap_or_default();
        if encoded.is_empty() {
            return Ok(None);
        }
        Ok(Some(STANDARD_NO_PAD.decode(encoded.trim_end_matches('='))?))
    }

    async fn save(&self, cancel: &CancellationToken, data: &[u8]) -> Result<(), SessionError> {
        if self.gateway.get().bot_id() == 0 {
            self.set_cached(Some(data.to_vec()));
            return Ok(());
        }
        self.set_cached(None);
        self.write(cancel, data).await
    }

    async fn flush(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        match self.take_cached() {
            Some(data) => self.write(cancel, &data).await,
            None       => Ok(()),
        }
    }

    fn name(&self) -> &str { "metadata" }
}

// ─── InMemoryBackend ─────────────────────────────────────────────────────────

/// An ephemeral backend that stores nothing outside the process.
#[derive(Default)]
pub struct InMemoryBackend {
    data: Mutex<Option<Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl SessionBackend for InMemoryBackend {
    async fn load(&self, _: &CancellationToken) -> Result<Option<Vec<u8>>, SessionError> {
        Ok(self.data.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, _: &CancellationToken, data: &[u8]) -> Result<(), SessionError> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(data.to_vec());
        Ok(())
    }

    async fn flush(&self, _: &CancellationToken) -> Result<(), SessionError> { Ok(()) }

    fn name(&self) -> &str { "in-memory" }
}

// ─── Logout tokens ────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct LoginBackup {
    #[serde(default)]
    tokens: Vec<String>,
}

/// Encode logout tokens for the `.auth` metadata key; `None` when empty.
pub fn encode_tokens<'a>(
    tokens: impl IntoIterator<Item = &'a Vec<u8>>,
) -> Result<Option<String>, SessionError> {
    let backup = LoginBackup { tokens: tokens.into_iter().map(|t| STANDARD.encode(t)).collect() };
    if backup.tokens.is_empty() {
        return Ok(None);
    }
    let json = serde_json::to_vec(&backup)?;
    Ok(Some(URL_SAFE_NO_PAD.encode(json)))
}

/// Decode the `.auth` metadata value, keeping at most [`MAX_LOGOUT_TOKENS`].
pub fn decode_tokens(encoded: &str) -> Result<Vec<Vec<u8>>, SessionError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }
    let json   = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?;
    let backup = serde_json::from_slice::<LoginBackup>(&json)?;
    backup
        .tokens
        .iter()
        .take(MAX_LOGOUT_TOKENS)
        .map(|t| STANDARD.decode(t).map_err(SessionError::from))
        .collect()
}

/// Encode user access hashes for the `.peers` metadata key; `None` when
/// there are none.
pub fn encode_peers(users: &HashMap<i64, i64>) -> Result<Option<String>, SessionError> {
    if users.is_empty() {
        return Ok(None);
    }
    let json = serde_json::to_vec(users)?;
    Ok(Some(URL_SAFE_NO_PAD.encode(json)))
}

/// Decode the `.peers` metadata value.
pub fn decode_peers(encoded: &str) -> Result<HashMap<i64, i64>, SessionError> {
    if encoded.is_empty() {
        return Ok(HashMap::new());
    }
    let json = URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_survive_encoding() {
        let tokens  = vec![b"one".to_vec(), vec![0xff, 0x00, 0x7f]];
        let encoded = encode_tokens(&tokens).unwrap().unwrap();
        assert!(!encoded.contains('='));
        assert_eq!(decode_tokens(&encoded).unwrap(), tokens);
    }

    #[test]
    fn empty_tokens_encode_to_nothing() {
        assert_eq!(encode_tokens(&Vec::<Vec<u8>>::new()).unwrap(), None);
        assert!(decode_tokens("").unwrap().is_empty());
    }

    #[test]
    fn decode_caps_at_twenty() {
        let tokens: Vec<Vec<u8>> = (0..25u8).map(|i| vec![i]).collect();
        let encoded = encode_tokens(&tokens).unwrap().unwrap();
        let decoded = decode_tokens(&encoded).unwrap();
        assert_eq!(decoded.len(), MAX_LOGOUT_TOKENS);
        assert_eq!(decoded[0], vec![0]);
    }

    #[test]
    fn peers_keep_their_hashes() {
        let users = HashMap::from([(5, 50), (-1, i64::MAX)]);
        let encoded = encode_peers(&users).unwrap().unwrap();
        assert_eq!(decode_peers(&encoded).unwrap(), users);
        assert_eq!(encode_peers(&HashMap::new()).unwrap(), None);
        assert!(decode_peers("!!").is_err());
    }

    #[tokio::test]
    async fn in_memory_round_trip() {
        let backend = InMemoryBackend::new();
        let cancel  = CancellationToken::new();
        assert_eq!(backend.load(&cancel).await.unwrap(), None);
        backend.save(&cancel, b"blob").await.unwrap();
        assert_eq!(backend.load(&cancel).await.unwrap().as_deref(), Some(&b"blob"[..]));
    }
}
