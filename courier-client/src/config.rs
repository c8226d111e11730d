//! Account configuration, read from the bot profile metadata.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::errors::ConfigError;
use crate::retry::{AutoSleep, RetryPolicy};

/// Metadata keys understood by the Telegram provider.
pub mod keys {
    pub const API_ID:   &str = "api_id";
    pub const API_HASH: &str = "api_hash";
    /// Optional, international format: `+(country)(carrier)(number)`.
    pub const PHONE:    &str = "phone";
    pub const DEBUG:    &str = "debug";
    /// Persisted protocol session blob.
    pub const SESSION:  &str = ".gotd";
    /// Persisted logout tokens.
    pub const AUTH:     &str = ".auth";
    /// Persisted user access hashes.
    pub const PEERS:    &str = ".peers";
}

/// Size of one `upload.getFile` / `upload.saveFilePart` chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// Dialogs requested per `messages.getDialogs` page.
pub const DEFAULT_DIALOGS_PAGE: i32 = 100;

/// Configuration for one Telegram account session.
#[derive(Clone)]
pub struct Config {
    pub api_id:       i32,
    pub api_hash:     String,
    /// Phone number offered to the login form, if known up front.
    pub phone:        Option<String>,
    /// Trace every call and update at `debug` level.
    pub debug:        bool,
    pub retry_policy: Arc<dyn RetryPolicy>,
    pub chunk_size:   usize,
    pub dialogs_page: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_id:       0,
            api_hash:     String::new(),
            phone:        None,
            debug:        false,
            retry_policy: Arc::new(AutoSleep::default()),
            chunk_size:   DEFAULT_CHUNK_SIZE,
            dialogs_page: DEFAULT_DIALOGS_PAGE,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_id", &self.api_id)
            .field("api_hash", &"…")
            .field("phone", &self.phone)
            .field("debug", &self.debug)
            .field("chunk_size", &self.chunk_size)
            .field("dialogs_page", &self.dialogs_page)
            .finish()
    }
}

impl Config {
    /// Build from bot metadata. `api_id` must be a non-zero integer and
    /// `api_hash` non-empty; `phone` and `debug` are optional.
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let raw_id = metadata.get(keys::API_ID).map(|s| s.trim()).unwrap_or_default();
        if raw_id.is_empty() {
            return Err(ConfigError::Missing(keys::API_ID));
        }
        let api_id = match raw_id.parse::<i32>() {
            Ok(id) if id != 0 => id,
            _ => return Err(ConfigError::Invalid { key: keys::API_ID, value: raw_id.to_string() }),
        };

        let api_hash = metadata.get(keys::API_HASH).map(|s| s.trim()).unwrap_or_default();
        if api_hash.is_empty() {
            return Err(ConfigError::Missing(keys::API_HASH));
        }

        let phone = metadata
            .get(keys::PHONE)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let debug = metadata
            .get(keys::DEBUG)
            .map(|s| parse_bool(s))
            .unwrap_or(false);

        Ok(Self {
            api_id,
            api_hash: api_hash.to_string(),
            phone,
            debug,
            ..Self::default()
        })
    }

    /// Digest of the `(api_id, api_hash)` pair.
    ///
    /// Two profiles with the same identity share one running session.
    pub fn app_identity(&self) -> [u8; 32] {
        let mut h = Sha256::new();
        h.update(self.api_hash.as_bytes());
        h.update((self.api_id as i64 as u64).to_be_bytes());
        h.finalize().into()
    }
}

/// `1`, `t` or `true` in the usual casings; anything else is `false`.
fn parse_bool(s: &str) -> bool {
    matches!(s.trim(), "1" | "t" | "T" | "true" | "TRUE" | "True")
}
