//! Error types for courier-client.

use std::io;

use courier_gateway::GatewayError;
use thiserror::Error;

// ─── RpcError ─────────────────────────────────────────────────────────────────

/// An error returned by Telegram's servers in response to an RPC call.
///
/// Numeric values are stripped from the name and placed in [`RpcError::value`].
///
/// # Example
/// `FLOOD_WAIT_30` → `RpcError { code: 420, name: "FLOOD_WAIT", value: Some(30) }`
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("RPC {code}: {name}{}", fmt_value(.value))]
pub struct RpcError {
    /// HTTP-like status code.
    pub code:  i32,
    /// Error name in SCREAMING_SNAKE_CASE with digits removed.
    pub name:  String,
    /// Numeric suffix extracted from the name, if any.
    pub value: Option<u32>,
}

fn fmt_value(value: &Option<u32>) -> String {
    value.map(|v| format!(" (value: {v})")).unwrap_or_default()
}

impl RpcError {
    /// Parse a raw Telegram error message like `"FLOOD_WAIT_30"` into an `RpcError`.
    pub fn from_telegram(code: i32, message: &str) -> Self {
        if let Some(idx) = message.rfind('_') {
            let suffix = &message[idx + 1..];
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
                if let Ok(v) = suffix.parse::<u32>() {
                    let name = message[..idx].to_string();
                    return Self { code, name, value: Some(v) };
                }
            }
        }
        Self { code, name: message.to_string(), value: None }
    }

    /// Synthetic error asking the caller to restart the login flow.
    pub fn auth_restart() -> Self {
        Self { code: 500, name: "AUTH_RESTART".into(), value: None }
    }

    /// The raw message as Telegram sent it, numeric suffix included.
    pub fn message(&self) -> String {
        match self.value {
            Some(v) => format!("{}_{v}", self.name),
            None    => self.name.clone(),
        }
    }

    /// Match on the error name, with optional wildcard prefix/suffix `'*'`.
    ///
    /// # Examples
    /// - `err.is("FLOOD_WAIT")`: exact match
    /// - `err.is("PHONE_CODE_*")`: starts-with match
    /// - `err.is("*_INVALID")`: ends-with match
    pub fn is(&self, pattern: &str) -> bool {
        if let Some(prefix) = pattern.strip_suffix('*') {
            self.name.starts_with(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            self.name.ends_with(suffix)
        } else {
            self.name == pattern
        }
    }

    /// Returns the flood-wait duration in seconds, if this is a FLOOD_WAIT error.
    pub fn flood_wait_seconds(&self) -> Option<u64> {
        if self.code == 420 && (self.name == "FLOOD_WAIT" || self.name == "FLOOD_PREMIUM_WAIT") {
            self.value.map(u64::from)
        } else {
            None
        }
    }

    /// Server-side timeout (`-503 Timeout`).
    pub fn is_timeout(&self) -> bool {
        self.code == -503 || self.name.eq_ignore_ascii_case("TIMEOUT")
    }

    /// The authorization key behind this session is no longer valid.
    ///
    /// `SESSION_PASSWORD_NEEDED` is a 401 as well but belongs to the login flow.
    pub fn is_unauthorized(&self) -> bool {
        self.code == 401 && self.name != "SESSION_PASSWORD_NEEDED"
    }
}

// ─── InvocationError ──────────────────────────────────────────────────────────

/// The error type returned from any call that talks to Telegram.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// Telegram rejected the request.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// Network / I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// No response within the transport deadline.
    #[error("request timed out")]
    Timeout,
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
    /// The request was dropped (e.g. connection task shut down).
    #[error("request dropped")]
    Dropped,
    /// The response did not have the shape the request promises.
    #[error("unexpected {got} result for {call}")]
    UnexpectedResult { call: &'static str, got: &'static str },
}

impl InvocationError {
    /// Returns `true` if this is the named RPC error (supports `'*'` wildcards).
    pub fn is(&self, pattern: &str) -> bool {
        match self {
            Self::Rpc(e) => e.is(pattern),
            _            => false,
        }
    }

    /// If this is a FLOOD_WAIT error, returns how many seconds to wait.
    pub fn flood_wait_seconds(&self) -> Option<u64> {
        match self {
            Self::Rpc(e) => e.flood_wait_seconds(),
            _            => None,
        }
    }

    /// Transport or server timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Rpc(e)  => e.is_timeout(),
            Self::Timeout => true,
            _             => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rpc(e) if e.is_unauthorized())
    }

    /// The call never produced a server verdict.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout | Self::Cancelled | Self::Dropped)
    }

    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(e) => Some(e),
            _            => None,
        }
    }
}

// ─── AuthError ────────────────────────────────────────────────────────────────

/// Errors returned by the login flow operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The phone number is new; sign up via an official Telegram app first.
    #[error("sign up required, use an official Telegram app")]
    SignUpRequired,
    /// 2FA is enabled; complete the login with the account password.
    #[error("2FA password required")]
    PasswordRequired,
    /// The 2FA password does not match.
    #[error("invalid 2FA password")]
    InvalidPassword,
    /// The server offered a password KDF this client does not implement.
    #[error("unsupported password algorithm")]
    UnsupportedPasswordAlgo,
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

impl AuthError {
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Invocation(e) => e.rpc(),
            _                   => None,
        }
    }
}

// ─── MediaError ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum MediaError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    /// The file lives on a CDN data center; redirects are not followed.
    #[error("file is served from CDN DC{dc_id}; redirect not supported")]
    CdnRedirect { dc_id: i32 },
    /// The internal storage service rejected the upload.
    #[error("storage: {0}")]
    Storage(#[from] GatewayError),
    #[error("fetch {url}: {source}")]
    Http { url: String, #[source] source: reqwest::Error },
    #[error("fetch {url}: ({status}) {reason}")]
    HttpStatus { url: String, status: u16, reason: String },
    #[error("media location unavailable")]
    NoLocation,
}

// ─── ResolveError ─────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("peer {0} not found")]
    NotFound(String),
    #[error("peer {0} duplicate")]
    Duplicate(String),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

// ─── ConfigError ──────────────────────────────────────────────────────────────

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("metadata: {0} required but missing")]
    Missing(&'static str),
    #[error("metadata: {key} invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

// ─── SessionError ─────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Invocation(#[from] InvocationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("session blob: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("logout tokens: {0}")]
    Tokens(#[from] serde_json::Error),
    #[error("session task panicked")]
    Panicked,
    #[error("session stopped before it was ready")]
    Stopped,
    #[error("session already running")]
    AlreadyRunning,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
