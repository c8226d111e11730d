//! Peer resolution and the batch broadcast operation.
//!
//! A broadcast runs in two phases. Every input peer is resolved first
//! (phones through the phone index or `contacts.resolvePhone`, anything else
//! as a username), then each distinct peer gets one `messages.sendMessage`.
//! Failures from both phases are reported against the input they came from.

use std::collections::HashSet;

use courier_gateway::GatewayError;
use courier_tl as tl;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::Client;
use crate::errors::{InvocationError, ResolveError};
use crate::peers::{PeerKey, PeerKind};
use crate::retry::Attempts;

// ─── Phone numbers ────────────────────────────────────────────────────────────

/// Keep only the digits of `phone`.
pub fn cleanup_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Digits with the usual dialing punctuation, and at least one digit.
pub fn is_phone_number(s: &str) -> bool {
    let mut digits = false;
    for c in s.chars() {
        match c {
            '0'..='9' => digits = true,
            '+' | '-' | '(' | ')' | ' ' | '\t' => {}
            _ => return false,
        }
    }
    digits
}

// ─── Resolution ───────────────────────────────────────────────────────────────

impl Client {
    /// Resolve a phone number to the Telegram user registered with it.
    ///
    /// The phone index is consulted first; a miss goes to
    /// `contacts.resolvePhone`, tried twice on flood-wait or timeout.
    pub async fn resolve_phone(
        &self,
        cancel: &CancellationToken,
        phone:  &str,
    ) -> Result<tl::types::User, ResolveError> {
        let phone = cleanup_phone(phone);
        if phone.is_empty() {
            return Err(ResolveError::NotFound(phone));
        }

        if let Some((key, value)) = self.peers().find_phone(&phone) {
            if key.kind == PeerKind::User {
                let input = tl::enums::InputUser::User(tl::types::InputUser {
                    user_id:     key.id,
                    access_hash: value.access_hash,
                });
                let users = self.invoke(cancel, tl::functions::users::GetUsers { id: vec![input] }).await?;
                if let Some(user) = single_user(users, key.id) {
                    return Ok(user);
                }
                tracing::debug!(%phone, "[courier] stale phone index entry; resolving remotely");
            }
        }

        let req = tl::functions::contacts::ResolvePhone { phone: phone.clone() };
        let resolved = match self.invoker().call_with_retry(cancel, &Attempts(2), req).await {
            Ok(r) => r,
            Err(e) if e.is("PHONE_NOT_OCCUPIED") => return Err(ResolveError::NotFound(phone)),
            Err(e) => return Err(e.into()),
        };
        let tl::enums::contacts::ResolvedPeer::ResolvedPeer(resolved) = resolved;
        let key = PeerKey::from(&resolved.peer);
        if key.kind != PeerKind::User {
            return Err(ResolveError::NotFound(phone));
        }
        single_user(resolved.users, key.id).ok_or(ResolveError::NotFound(phone))
    }

    /// Resolve `@username` (the `@` is optional) with `contacts.resolveUsername`.
    pub async fn resolve_username(
        &self,
        cancel:   &CancellationToken,
        username: &str,
    ) -> Result<tl::enums::InputPeer, ResolveError> {
        let username = username.trim().trim_start_matches('@');
        if username.is_empty() {
            return Err(ResolveError::NotFound(username.to_string()));
        }
        let req = tl::functions::contacts::ResolveUsername { username: username.to_string() };
        match self.invoke(cancel, req).await {
            Ok(tl::enums::contacts::ResolvedPeer::ResolvedPeer(r)) => Ok(self.peers().input_peer(&r.peer)),
            Err(e) if e.is("USERNAME_NOT_OCCUPIED") || e.is("USERNAME_INVALID") => {
                Err(ResolveError::NotFound(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a phone number or a username to an addressable peer.
    pub async fn resolve(&self, cancel: &CancellationToken, peer: &str) -> Result<tl::enums::InputPeer, ResolveError> {
        let peer = peer.trim();
        if peer.is_empty() {
            return Err(ResolveError::NotFound(String::new()));
        }
        if is_phone_number(peer) {
            let user = self.resolve_phone(cancel, peer).await?;
            return Ok(tl::enums::InputPeer::User(tl::types::InputPeerUser {
                user_id:     user.id,
                access_hash: user.access_hash.unwrap_or(0),
            }));
        }
        self.resolve_username(cancel, peer).await
    }

    // ── Broadcast ──────────────────────────────────────────────────────────

    /// Send `request.text` to every peer in `request.peers`.
    ///
    /// Only a signed-out account fails the whole call; everything else is
    /// reported per peer.
    pub async fn broadcast(
        &self,
        cancel:  &CancellationToken,
        request: &BroadcastRequest,
    ) -> Result<BroadcastResponse, GatewayError> {
        if !self.is_authorized() {
            return Err(GatewayError::bad_gateway(
                "chat.broadcast.telegram.unauthorized",
                "telegram: account is not authorized",
            ));
        }

        let mut failures = Vec::new();
        let mut targets  = Vec::with_capacity(request.peers.len());
        let mut seen     = HashSet::new();

        for (index, peer) in request.peers.iter().enumerate() {
            match self.resolve(cancel, peer).await {
                Ok(input) if !seen.insert(input.clone()) => {
                    failures.push((index, FailureReason::from(&ResolveError::Duplicate(peer.clone()))));
                }
                Ok(input) => targets.push((index, input)),
                Err(e) => {
                    tracing::debug!(%peer, error = %e, "[courier] broadcast peer unresolved");
                    failures.push((index, FailureReason::from(&e)));
                }
            }
        }

        for (index, peer) in targets {
            let req = tl::functions::messages::SendMessage {
                peer,
                message:   request.text.clone(),
                random_id: crate::random_i64(),
                ..Default::default()
            };
            if let Err(e) = self.invoke_with_retry(cancel, req).await {
                tracing::warn!(peer = %request.peers[index], error = %e, "[courier] broadcast send failed");
                failures.push((index, FailureReason::from(&e)));
            }
        }

        failures.sort_by_key(|(index, _)| *index);
        let failures = failures
            .into_iter()
            .map(|(index, error)| BroadcastFailure { peer: request.peers[index].clone(), error })
            .collect();
        Ok(BroadcastResponse { failures })
    }
}

/// The one non-empty user with `id`, if the list has exactly that.
fn single_user(users: Vec<tl::enums::User>, id: i64) -> Option<tl::types::User> {
    let mut found = users.into_iter().filter_map(|u| match u {
        tl::enums::User::User(u) if u.id == id => Some(u),
        _ => None,
    });
    let first = found.next()?;
    found.next().is_none().then_some(first)
}

// ─── Envelope ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastRequest {
    pub peers: Vec<String>,
    pub text:  String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BroadcastFailure>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastFailure {
    /// The peer exactly as it was given.
    pub peer:  String,
    pub error: FailureReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub code:    i32,
    pub message: String,
}

impl From<&ResolveError> for FailureReason {
    fn from(e: &ResolveError) -> Self {
        match e {
            ResolveError::NotFound(_)   => Self { code: 404, message: "peer not found".into() },
            ResolveError::Duplicate(_)  => Self { code: 400, message: "chat.broadcast.peer.duplicate".into() },
            ResolveError::Invocation(e) => Self::from(e),
        }
    }
}

impl From<&InvocationError> for FailureReason {
    fn from(e: &InvocationError) -> Self {
        match e.rpc() {
            Some(rpc) => Self { code: rpc.code, message: rpc.message() },
            None      => Self { code: 500, message: e.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_phone_keeps_digits_only() {
        assert_eq!(cleanup_phone("+1 (555) 010-99"), "155501099");
        assert_eq!(cleanup_phone(&cleanup_phone("+1 (555) 010-99")), "155501099");
        assert_eq!(cleanup_phone("@user"), "");
    }

    #[test]
    fn phone_shape() {
        assert!(is_phone_number("+1000000000"));
        assert!(is_phone_number("+1 (555)\t010-99"));
        assert!(!is_phone_number("invalid"));
        assert!(!is_phone_number("+-()"));
        assert!(!is_phone_number("@1000"));
    }

    #[test]
    fn failure_reason_from_rpc() {
        let e: InvocationError = crate::errors::RpcError::from_telegram(400, "PEER_FLOOD").into();
        assert_eq!(FailureReason::from(&e), FailureReason { code: 400, message: "PEER_FLOOD".into() });
        let e = ResolveError::NotFound("x".into());
        assert_eq!(FailureReason::from(&e).code, 404);
    }
}
