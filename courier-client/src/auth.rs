//! Interactive user login: phone → code → (2FA) → authorized, and back.
//!
//! The flow state (phone, pending sent-code, logout tokens) is serialized
//! through one async lock. The authenticated-user snapshot lives in the
//! client's [`AuthSignal`](crate::signal::AuthSignal) so the call pipeline
//! can reset it without waiting for a login step in flight.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use courier_tl as tl;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::Client;
use crate::errors::{AuthError, InvocationError, RpcError};
use crate::session_backend::MAX_LOGOUT_TOKENS;
use crate::signal::AuthSubscription;
use crate::two_factor_auth;

#[derive(Default)]
struct Flow {
    phone:      String,
    request:    Option<tl::types::auth::SentCode>,
    request_at: Option<DateTime<Utc>>,
    session_at: Option<DateTime<Utc>>,
    /// Most recent first.
    tokens:     VecDeque<Vec<u8>>,
}

impl Flow {
    fn push_token(&mut self, token: Vec<u8>) {
        if self.tokens.len() >= MAX_LOGOUT_TOKENS {
            self.tokens.pop_back();
        }
        self.tokens.push_front(token);
    }
}

/// Login state machine for one account.
pub struct Authenticator {
    client: Client,
    flow:   Mutex<Flow>,
}

impl Authenticator {
    pub fn new(client: Client) -> Self {
        Self { client, flow: Mutex::new(Flow::default()) }
    }

    /// Re-read the logged-in user from the server and publish it.
    ///
    /// A session without authorization yields `Ok(None)` and leaves the
    /// snapshot untouched.
    pub async fn refresh_self(&self, cancel: &CancellationToken) -> Result<Option<tl::types::User>, InvocationError> {
        let me = self.client.get_me(cancel).await?;
        if let Some(user) = &me {
            tracing::info!(user_id = user.id, "[courier] session authorized ✓");
            self.client.signal().set_user(Some(user.clone()));
        }
        Ok(me)
    }

    // ── Login ──────────────────────────────────────────────────────────────

    /// Request a login code for `phone`, or ask for it to be resent when a
    /// code is already pending.
    pub async fn send_code(
        &self,
        cancel: &CancellationToken,
        phone:  &str,
    ) -> Result<tl::enums::auth::SentCode, AuthError> {
        let mut flow = self.flow.lock().await;
        flow.request_at = Some(Utc::now());

        let sent = match &flow.request {
            Some(pending) => {
                let req = tl::functions::auth::ResendCode {
                    phone_number:    phone.to_string(),
                    phone_code_hash: pending.phone_code_hash.clone(),
                };
                self.client.invoke(cancel, req).await?
            }
            None => {
                let config = self.client.config();
                let tokens: Vec<Vec<u8>> = flow.tokens.iter().cloned().collect();
                let settings = tl::types::CodeSettings {
                    logout_tokens: (!tokens.is_empty()).then_some(tokens),
                    ..Default::default()
                };
                let req = tl::functions::auth::SendCode {
                    phone_number: phone.to_string(),
                    api_id:       config.api_id,
                    api_hash:     config.api_hash.clone(),
                    settings:     tl::enums::CodeSettings::CodeSettings(settings),
                };
                self.client.invoke(cancel, req).await?
            }
        };

        flow.phone = phone.to_string();
        match &sent {
            tl::enums::auth::SentCode::SentCode(s) => {
                tracing::info!("[courier] login code sent");
                flow.request = Some(s.clone());
            }
            tl::enums::auth::SentCode::Success(s) => {
                tracing::info!("[courier] logout token accepted; no code needed");
                Self::commit(&mut flow, &self.client, s.authorization.clone())?;
            }
        }
        Ok(sent)
    }

    /// Best-effort `auth.cancelCode`; the pending request is dropped anyway.
    pub async fn cancel_code(&self, cancel: &CancellationToken) {
        let mut flow = self.flow.lock().await;
        let Some(pending) = flow.request.take() else { return };
        let req = tl::functions::auth::CancelCode {
            phone_number:    flow.phone.clone(),
            phone_code_hash: pending.phone_code_hash,
        };
        if let Err(e) = self.client.invoke(cancel, req).await {
            tracing::debug!(error = %e, "[courier] auth.cancelCode failed; ignoring");
        }
    }

    /// Complete login with the code delivered to the phone.
    pub async fn sign_in(
        &self,
        cancel: &CancellationToken,
        code:   &str,
    ) -> Result<tl::types::auth::Authorization, AuthError> {
        let mut flow = self.flow.lock().await;
        let Some(pending) = &flow.request else {
            return Err(InvocationError::Rpc(RpcError::auth_restart()).into());
        };
        let req = tl::functions::auth::SignIn {
            phone_number:    flow.phone.clone(),
            phone_code_hash: pending.phone_code_hash.clone(),
            phone_code:      Some(code.trim().to_string()),
        };
        let authorization = match self.client.invoke(cancel, req).await {
            Ok(a) => a,
            Err(e) if e.is("SESSION_PASSWORD_NEEDED") => return Err(AuthError::PasswordRequired),
            Err(e) => return Err(e.into()),
        };
        let session = Self::commit(&mut flow, &self.client, authorization)?;
        tracing::info!(user_id = session.user.id(), "[courier] signed in ✓");
        Ok(session)
    }

    /// Complete login with the account's 2FA password.
    pub async fn password(
        &self,
        cancel: &CancellationToken,
        secret: &str,
    ) -> Result<tl::types::auth::Authorization, AuthError> {
        let mut flow = self.flow.lock().await;

        let tl::enums::account::Password::Password(challenge) =
            self.client.invoke(cancel, tl::functions::account::GetPassword {}).await?;
        let proof = two_factor_auth::check_password_srp(&challenge, secret.as_bytes())?;

        let req = tl::functions::auth::CheckPassword { password: proof };
        let authorization = match self.client.invoke(cancel, req).await {
            Ok(a) => a,
            Err(e) if e.is("PASSWORD_HASH_INVALID") => return Err(AuthError::InvalidPassword),
            Err(e) => return Err(e.into()),
        };
        let session = Self::commit(&mut flow, &self.client, authorization)?;
        tracing::info!(user_id = session.user.id(), "[courier] 2FA ✓");
        Ok(session)
    }

    fn commit(
        flow:          &mut Flow,
        client:        &Client,
        authorization: tl::enums::auth::Authorization,
    ) -> Result<tl::types::auth::Authorization, AuthError> {
        let session = match authorization {
            tl::enums::auth::Authorization::Authorization(a) => a,
            tl::enums::auth::Authorization::SignUpRequired(_) => return Err(AuthError::SignUpRequired),
        };
        flow.request    = None;
        flow.session_at = Some(Utc::now());
        let user = match &session.user {
            tl::enums::User::User(u)  => Some(u.clone()),
            tl::enums::User::Empty(_) => None,
        };
        client.peers().apply(std::slice::from_ref(&session.user), &[]);
        client.signal().set_user(user);
        Ok(session)
    }

    // ── Logout ─────────────────────────────────────────────────────────────

    /// Log the account out.
    ///
    /// A transport failure leaves everything as it was. A server-side
    /// rejection still counts as an attempted logout: the session is dropped
    /// locally either way.
    pub async fn log_out(&self, cancel: &CancellationToken) -> Result<(), AuthError> {
        let mut flow = self.flow.lock().await;
        match self.client.invoke(cancel, tl::functions::auth::LogOut {}).await {
            Ok(tl::enums::auth::LoggedOut::LoggedOut(out)) => {
                if let Some(token) = out.future_auth_token.filter(|t| !t.is_empty()) {
                    flow.push_token(token);
                }
                tracing::info!("[courier] signed out ✓");
            }
            Err(e) if e.is_transport() => return Err(e.into()),
            Err(e) => tracing::warn!(error = %e, "[courier] auth.logOut rejected; dropping session"),
        }
        flow.session_at = None;
        if !self.client.signal().reset() {
            tracing::debug!("[courier] log out: no user was signed in");
        }
        Ok(())
    }

    // ── Notifications ──────────────────────────────────────────────────────

    pub fn subscribe(&self) -> AuthSubscription {
        self.client.signal().subscribe()
    }

    pub fn unsubscribe(&self, sub: &AuthSubscription) {
        self.client.signal().unsubscribe(sub)
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn user(&self) -> Option<tl::types::User> {
        self.client.me()
    }

    /// Whether a login code is awaiting [`sign_in`](Self::sign_in).
    pub async fn is_code_pending(&self) -> bool {
        self.flow.lock().await.request.is_some()
    }

    pub async fn phone(&self) -> String {
        self.flow.lock().await.phone.clone()
    }

    pub async fn requested_at(&self) -> Option<DateTime<Utc>> {
        self.flow.lock().await.request_at
    }

    pub async fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.flow.lock().await.session_at
    }

    // ── Logout tokens ──────────────────────────────────────────────────────

    /// Append restored tokens after the ones already held, up to the cap.
    pub async fn restore_tokens(&self, tokens: Vec<Vec<u8>>) {
        let mut flow = self.flow.lock().await;
        let free = MAX_LOGOUT_TOKENS.saturating_sub(flow.tokens.len());
        flow.tokens.extend(tokens.into_iter().take(free));
    }

    /// Logout tokens, most recent first.
    pub async fn backup_tokens(&self) -> Vec<Vec<u8>> {
        self.flow.lock().await.tokens.iter().cloned().collect()
    }
}
