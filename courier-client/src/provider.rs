//! The `gotd` channel provider: one Telegram user account per bot profile.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use courier_gateway::{
    FileStorage, Gateway, GatewayError, MessageKind, Provider, ProviderRegistry, Result, Update,
};
use courier_tl as tl;
use tokio_util::sync::CancellationToken;

use crate::Client;
use crate::broadcast::{BroadcastRequest, BroadcastResponse};
use crate::config::{Config, keys};
use crate::errors::{ConfigError, InvocationError, MediaError, SessionError};
use crate::gateway::GatewayHandle;
use crate::invoker::TransportFactory;
use crate::peers::PeerKey;
use crate::session::TelegramSession;

/// Code name the provider registers under.
pub const PROVIDER_NAME: &str = "gotd";

// ─── TelegramApp ──────────────────────────────────────────────────────────────

/// A running Telegram account bound to a bot profile.
pub struct TelegramApp {
    identity: [u8; 32],
    session:  Arc<TelegramSession>,
}

impl TelegramApp {
    /// Build the account for `gateway`; nothing connects until
    /// [`Provider::register`] (or [`TelegramSession::start`]).
    pub fn new(
        gateway:    Arc<dyn Gateway>,
        storage:    Arc<dyn FileStorage>,
        transports: &dyn TransportFactory,
    ) -> Result<Self> {
        let config = Config::from_metadata(&gateway.metadata()).map_err(config_error)?;
        Ok(Self::with_config(gateway, config, storage, transports))
    }

    fn with_config(
        gateway:    Arc<dyn Gateway>,
        config:     Config,
        storage:    Arc<dyn FileStorage>,
        transports: &dyn TransportFactory,
    ) -> Self {
        let identity  = config.app_identity();
        let transport = transports.transport(&config);
        let client    = Client::new(transport, config);
        let session   = TelegramSession::new(client, GatewayHandle::new(gateway), storage);
        Self { identity, session: Arc::new(session) }
    }

    pub fn session(&self) -> &Arc<TelegramSession> { &self.session }

    /// Send `request.text` to each listed phone number or username.
    pub async fn broadcast(&self, cancel: &CancellationToken, request: &BroadcastRequest) -> Result<BroadcastResponse> {
        self.session.client().broadcast(cancel, request).await
    }

    /// Addressable peer of the private chat with user `user_id`.
    async fn user_peer(&self, cancel: &CancellationToken, user_id: i64) -> std::result::Result<tl::enums::InputPeer, InvocationError> {
        let client = self.session.client();
        if let Some(value) = client.peers().find(PeerKey::user(user_id)) {
            return Ok(tl::enums::InputPeer::User(tl::types::InputPeerUser {
                user_id,
                access_hash: value.access_hash,
            }));
        }
        let input = tl::enums::InputUser::User(tl::types::InputUser { user_id, access_hash: 0 });
        let users = client.invoke(cancel, tl::functions::users::GetUsers { id: vec![input] }).await?;
        let access_hash = users
            .into_iter()
            .find_map(|u| match u {
                tl::enums::User::User(u) if u.id == user_id => u.access_hash,
                _ => None,
            })
            .unwrap_or(0);
        Ok(tl::enums::InputPeer::User(tl::types::InputPeerUser { user_id, access_hash }))
    }
}

#[async_trait]
impl Provider for TelegramApp {
    fn name(&self) -> &'static str { PROVIDER_NAME }

    async fn send_notify(&self, cancel: &CancellationToken, notify: &Update) -> Result<()> {
        let chat_id = notify.chat.chat_id.trim();
        let user_id = chat_id.parse::<i64>().map_err(|_| {
            GatewayError::internal(
                "chat.gateway.telegram.chat.id.invalid",
                format!("telegram: invalid chat id {chat_id:?}"),
            )
        })?;
        let peer = self.user_peer(cancel, user_id).await.map_err(invocation_error)?;
        let client = self.session.client();
        let message = &notify.message;

        match message.kind {
            MessageKind::Text => {
                let req = tl::functions::messages::SendMessage {
                    peer,
                    message:   message.text.clone(),
                    random_id: crate::random_i64(),
                    ..Default::default()
                };
                client.invoke_with_retry(cancel, req).await.map_err(invocation_error)?;
            }
            MessageKind::File => {
                let Some(file) = &message.file else {
                    return Err(GatewayError::bad_request(
                        "chat.gateway.telegram.file.required",
                        "telegram: file message without a file",
                    ));
                };
                let uploaded = self.session.media().upload_from_url(cancel, file).await.map_err(media_error)?;
                let req = tl::functions::messages::SendMedia {
                    silent:    false,
                    peer,
                    media:     uploaded.input_media(),
                    message:   message.text.clone(),
                    random_id: crate::random_i64(),
                };
                client.invoke_with_retry(cancel, req).await.map_err(invocation_error)?;
            }
            other => {
                tracing::warn!(kind = other.as_str(), "[courier] send: message type not implemented; skipped");
            }
        }
        Ok(())
    }

    fn router(&self) -> Router {
        crate::http::router(Arc::clone(&self.session))
    }

    async fn register(&self, cancel: &CancellationToken, _uri: &str) -> Result<()> {
        match self.session.start(cancel).await {
            Ok(()) | Err(SessionError::AlreadyRunning) => Ok(()),
            Err(e) => Err(session_error(e)),
        }
    }

    async fn deregister(&self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.session.stop().await.map_err(session_error)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> { self }
}

// ─── Factory ──────────────────────────────────────────────────────────────────

/// Register the `gotd` provider.
///
/// A profile rebuilt with the same `api_id`/`api_hash` keeps its running
/// account and only swaps the profile. Anything else starts a new account
/// in the background; a replaced one is stopped.
pub fn register(
    registry:   &mut ProviderRegistry,
    storage:    Arc<dyn FileStorage>,
    transports: Arc<dyn TransportFactory>,
) -> Result<()> {
    registry.register(PROVIDER_NAME, move |gateway, state| {
        let config = Config::from_metadata(&gateway.metadata()).map_err(config_error)?;

        if let Some(app) = state.and_then(|s| s.as_any().downcast::<TelegramApp>().ok()) {
            if app.identity == config.app_identity() {
                app.session.gateway().replace(gateway);
                return Ok(app as Arc<dyn Provider>);
            }
            spawn(async move {
                if let Err(e) = app.close().await {
                    tracing::warn!(error = %e, "[courier] replaced account did not stop cleanly");
                }
            });
        }

        let app = Arc::new(TelegramApp::with_config(gateway, config, Arc::clone(&storage), &*transports));
        let starting = Arc::clone(&app);
        spawn(async move {
            let cancel = CancellationToken::new();
            if let Err(e) = starting.register(&cancel, "").await {
                tracing::warn!(error = %e, "[courier] account start failed");
            }
        });
        Ok(app as Arc<dyn Provider>)
    })
}

fn spawn(task: impl std::future::Future<Output = ()> + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(rt) => {
            rt.spawn(task);
        }
        Err(_) => tracing::debug!("[courier] no runtime; background task skipped"),
    }
}

// ─── Error mapping ────────────────────────────────────────────────────────────

fn config_error(e: ConfigError) -> GatewayError {
    match e {
        ConfigError::Missing(keys::API_ID) | ConfigError::Invalid { key: keys::API_ID, .. } => {
            GatewayError::bad_request("chat.bot.telegram.api_id.invalid", "telegram: api_id is invalid or missing")
        }
        ConfigError::Missing(keys::API_HASH) => {
            GatewayError::bad_request("chat.bot.telegram.api_hash.required", "telegram: api_hash required but missing")
        }
        other => GatewayError::bad_request("chat.bot.telegram.config.invalid", other.to_string()),
    }
}

/// Remote errors keep their name and code; server-side codes, and codes
/// that are no HTTP status, become 502.
pub(crate) fn invocation_error(e: InvocationError) -> GatewayError {
    match e.rpc() {
        Some(rpc) => {
            let code = match u16::try_from(rpc.code) {
                Ok(code) if (100..500).contains(&code) => code,
                _ => 502,
            };
            GatewayError::new(rpc.name.clone(), code, rpc.message())
        }
        None => GatewayError::bad_gateway("chat.gateway.telegram.request.error", e.to_string()),
    }
}

fn media_error(e: MediaError) -> GatewayError {
    match e {
        MediaError::Invocation(e) => invocation_error(e),
        MediaError::Storage(e)    => e,
        other => GatewayError::bad_gateway("chat.gateway.telegram.media.error", other.to_string()),
    }
}

fn session_error(e: SessionError) -> GatewayError {
    match e {
        SessionError::Invocation(e) => invocation_error(e),
        SessionError::Gateway(e)    => e,
        other => GatewayError::internal("chat.gateway.telegram.session.error", other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_map_to_bad_request() {
        let e = config_error(ConfigError::Invalid { key: keys::API_ID, value: "x".into() });
        assert_eq!(e.id, "chat.bot.telegram.api_id.invalid");
        assert_eq!(e.code, 400);
        assert_eq!(config_error(ConfigError::Missing(keys::API_HASH)).id, "chat.bot.telegram.api_hash.required");
    }

    #[test]
    fn server_side_rpc_errors_become_bad_gateway() {
        let e: InvocationError = crate::errors::RpcError::from_telegram(500, "INTERNAL").into();
        assert_eq!(invocation_error(e).code, 502);
        let e: InvocationError = crate::errors::RpcError::from_telegram(403, "USER_PRIVACY_RESTRICTED").into();
        assert_eq!(invocation_error(e), GatewayError::new("USER_PRIVACY_RESTRICTED", 403, "USER_PRIVACY_RESTRICTED"));
    }

    #[test]
    fn client_side_rpc_codes_pass_through() {
        let code = |c: i32| invocation_error(crate::errors::RpcError::from_telegram(c, "X").into()).code;
        assert_eq!(code(303), 303);
        assert_eq!(code(420), 420);
        assert_eq!(code(0), 502);
        assert_eq!(code(-503), 502);
    }
}
