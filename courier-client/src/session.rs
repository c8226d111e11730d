//! The session controller: owns the run task of one account.
//!
//! [`TelegramSession::start`] spawns the task and waits until the connection
//! is up and the login state is known. The task drives the transport and,
//! alongside it, reacts to authorization changes: a sign-in warms the peer
//! directory with a paged dialog sync, a sign-out purges it. On the way out
//! the protocol session is flushed and the logout tokens and user access
//! hashes are persisted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use courier_gateway::FileStorage;
use courier_tl as tl;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::Client;
use crate::auth::Authenticator;
use crate::config::keys;
use crate::errors::{InvocationError, SessionError};
use crate::gateway::GatewayHandle;
use crate::invoker::{Link, UpdateHandler};
use crate::media::MediaTransfer;
use crate::session_backend::{
    MetadataBackend, SessionBackend, decode_peers, decode_tokens, encode_peers, encode_tokens,
};
use crate::signal::AuthEvent;
use crate::update::Normalizer;

/// Delay before retrying a dialog page that timed out server-side.
const TIMEOUT_BACKOFF: Duration = Duration::from_secs(1);

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<Result<(), SessionError>>,
}

// ─── TelegramSession ──────────────────────────────────────────────────────────

/// One account's connection, login flow and inbound pipeline.
pub struct TelegramSession {
    client:  Client,
    gateway: GatewayHandle,
    auth:    Arc<Authenticator>,
    media:   MediaTransfer,
    backend: Arc<dyn SessionBackend>,
    /// Holds the only strong reference; the pipeline keeps a weak one.
    _updates: Arc<dyn UpdateHandler>,
    started: Arc<AtomicBool>,
    task:    Mutex<Option<Running>>,
}

impl TelegramSession {
    /// Wire a session over `client`, persisting the protocol session in the
    /// bot metadata.
    pub fn new(client: Client, gateway: GatewayHandle, storage: Arc<dyn FileStorage>) -> Self {
        let backend = Arc::new(MetadataBackend::new(gateway.clone()));
        Self::with_backend(client, gateway, storage, backend)
    }

    pub fn with_backend(
        client:  Client,
        gateway: GatewayHandle,
        storage: Arc<dyn FileStorage>,
        backend: Arc<dyn SessionBackend>,
    ) -> Self {
        let media = MediaTransfer::new(client.clone(), storage, gateway.clone());
        let updates: Arc<dyn UpdateHandler> =
            Arc::new(Normalizer::new(client.clone(), gateway.clone(), media.clone()));
        client.set_update_handler(Arc::downgrade(&updates) as Weak<dyn UpdateHandler>);

        Self {
            auth: Arc::new(Authenticator::new(client.clone())),
            client,
            gateway,
            media,
            backend,
            _updates: updates,
            started: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn client(&self) -> &Client { &self.client }

    pub fn authenticator(&self) -> &Arc<Authenticator> { &self.auth }

    pub fn media(&self) -> &MediaTransfer { &self.media }

    pub fn gateway(&self) -> &GatewayHandle { &self.gateway }

    /// Connected, with the login state restored.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    /// Spawn the run task and wait until it is ready.
    ///
    /// Returns the task's own error if it exits before getting there. When
    /// `cancel` fires first the task is stopped and `Cancelled` returned.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Err(SessionError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        let (ready_tx, ready_rx) = oneshot::channel();
        let runner = Runner {
            client:  self.client.clone(),
            gateway: self.gateway.clone(),
            auth:    Arc::clone(&self.auth),
            backend: Arc::clone(&self.backend),
            started: Arc::clone(&self.started),
        };
        let mut handle = tokio::spawn(runner.run(token.clone(), ready_tx));

        tokio::select! {
            biased;
            ready = ready_rx => match ready {
                Ok(()) => {
                    *task = Some(Running { cancel: token, handle });
                    tracing::info!("[courier] session started ✓");
                    Ok(())
                }
                Err(_) => Err(join(handle.await).err().unwrap_or(SessionError::Stopped)),
            },
            exit = &mut handle => Err(join(exit).err().unwrap_or(SessionError::Stopped)),
            _ = cancel.cancelled() => {
                token.cancel();
                if let Err(e) = join(handle.await) {
                    tracing::debug!(error = %e, "[courier] session task exited on cancel");
                }
                Err(InvocationError::Cancelled.into())
            }
        }
    }

    /// Cancel the run task and wait for its final result.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let Some(running) = self.task.lock().await.take() else { return Ok(()) };
        running.cancel.cancel();
        let result = join(running.handle.await);
        tracing::info!("[courier] session stopped");
        result
    }
}

fn join(res: Result<Result<(), SessionError>, tokio::task::JoinError>) -> Result<(), SessionError> {
    res.unwrap_or(Err(SessionError::Panicked))
}

// ─── Run task ─────────────────────────────────────────────────────────────────

struct Runner {
    client:  Client,
    gateway: GatewayHandle,
    auth:    Arc<Authenticator>,
    backend: Arc<dyn SessionBackend>,
    started: Arc<AtomicBool>,
}

impl Runner {
    async fn run(self, cancel: CancellationToken, ready: oneshot::Sender<()>) -> Result<(), SessionError> {
        let (connected_tx, connected_rx) = oneshot::channel();
        let link = Link {
            session:   Arc::clone(&self.backend),
            updates:   self.client.update_sink(),
            connected: connected_tx,
        };
        let transport = self.client.transport();

        let result = tokio::select! {
            r = transport.run(cancel.clone(), link) => r.map_err(SessionError::from),
            r = self.body(&cancel, connected_rx, ready) => r,
        };
        cancel.cancel();
        self.started.store(false, Ordering::Release);
        self.persist().await;

        if let Err(e) = &result {
            tracing::error!(error = %e, "[courier] session exited");
        }
        result
    }

    async fn body(
        &self,
        cancel:    &CancellationToken,
        connected: oneshot::Receiver<()>,
        ready:     oneshot::Sender<()>,
    ) -> Result<(), SessionError> {
        if connected.await.is_err() {
            return Err(InvocationError::Dropped.into());
        }

        if let Err(e) = self.auth.refresh_self(cancel).await {
            tracing::warn!(error = %e, "[courier] could not read the signed-in user");
        }
        self.restore_tokens().await;
        self.restore_peers();

        self.started.store(true, Ordering::Release);
        if ready.send(()).is_err() {
            return Err(SessionError::Stopped);
        }

        // Sign-in generation the directory was last synced for. Events
        // coalesce, so a sign-out may only show up as a new generation.
        let mut synced: Option<u64> = None;
        let mut sub = self.auth.subscribe();
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                ev = sub.recv() => ev,
            };
            match event {
                Some(AuthEvent::SignedIn(user)) => {
                    let generation = self.client.signal().sign_ins();
                    match synced {
                        Some(prev) if prev == generation => continue,
                        Some(_) => {
                            tracing::info!("[courier] signed in again; purging peers");
                            self.client.peers().purge();
                        }
                        None => {}
                    }
                    synced = Some(generation);
                    tracing::info!(user_id = user.id, "[courier] signed in; syncing dialogs");
                    self.sync_dialogs(cancel).await;
                }
                Some(AuthEvent::SignedOut) => {
                    if synced.take().is_some() {
                        tracing::info!("[courier] signed out; purging peers");
                        self.client.peers().purge();
                    }
                }
                None => sub = self.auth.subscribe(),
            }
        }
        self.auth.unsubscribe(&sub);
        Ok(())
    }

    /// Page through `messages.getDialogs` so the directory knows every peer
    /// the account talks to.
    async fn sync_dialogs(&self, cancel: &CancellationToken) {
        use tl::enums::messages::Dialogs;

        let limit = self.client.config().dialogs_page;
        let mut req = tl::functions::messages::GetDialogs {
            offset_peer: tl::enums::InputPeer::Empty,
            limit,
            ..Default::default()
        };
        let mut pages = 0usize;
        loop {
            let page = match self.client.invoke(cancel, req.clone()).await {
                Ok(page) => page,
                Err(e) => {
                    let delay = match e.flood_wait_seconds() {
                        Some(secs) => Duration::from_secs(secs),
                        None if e.is_timeout() => TIMEOUT_BACKOFF,
                        None => {
                            tracing::warn!(error = %e, "[courier] messages.getDialogs failed; sync stopped");
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = cancel.cancelled() => return,
                    }
                }
            };
            pages += 1;

            let messages = match page {
                Dialogs::Slice(s) if s.messages.len() >= limit.max(0) as usize => s.messages,
                Dialogs::Dialogs(_) | Dialogs::Slice(_) | Dialogs::NotModified(_) => break,
            };
            let Some(date) = messages.iter().rev().find_map(|m| match m {
                tl::enums::Message::Empty(_) => None,
                m => Some(m.date()),
            }) else {
                break;
            };
            req.offset_date = date;
        }
        tracing::info!(pages, "[courier] dialogs synced ✓");
    }

    async fn restore_tokens(&self) {
        let encoded = self.gateway.get().metadata().remove(keys::AUTH).unwrap_or_default();
        match decode_tokens(&encoded) {
            Ok(tokens) if !tokens.is_empty() => {
                tracing::debug!(count = tokens.len(), "[courier] logout tokens restored");
                self.auth.restore_tokens(tokens).await;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "[courier] stored logout tokens unreadable; ignored"),
        }
    }

    fn restore_peers(&self) {
        let encoded = self.gateway.get().metadata().remove(keys::PEERS).unwrap_or_default();
        match decode_peers(&encoded) {
            Ok(users) if !users.is_empty() => {
                tracing::debug!(count = users.len(), "[courier] user access hashes restored");
                self.client.peers().restore_users(&users);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "[courier] stored access hashes unreadable; ignored"),
        }
    }

    /// Flush the protocol session, then store the logout tokens and the user
    /// access hashes. Runs after cancellation, so it gets a token of its own.
    async fn persist(&self) {
        let cancel = CancellationToken::new();
        if let Err(e) = self.backend.flush(&cancel).await {
            tracing::warn!(backend = self.backend.name(), error = %e, "[courier] session flush failed");
        }

        let mut metadata = HashMap::new();
        match encode_tokens(&self.auth.backup_tokens().await) {
            Ok(Some(encoded)) => { metadata.insert(keys::AUTH.to_string(), encoded); }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "[courier] logout tokens not encodable"),
        }
        // An empty value clears hashes left over from a previous account.
        match encode_peers(&self.client.peers().backup_users()) {
            Ok(encoded) => { metadata.insert(keys::PEERS.to_string(), encoded.unwrap_or_default()); }
            Err(e) => tracing::warn!(error = %e, "[courier] access hashes not encodable"),
        }
        if let Err(e) = self.gateway.get().set_metadata(&cancel, metadata).await {
            tracing::warn!(error = %e, "[courier] session metadata not saved");
        }
    }
}
