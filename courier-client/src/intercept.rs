//! The call/update interception pipeline.
//!
//! [`Intercept`] wraps the raw transport. Every result that embeds users or
//! chats feeds the [`PeerDirectory`]; `Updates` returned inline are replayed
//! into the update handler exactly as if they had been pushed; a revoked
//! authorization resets the [`AuthSignal`] before the error reaches the
//! caller.

use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use courier_tl as tl;
use courier_tl::{Function, Object};
use tokio_util::sync::CancellationToken;

use crate::broadcast::cleanup_phone;
use crate::errors::InvocationError;
use crate::invoker::{Invoker, UpdateHandler};
use crate::peers::{PeerDirectory, PeerKey};
use crate::signal::AuthSignal;
use crate::update::UpdateError;

pub struct Intercept<I: Invoker + ?Sized> {
    next:    Arc<I>,
    peers:   Arc<PeerDirectory>,
    signal:  Arc<AuthSignal>,
    handler: OnceLock<Weak<dyn UpdateHandler>>,
    debug:   bool,
}

impl<I: Invoker + ?Sized> Intercept<I> {
    pub fn new(next: Arc<I>, peers: Arc<PeerDirectory>, signal: Arc<AuthSignal>, debug: bool) -> Self {
        Self { next, peers, signal, handler: OnceLock::new(), debug }
    }

    /// Install the downstream update handler. Only the first call wins.
    pub fn set_update_handler(&self, handler: Weak<dyn UpdateHandler>) {
        if self.handler.set(handler).is_err() {
            tracing::warn!("[courier] update handler already installed; ignoring");
        }
    }

    fn downstream(&self) -> Option<Arc<dyn UpdateHandler>> {
        self.handler.get().and_then(Weak::upgrade)
    }

    // ── Directory population ───────────────────────────────────────────────

    fn populate(&self, request: &Function, result: &Object) {
        use tl::enums::{contacts, messages, updates, users};

        match result {
            Object::Dialogs(messages::Dialogs::Dialogs(d)) => self.peers.apply(&d.users, &d.chats),
            Object::Dialogs(messages::Dialogs::Slice(d))   => self.peers.apply(&d.users, &d.chats),
            Object::Dialogs(messages::Dialogs::NotModified(_)) => {}
            Object::PeerDialogs(messages::PeerDialogs::PeerDialogs(d)) => {
                self.peers.apply(&d.users, &d.chats)
            }
            Object::Users(users) => self.peers.apply(users, &[]),
            Object::Difference(updates::Difference::Difference(d)) => self.peers.apply(&d.users, &d.chats),
            Object::Difference(updates::Difference::Slice(d))      => self.peers.apply(&d.users, &d.chats),
            Object::ResolvedPeer(contacts::ResolvedPeer::ResolvedPeer(r)) => {
                self.peers.apply(&r.users, &r.chats);
                if let Function::ContactsResolvePhone(req) = request {
                    let phone = cleanup_phone(&req.phone);
                    if !phone.is_empty() {
                        self.peers.save_phone(&phone, PeerKey::from(&r.peer));
                    }
                }
            }
            Object::UserFull(users::UserFull::UserFull(f)) => {
                self.peers.apply(&f.users, &f.chats);
                let tl::enums::UserFull::UserFull(full) = &f.full_user;
                self.peers.save_user_fulls([full.clone()]);
            }
            Object::ChatFull(messages::ChatFull::ChatFull(f)) => {
                self.peers.apply(&f.users, &f.chats);
                self.peers.apply_chat_full(&f.full_chat);
            }
            Object::Updates(u) => {
                let (users, chats) = u.entities();
                self.peers.apply(users, chats);
            }
            _ => {}
        }
    }

    async fn dispatch(&self, cancel: &CancellationToken, updates: tl::enums::Updates) -> Result<(), UpdateError> {
        if self.debug {
            tracing::debug!(?updates, "[courier] ← updates");
        }
        match self.downstream() {
            Some(handler) => handler.handle(cancel, updates).await,
            None => {
                tracing::debug!("[courier] no update handler installed; dropping batch");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<I: Invoker + ?Sized> Invoker for Intercept<I> {
    async fn invoke(&self, cancel: &CancellationToken, request: Function) -> Result<Object, InvocationError> {
        let name = request.name();
        if self.debug {
            tracing::debug!(call = name, ?request, "[courier] →");
        }

        let result = match self.next.invoke(cancel, request.clone()).await {
            Ok(result) => result,
            Err(e) => {
                if self.debug {
                    tracing::debug!(call = name, error = %e, "[courier] ✗");
                }
                if e.is_unauthorized() && self.signal.reset() {
                    tracing::warn!(call = name, error = %e, "[courier] authorization revoked; signed out");
                }
                return Err(e);
            }
        };

        if self.debug {
            tracing::debug!(call = name, ?result, "[courier] ←");
        }

        self.populate(&request, &result);

        if let Object::Updates(updates) = &result {
            if let Err(e) = self.dispatch(cancel, updates.clone()).await {
                tracing::warn!(call = name, error = %e, "[courier] inline updates not handled");
            }
        }
        Ok(result)
    }
}

#[async_trait]
impl<I: Invoker + ?Sized> UpdateHandler for Intercept<I> {
    async fn handle(&self, cancel: &CancellationToken, updates: tl::enums::Updates) -> Result<(), UpdateError> {
        let (users, chats) = updates.entities();
        self.peers.apply(users, chats);
        self.dispatch(cancel, updates).await
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
