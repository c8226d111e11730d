//! Authenticated-user snapshot and its change notifications.
//!
//! Every subscriber owns a single-slot mailbox. Notifying never blocks: an
//! empty slot takes the new state; a full slot is overwritten with the new
//! state, then the subscriber is dropped and its mailbox closed. A slow reader
//! therefore sees at most the latest transition, followed by end-of-stream.

use std::sync::{Arc, Mutex, MutexGuard};

use courier_tl as tl;
use tokio::sync::Notify;

/// An authorization state transition.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthEvent {
    SignedIn(tl::types::User),
    SignedOut,
}

// ─── Mailbox ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Slot {
    value:  Option<AuthEvent>,
    closed: bool,
}

#[derive(Default)]
struct Mailbox {
    slot:   Mutex<Slot>,
    notify: Notify,
}

impl Mailbox {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deposit `event`; returns `false` if the slot was already full.
    fn offer(&self, event: AuthEvent) -> bool {
        let mut slot = self.lock();
        let was_empty = slot.value.is_none();
        slot.value = Some(event);
        drop(slot);
        self.notify.notify_one();
        was_empty
    }

    fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }
}

// ─── AuthSubscription ─────────────────────────────────────────────────────────

/// Receiving end of [`AuthSignal::subscribe`].
pub struct AuthSubscription {
    id:      u64,
    mailbox: Arc<Mailbox>,
}

impl AuthSubscription {
    pub fn id(&self) -> u64 { self.id }

    /// Wait for the next transition; `None` once the subscription is closed
    /// and drained.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            {
                let mut slot = self.mailbox.lock();
                if let Some(event) = slot.value.take() {
                    return Some(event);
                }
                if slot.closed {
                    return None;
                }
            }
            self.mailbox.notify.notified().await;
        }
    }

    /// Take a pending transition without waiting.
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        self.mailbox.lock().value.take()
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.lock().closed
    }
}

// ─── AuthSignal ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Presence {
    user:        Option<tl::types::User>,
    subscribers: Vec<(u64, Arc<Mailbox>)>,
    next_id:     u64,
    sign_ins:    u64,
}

/// The authenticated-user snapshot plus its subscribers.
///
/// Guarded by a short synchronous lock that is never held across I/O, so a
/// forced de-authentication from the call pipeline can run while a login
/// flow is mid-call.
#[derive(Default)]
pub struct AuthSignal {
    inner: Mutex<Presence>,
}

impl AuthSignal {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> MutexGuard<'_, Presence> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current authenticated user, if any.
    pub fn user(&self) -> Option<tl::types::User> {
        self.lock().user.clone()
    }

    pub fn is_authorized(&self) -> bool {
        self.lock().user.is_some()
    }

    /// Install (or clear) the user snapshot and notify every subscriber.
    pub fn set_user(&self, user: Option<tl::types::User>) {
        let mut p = self.lock();
        if user.is_some() && user.as_ref().map(|u| u.id) != p.user.as_ref().map(|u| u.id) {
            p.sign_ins += 1;
        }
        p.user = user;
        Self::broadcast(&mut p);
    }

    /// Counts sign-ins: bumped when a user is installed over no user or over
    /// a different one, never by a refresh of the same user.
    pub fn sign_ins(&self) -> u64 {
        self.lock().sign_ins
    }

    /// Clear the snapshot if one is installed; returns whether it was.
    pub fn reset(&self) -> bool {
        let mut p = self.lock();
        if p.user.is_none() {
            return false;
        }
        p.user = None;
        Self::broadcast(&mut p);
        true
    }

    fn broadcast(p: &mut Presence) {
        let event = match &p.user {
            Some(u) => AuthEvent::SignedIn(u.clone()),
            None    => AuthEvent::SignedOut,
        };
        p.subscribers.retain(|(id, mailbox)| {
            if mailbox.offer(event.clone()) {
                return true;
            }
            tracing::warn!(subscriber = id, "[courier] auth subscriber is not reading; unsubscribed");
            mailbox.close();
            false
        });
    }

    /// Subscribe to transitions. If a user is signed in, the subscription
    /// starts with that state already pending.
    pub fn subscribe(&self) -> AuthSubscription {
        let mut p = self.lock();
        let id = p.next_id;
        p.next_id += 1;

        let mailbox = Arc::new(Mailbox::default());
        if let Some(u) = &p.user {
            mailbox.offer(AuthEvent::SignedIn(u.clone()));
        }
        p.subscribers.push((id, Arc::clone(&mailbox)));
        AuthSubscription { id, mailbox }
    }

    /// Remove the subscription, close it and discard whatever is pending.
    pub fn unsubscribe(&self, sub: &AuthSubscription) {
        self.lock().subscribers.retain(|(id, _)| *id != sub.id);
        sub.mailbox.close();
        sub.mailbox.lock().value = None;
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
