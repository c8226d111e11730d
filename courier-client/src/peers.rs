//! In-memory peer directory: access hashes, the phone index and cached entity
//! snapshots.
//!
//! Addresses and the phone index share one lock; each of the six entity maps
//! has its own, so resolving a phone never contends with caching a channel.
//! Nothing here does I/O: it is a cache, not a source of truth.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

use courier_tl as tl;

// ─── Keys ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PeerKind {
    User,
    Chat,
    Channel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerKey {
    pub kind: PeerKind,
    pub id:   i64,
}

impl PeerKey {
    pub fn user(id: i64) -> Self { Self { kind: PeerKind::User, id } }
    pub fn chat(id: i64) -> Self { Self { kind: PeerKind::Chat, id } }
    pub fn channel(id: i64) -> Self { Self { kind: PeerKind::Channel, id } }
}

impl From<&tl::enums::Peer> for PeerKey {
    fn from(peer: &tl::enums::Peer) -> Self {
        match peer {
            tl::enums::Peer::User(p)    => Self::user(p.user_id),
            tl::enums::Peer::Chat(p)    => Self::chat(p.chat_id),
            tl::enums::Peer::Channel(p) => Self::channel(p.channel_id),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeerValue {
    pub access_hash: i64,
}

// ─── PeerDirectory ────────────────────────────────────────────────────────────

#[derive(Default)]
struct Addresses {
    data:   HashMap<PeerKey, PeerValue>,
    phones: HashMap<String, PeerKey>,
}

#[derive(Default)]
pub struct PeerDirectory {
    addresses:     Mutex<Addresses>,
    contacts_hash: AtomicI64,

    users:         Mutex<HashMap<i64, tl::types::User>>,
    user_fulls:    Mutex<HashMap<i64, tl::types::UserFull>>,
    chats:         Mutex<HashMap<i64, tl::types::Chat>>,
    chat_fulls:    Mutex<HashMap<i64, tl::types::ChatFull>>,
    channels:      Mutex<HashMap<i64, tl::types::Channel>>,
    channel_fulls: Mutex<HashMap<i64, tl::types::ChannelFull>>,
}

/// A poisoned map is still a usable cache.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl PeerDirectory {
    pub fn new() -> Self { Self::default() }

    // ── Addresses ──────────────────────────────────────────────────────────

    pub fn save(&self, key: PeerKey, value: PeerValue) {
        lock(&self.addresses).data.insert(key, value);
    }

    pub fn find(&self, key: PeerKey) -> Option<PeerValue> {
        lock(&self.addresses).data.get(&key).copied()
    }

    /// Index `key` under a digits-only `phone`.
    pub fn save_phone(&self, phone: &str, key: PeerKey) {
        lock(&self.addresses).phones.insert(phone.to_string(), key);
    }

    /// Key and access hash for `phone`; `None` unless both are known.
    pub fn find_phone(&self, phone: &str) -> Option<(PeerKey, PeerValue)> {
        let addrs = lock(&self.addresses);
        let key   = *addrs.phones.get(phone)?;
        let value = *addrs.data.get(&key)?;
        Some((key, value))
    }

    pub fn contacts_hash(&self) -> i64 {
        self.contacts_hash.load(Ordering::Acquire)
    }

    pub fn save_contacts_hash(&self, hash: i64) {
        self.contacts_hash.store(hash, Ordering::Release);
    }

    // ── Entity snapshots ───────────────────────────────────────────────────

    pub fn save_users(&self, users: impl IntoIterator<Item = tl::types::User>) {
        let mut map = lock(&self.users);
        for u in users { map.insert(u.id, u); }
    }

    pub fn find_user(&self, id: i64) -> Option<tl::types::User> {
        lock(&self.users).get(&id).cloned()
    }

    pub fn save_user_fulls(&self, fulls: impl IntoIterator<Item = tl::types::UserFull>) {
        let mut map = lock(&self.user_fulls);
        for u in fulls { map.insert(u.id, u); }
    }

    pub fn find_user_full(&self, id: i64) -> Option<tl::types::UserFull> {
        lock(&self.user_fulls).get(&id).cloned()
    }

    pub fn save_chats(&self, chats: impl IntoIterator<Item = tl::types::Chat>) {
        let mut map = lock(&self.chats);
        for c in chats { map.insert(c.id, c); }
    }

    pub fn find_chat(&self, id: i64) -> Option<tl::types::Chat> {
        lock(&self.chats).get(&id).cloned()
    }

    pub fn save_chat_fulls(&self, fulls: impl IntoIterator<Item = tl::types::ChatFull>) {
        let mut map = lock(&self.chat_fulls);
        for c in fulls { map.insert(c.id, c); }
    }

    pub fn find_chat_full(&self, id: i64) -> Option<tl::types::ChatFull> {
        lock(&self.chat_fulls).get(&id).cloned()
    }

    pub fn save_channels(&self, channels: impl IntoIterator<Item = tl::types::Channel>) {
        let mut map = lock(&self.channels);
        for c in channels { map.insert(c.id, c); }
    }

    pub fn find_channel(&self, id: i64) -> Option<tl::types::Channel> {
        lock(&self.channels).get(&id).cloned()
    }

    pub fn save_channel_fulls(&self, fulls: impl IntoIterator<Item = tl::types::ChannelFull>) {
        let mut map = lock(&self.channel_fulls);
        for c in fulls { map.insert(c.id, c); }
    }

    pub fn find_channel_full(&self, id: i64) -> Option<tl::types::ChannelFull> {
        lock(&self.channel_fulls).get(&id).cloned()
    }

    // ── Bulk population ────────────────────────────────────────────────────

    /// Store every non-empty user, chat and channel and remember the access
    /// hashes that come with them.
    pub fn apply(&self, users: &[tl::enums::User], chats: &[tl::enums::Chat]) {
        let mut user_snaps = Vec::with_capacity(users.len());
        let mut chat_snaps = Vec::new();
        let mut chan_snaps = Vec::new();
        {
            let mut addrs = lock(&self.addresses);
            for u in users {
                if let tl::enums::User::User(u) = u {
                    if let Some(hash) = u.access_hash {
                        addrs.data.insert(PeerKey::user(u.id), PeerValue { access_hash: hash });
                    }
                    user_snaps.push(u.clone());
                }
            }
            for c in chats {
                match c {
                    tl::enums::Chat::Chat(c) => {
                        addrs.data.insert(PeerKey::chat(c.id), PeerValue::default());
                        chat_snaps.push(c.clone());
                    }
                    tl::enums::Chat::Channel(c) => {
                        if let Some(hash) = c.access_hash {
                            addrs.data.insert(PeerKey::channel(c.id), PeerValue { access_hash: hash });
                        }
                        chan_snaps.push(c.clone());
                    }
                    tl::enums::Chat::ChannelForbidden(c) => {
                        addrs.data.insert(PeerKey::channel(c.id), PeerValue { access_hash: c.access_hash });
                    }
                    tl::enums::Chat::Empty(_) | tl::enums::Chat::Forbidden(_) => {}
                }
            }
        }
        if !user_snaps.is_empty() { self.save_users(user_snaps); }
        if !chat_snaps.is_empty() { self.save_chats(chat_snaps); }
        if !chan_snaps.is_empty() { self.save_channels(chan_snaps); }
    }

    /// Store a full chat or channel description.
    pub fn apply_chat_full(&self, full: &tl::enums::ChatFull) {
        match full {
            tl::enums::ChatFull::ChatFull(c)    => self.save_chat_fulls([c.clone()]),
            tl::enums::ChatFull::ChannelFull(c) => self.save_channel_fulls([c.clone()]),
        }
    }

    // ── Addressing ─────────────────────────────────────────────────────────

    /// Build an `InputPeer` for `peer` from the known access hashes.
    ///
    /// Unknown hashes fall back to `0`, which the server may reject.
    pub fn input_peer(&self, peer: &tl::enums::Peer) -> tl::enums::InputPeer {
        let key  = PeerKey::from(peer);
        let hash = self.find(key).map(|v| v.access_hash).unwrap_or(0);
        match key.kind {
            PeerKind::User => tl::enums::InputPeer::User(tl::types::InputPeerUser {
                user_id: key.id, access_hash: hash,
            }),
            PeerKind::Chat => tl::enums::InputPeer::Chat(tl::types::InputPeerChat { chat_id: key.id }),
            PeerKind::Channel => tl::enums::InputPeer::Channel(tl::types::InputPeerChannel {
                channel_id: key.id, access_hash: hash,
            }),
        }
    }

    // ── Backup ─────────────────────────────────────────────────────────────

    /// User access hashes, keyed by user id.
    pub fn backup_users(&self) -> HashMap<i64, i64> {
        lock(&self.addresses)
            .data
            .iter()
            .filter(|(k, _)| k.kind == PeerKind::User)
            .map(|(k, v)| (k.id, v.access_hash))
            .collect()
    }

    /// Restore user access hashes; entries already known are kept.
    pub fn restore_users(&self, users: &HashMap<i64, i64>) {
        let mut addrs = lock(&self.addresses);
        for (&id, &hash) in users {
            addrs.data.entry(PeerKey::user(id)).or_insert(PeerValue { access_hash: hash });
        }
    }

    // ── Purge ──────────────────────────────────────────────────────────────

    /// Forget everything and reset the contacts hash.
    pub fn purge(&self) {
        {
            let mut addrs = lock(&self.addresses);
            addrs.data.clear();
            addrs.phones.clear();
        }
        self.contacts_hash.store(0, Ordering::Release);
        lock(&self.users).clear();
        lock(&self.user_fulls).clear();
        lock(&self.chats).clear();
        lock(&self.chat_fulls).clear();
        lock(&self.channels).clear();
        lock(&self.channel_fulls).clear();
        tracing::debug!("[courier] peer directory purged");
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
