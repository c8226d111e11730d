//! Shared doubles: a scripted transport, an in-memory bot profile and an
//! in-memory object storage.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::HeaderMap;
use courier_client::{
    Client, Config, GatewayHandle, InvocationError, Invoker, Link, RpcError, Transport, TransportFactory,
};
use courier_gateway::{
    Account, Channel, FileStorage, Gateway, GatewayError, Result, Update, UploadMetadata, UploadStream,
    UploadedFile,
};
use courier_tl as tl;
use courier_tl::{Function, Object};
use tokio_util::sync::CancellationToken;

// ── Transport ─────────────────────────────────────────────────────────────────

type Script = Box<dyn FnMut(&Function) -> std::result::Result<Object, InvocationError> + Send>;

/// Answers every call from a script and records what was asked.
pub struct FakeTransport {
    script: Mutex<Script>,
    calls:  Mutex<Vec<Function>>,
    pushed: Mutex<Vec<tl::enums::Updates>>,
}

impl FakeTransport {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: FnMut(&Function) -> std::result::Result<Object, InvocationError> + Send + 'static,
    {
        Arc::new(Self {
            script: Mutex::new(Box::new(script)),
            calls:  Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
        })
    }

    /// Every call is rejected as not scripted.
    pub fn silent() -> Arc<Self> {
        Self::new(|f| Err(rpc(400, &format!("NOT_SCRIPTED_{}", f.name().replace('.', "_")))))
    }

    /// Queue an update batch, pushed right after connecting.
    pub fn push(&self, updates: tl::enums::Updates) {
        self.pushed.lock().unwrap().push(updates);
    }

    pub fn calls(&self) -> Vec<Function> {
        self.calls.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().iter().map(Function::name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }
}

#[async_trait]
impl Invoker for FakeTransport {
    async fn invoke(&self, _: &CancellationToken, request: Function) -> std::result::Result<Object, InvocationError> {
        self.calls.lock().unwrap().push(request.clone());
        let mut script = self.script.lock().unwrap();
        (&mut **script)(&request)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn run(&self, cancel: CancellationToken, link: Link) -> std::result::Result<(), InvocationError> {
        let _ = link.connected.send(());
        let pushed: Vec<_> = self.pushed.lock().unwrap().drain(..).collect();
        for updates in pushed {
            if let Err(e) = link.updates.handle(&cancel, updates).await {
                tracing::warn!(error = %e, "pushed update failed");
            }
        }
        cancel.cancelled().await;
        Ok(())
    }
}

/// Hands out one prepared transport.
pub struct OneTransport(pub Arc<FakeTransport>);

impl TransportFactory for OneTransport {
    fn transport(&self, _: &Config) -> Arc<dyn Transport> {
        Arc::clone(&self.0) as Arc<dyn Transport>
    }
}

pub fn rpc(code: i32, name: &str) -> InvocationError {
    RpcError::from_telegram(code, name).into()
}

pub fn client(transport: &Arc<FakeTransport>, config: Config) -> Client {
    Client::new(Arc::clone(transport) as Arc<dyn Transport>, config)
}

pub fn config() -> Config {
    Config { api_id: 12345, api_hash: "0123abcd".into(), ..Config::default() }
}

// ── Entities ──────────────────────────────────────────────────────────────────

pub fn user(id: i64, access_hash: i64, first_name: &str) -> tl::types::User {
    tl::types::User {
        id,
        access_hash: Some(access_hash),
        first_name: Some(first_name.into()),
        ..Default::default()
    }
}

pub fn updates(updates: Vec<tl::enums::Update>, users: Vec<tl::enums::User>) -> tl::enums::Updates {
    tl::enums::Updates::Updates(tl::types::Updates { updates, users, chats: vec![], date: 0, seq: 0 })
}

pub fn sent() -> Object {
    Object::Updates(tl::enums::Updates::UpdateShortSentMessage(Default::default()))
}

// ── Gateway ───────────────────────────────────────────────────────────────────

pub const ADMIN_HEADER: &str = "x-admin";

/// In-memory bot profile.
pub struct FakeGateway {
    pub bot_id:   i64,
    pub metadata: Mutex<HashMap<String, String>>,
    pub reads:    Mutex<Vec<Update>>,
    pub new_chat: bool,
    pub web_root: PathBuf,
}

impl FakeGateway {
    pub fn new(metadata: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            bot_id:   1,
            metadata: Mutex::new(metadata.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
            reads:    Mutex::new(Vec::new()),
            new_chat: false,
            web_root: std::env::temp_dir(),
        })
    }

    pub fn reads(&self) -> Vec<Update> {
        self.reads.lock().unwrap().clone()
    }

    pub fn handle(self: &Arc<Self>) -> GatewayHandle {
        GatewayHandle::new(Arc::clone(self) as Arc<dyn Gateway>)
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    fn bot_id(&self) -> i64 { self.bot_id }
    fn domain_id(&self) -> i64 { 1 }
    fn bot_enabled(&self) -> bool { true }
    fn host_url(&self) -> String { "https://chat.example.com".into() }
    fn web_root(&self) -> PathBuf { self.web_root.clone() }

    fn metadata(&self) -> HashMap<String, String> {
        self.metadata.lock().unwrap().clone()
    }

    async fn set_metadata(&self, _: &CancellationToken, metadata: HashMap<String, String>) -> Result<()> {
        self.metadata.lock().unwrap().extend(metadata);
        Ok(())
    }

    async fn get_channel(&self, _: &CancellationToken, chat_id: &str, contact: &Account) -> Result<Channel> {
        let mut contact = contact.clone();
        contact.id = 77;
        Ok(Channel { id: 1, chat_id: chat_id.into(), contact, is_new: self.new_chat })
    }

    async fn read(&self, _: &CancellationToken, update: Update) -> Result<()> {
        self.reads.lock().unwrap().push(update);
        Ok(())
    }

    fn authorize_admin(&self, headers: &HeaderMap) -> Result<()> {
        match headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok()) {
            Some("ok") => Ok(()),
            _ => Err(GatewayError::unauthorized("app.context.unauthorized", "admin credentials required")),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────────────────────

/// Records every upload frame.
#[derive(Default)]
pub struct MemoryStorage {
    pub uploads: Mutex<Vec<UploadMetadata>>,
    pub frames:  Arc<Mutex<Vec<Vec<u8>>>>,
}

struct MemoryStream {
    frames: Arc<Mutex<Vec<Vec<u8>>>>,
    size:   i64,
}

#[async_trait]
impl FileStorage for MemoryStorage {
    async fn upload_file(&self, _: &CancellationToken, metadata: UploadMetadata) -> Result<Box<dyn UploadStream>> {
        self.uploads.lock().unwrap().push(metadata);
        Ok(Box::new(MemoryStream { frames: Arc::clone(&self.frames), size: 0 }))
    }
}

#[async_trait]
impl UploadStream for MemoryStream {
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()> {
        self.size += chunk.len() as i64;
        self.frames.lock().unwrap().push(chunk);
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<UploadedFile> {
        Ok(UploadedFile { id: 7, url: "/any/file/7/download".into(), size: self.size, malware: false })
    }
}

/// Make `user` addressable, as if it had arrived with a call result.
pub fn known(client: &Client, user: tl::types::User) {
    client.peers().apply(&[tl::enums::User::User(user)], &[]);
}
