use std::any::Any;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::http::HeaderMap;
use courier_gateway::{
    Account, Channel, Gateway, GatewayError, Provider, ProviderRegistry, Result, Update,
};
use tokio_util::sync::CancellationToken;

// ── Doubles ───────────────────────────────────────────────────────────────────

struct Bot;

#[async_trait]
impl Gateway for Bot {
    fn bot_id(&self) -> i64 { 1 }
    fn domain_id(&self) -> i64 { 1 }
    fn bot_enabled(&self) -> bool { true }
    fn host_url(&self) -> String { "https://chat.example.com".into() }
    fn web_root(&self) -> PathBuf { PathBuf::from("/var/www") }
    fn metadata(&self) -> HashMap<String, String> { HashMap::new() }
    async fn set_metadata(&self, _: &CancellationToken, _: HashMap<String, String>) -> Result<()> { Ok(()) }
    async fn get_channel(&self, _: &CancellationToken, chat_id: &str, contact: &Account) -> Result<Channel> {
        Ok(Channel { id: 1, chat_id: chat_id.into(), contact: contact.clone(), is_new: false })
    }
    async fn read(&self, _: &CancellationToken, _: Update) -> Result<()> { Ok(()) }
    fn authorize_admin(&self, _: &HeaderMap) -> Result<()> { Ok(()) }
}

struct Echo {
    generation: u32,
}

#[async_trait]
impl Provider for Echo {
    fn name(&self) -> &'static str { "echo" }
    async fn send_notify(&self, _: &CancellationToken, _: &Update) -> Result<()> { Ok(()) }
    fn router(&self) -> Router { Router::new() }
    async fn register(&self, _: &CancellationToken, _: &str) -> Result<()> { Ok(()) }
    async fn deregister(&self, _: &CancellationToken) -> Result<()> { Ok(()) }
    async fn close(&self) -> Result<()> { Ok(()) }
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> { self }
}

fn echo_factory(_: Arc<dyn Gateway>, state: Option<Arc<dyn Provider>>) -> Result<Arc<dyn Provider>> {
    let generation = state
        .and_then(|s| s.as_any().downcast::<Echo>().ok())
        .map(|e| e.generation + 1)
        .unwrap_or(0);
    Ok(Arc::new(Echo { generation }))
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[test]
fn duplicate_registration_rejected() {
    let mut reg = ProviderRegistry::new();
    reg.register("echo", echo_factory).unwrap();
    let err = reg.register("echo", echo_factory).unwrap_err();
    assert_eq!(err.id, "chat.provider.duplicate");
    assert_eq!(reg.names(), vec!["echo"]);
}

#[test]
fn unknown_provider_is_not_found() {
    let reg = ProviderRegistry::new();
    let err = reg.build("nope", Arc::new(Bot), None).err().unwrap();
    assert_eq!(err, GatewayError::not_found("chat.provider.not_found", "chat: provider nope not registered"));
}

#[test]
fn build_passes_running_state() {
    let mut reg = ProviderRegistry::new();
    reg.register("echo", echo_factory).unwrap();

    let first  = reg.build("echo", Arc::new(Bot), None).unwrap();
    let second = reg.build("echo", Arc::new(Bot), Some(first)).unwrap();
    let echo   = second.as_any().downcast::<Echo>().unwrap();
    assert_eq!(echo.generation, 1);
}
