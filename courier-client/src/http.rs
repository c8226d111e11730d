//! HTTP control plane for one session: login page, status and the login
//! actions.
//!
//! `GET /?auth` serves `login.html`, `GET /` reports the status, `POST /`
//! takes one form action (`logout`, `cancel`, `phone`, `code` or `2fa`).
//! Every other method answers 405.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::any;
use courier_gateway::GatewayError;
use courier_tl as tl;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::errors::AuthError;
use crate::provider::invocation_error;
use crate::session::TelegramSession;

/// Build the control-plane router for `session`.
pub fn router(session: Arc<TelegramSession>) -> Router {
    Router::new()
        .route("/", any(handle))
        .with_state(session)
}

async fn handle(
    State(session): State<Arc<TelegramSession>>,
    method:         Method,
    headers:        HeaderMap,
    Query(query):   Query<HashMap<String, String>>,
    body:           Bytes,
) -> Response {
    let result = match method {
        Method::GET if query.contains_key("auth") => return login_page(&session).await,
        Method::GET => status(&session, &headers),
        Method::POST => action(&session, &headers, &body).await,
        _ => Err(GatewayError::method_not_allowed("METHOD_NOT_ALLOWED", "(405) Method not allowed")),
    };
    match result {
        Ok(mut rsp) => {
            rsp.headers_mut().insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            rsp
        }
        Err(e) => e.into_response(),
    }
}

// ── GET ───────────────────────────────────────────────────────────────────────

async fn login_page(session: &TelegramSession) -> Response {
    let path = session.gateway().get().web_root().join("login.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "[courier] login page unavailable");
            GatewayError::not_found("chat.gateway.telegram.login.not_found", "login page not found").into_response()
        }
    }
}

#[derive(Serialize)]
struct Status {
    enabled:    bool,
    connected:  bool,
    /// A user snapshot is held; kept across a disconnect.
    authorized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    account:    Option<AccountView>,
}

#[derive(Serialize)]
struct AccountView {
    id:         i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    last_name:  String,
    #[serde(skip_serializing_if = "String::is_empty")]
    username:   String,
    #[serde(skip_serializing_if = "String::is_empty")]
    phone:      String,
}

impl From<&tl::types::User> for AccountView {
    fn from(u: &tl::types::User) -> Self {
        Self {
            id:         u.id,
            first_name: u.first_name.clone().unwrap_or_default(),
            last_name:  u.last_name.clone().unwrap_or_default(),
            username:   u.username.clone().unwrap_or_default(),
            phone:      u.phone.clone().unwrap_or_default(),
        }
    }
}

fn status(session: &TelegramSession, headers: &HeaderMap) -> Result<Response, GatewayError> {
    let gateway = session.gateway().get();
    gateway.authorize_admin(headers)?;
    let user = session.authenticator().user();
    Ok(Json(Status {
        enabled:    gateway.bot_enabled(),
        connected:  session.is_started(),
        authorized: user.is_some(),
        account:    user.as_ref().map(AccountView::from),
    })
    .into_response())
}

// ── POST ──────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SentCodeView {
    /// A code is on its way.
    Code {
        delivery:        &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        length:          Option<i32>,
        phone_code_hash: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        next_type:       Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        timeout:         Option<i32>,
    },
    /// A logout token was accepted; the account is signed in.
    Success { authorization: AuthorizationView },
}

#[derive(Serialize)]
struct AuthorizationView {
    setup_password_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user:                    Option<AccountView>,
}

impl From<&tl::types::auth::Authorization> for AuthorizationView {
    fn from(a: &tl::types::auth::Authorization) -> Self {
        let user = match &a.user {
            tl::enums::User::User(u)  => Some(AccountView::from(u)),
            tl::enums::User::Empty(_) => None,
        };
        Self { setup_password_required: a.setup_password_required, user }
    }
}

impl From<&tl::enums::auth::SentCode> for SentCodeView {
    fn from(sent: &tl::enums::auth::SentCode) -> Self {
        use tl::enums::auth::{CodeType, SentCodeType};

        match sent {
            tl::enums::auth::SentCode::SentCode(s) => {
                let (delivery, length) = match &s.r#type {
                    SentCodeType::App(t)        => ("app", Some(t.length)),
                    SentCodeType::Sms(t)        => ("sms", Some(t.length)),
                    SentCodeType::Call(t)       => ("call", Some(t.length)),
                    SentCodeType::FlashCall(_)  => ("flash_call", None),
                    SentCodeType::MissedCall(t) => ("missed_call", Some(t.length)),
                };
                let next_type = s.next_type.map(|t| match t {
                    CodeType::Sms         => "sms",
                    CodeType::Call        => "call",
                    CodeType::FlashCall   => "flash_call",
                    CodeType::MissedCall  => "missed_call",
                    CodeType::FragmentSms => "fragment_sms",
                });
                Self::Code {
                    delivery,
                    length,
                    phone_code_hash: s.phone_code_hash.clone(),
                    next_type,
                    timeout: s.timeout,
                }
            }
            tl::enums::auth::SentCode::Success(s) => {
                let authorization = match &s.authorization {
                    tl::enums::auth::Authorization::Authorization(a) => AuthorizationView::from(a),
                    tl::enums::auth::Authorization::SignUpRequired(_) => {
                        AuthorizationView { setup_password_required: false, user: None }
                    }
                };
                Self::Success { authorization }
            }
        }
    }
}

async fn action(session: &TelegramSession, headers: &HeaderMap, body: &[u8]) -> Result<Response, GatewayError> {
    session.gateway().get().authorize_admin(headers)?;

    let form: HashMap<String, String> = url::form_urlencoded::parse(body).into_owned().collect();
    let auth = session.authenticator();
    // Request-scoped: a dropped connection does not cancel a login step.
    let cancel = CancellationToken::new();

    if form.contains_key("logout") {
        auth.log_out(&cancel).await.map_err(auth_error)?;
        return Ok(Json("OK").into_response());
    }
    if form.contains_key("cancel") {
        auth.cancel_code(&cancel).await;
        return Ok(Json("OK").into_response());
    }
    // Blank inputs count as absent.
    let field = |key: &str| form.get(key).filter(|v| !v.trim().is_empty());
    if let Some(phone) = field("phone") {
        let sent = auth.send_code(&cancel, phone.trim()).await.map_err(auth_error)?;
        return Ok(Json(SentCodeView::from(&sent)).into_response());
    }
    if let Some(code) = field("code") {
        let authorization = auth.sign_in(&cancel, code).await.map_err(auth_error)?;
        return Ok(Json(AuthorizationView::from(&authorization)).into_response());
    }
    if let Some(secret) = field("2fa") {
        let authorization = auth.password(&cancel, secret).await.map_err(auth_error)?;
        return Ok(Json(AuthorizationView::from(&authorization)).into_response());
    }
    Err(GatewayError::bad_request("chat.gateway.telegram.action.unknown", "Unknown action request"))
}

/// Remote errors keep their name and code; server-side codes become 502.
fn auth_error(e: AuthError) -> GatewayError {
    match e {
        AuthError::Invocation(e) => invocation_error(e),
        AuthError::PasswordRequired => {
            GatewayError::unauthorized("SESSION_PASSWORD_NEEDED", e.to_string())
        }
        AuthError::InvalidPassword => GatewayError::bad_request("PASSWORD_HASH_INVALID", e.to_string()),
        AuthError::SignUpRequired  => GatewayError::bad_request("chat.gateway.telegram.sign_up.required", e.to_string()),
        AuthError::UnsupportedPasswordAlgo => {
            GatewayError::internal("chat.gateway.telegram.password.algo", e.to_string())
        }
    }
}
