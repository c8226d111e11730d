//! Telegram API types, functions and enums used by the courier session layer.
//!
//! This crate models the slice of the Telegram API schema that the session
//! layer speaks. Binary encoding is owned by the transport; here every request
//! is a plain Rust value and every response is an [`Object`].
//!
//! # Overview
//!
//! | Module        | Contents                                               |
//! |---------------|--------------------------------------------------------|
//! | [`types`]     | Concrete constructors (bare types) as `struct`s        |
//! | [`functions`] | RPC functions as `struct`s implementing [`RemoteCall`] |
//! | [`enums`]     | Boxed types as `enum`s                                 |
//!
//! # Usage
//!
//! ```rust
//! use courier_tl::{functions, Function, RemoteCall};
//!
//! let req = functions::contacts::ResolvePhone { phone: "15550001111".into() };
//! let call: Function = req.into_function();
//! assert_eq!(call.name(), "contacts.resolvePhone");
//! ```

#![deny(unsafe_code)]
#![allow(clippy::large_enum_variant)]

pub mod enums;
pub mod functions;
pub mod types;

// ─── Core traits ──────────────────────────────────────────────────────────────

/// Marks a function type that can be sent to Telegram as an RPC call.
///
/// `Return` is the type Telegram will respond with.
pub trait RemoteCall: Into<Function> {
    /// The decoded response type.
    type Return;

    /// Schema name, e.g. `"auth.sendCode"`.
    const NAME: &'static str;

    /// Box the request into the closed [`Function`] set.
    fn into_function(self) -> Function {
        self.into()
    }

    /// Extract this call's return value from a response object.
    ///
    /// Hands the object back unchanged when its shape does not match.
    fn unwrap_return(object: Object) -> Result<Self::Return, Object>;
}

// ─── Object ───────────────────────────────────────────────────────────────────

macro_rules! objects {
    ($( $variant:ident($ty:ty), )*) => {
        /// Any decoded response the session layer can receive.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Object {
            $( $variant($ty), )*
        }

        impl Object {
            /// Variant name, for logs.
            pub fn kind(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => stringify!($variant), )*
                }
            }
        }

        $(
            impl From<$ty> for Object {
                fn from(v: $ty) -> Self { Self::$variant(v) }
            }
        )*
    };
}

objects! {
    Bool(bool),
    SentCode(enums::auth::SentCode),
    Authorization(enums::auth::Authorization),
    LoggedOut(enums::auth::LoggedOut),
    Password(enums::account::Password),
    Users(Vec<enums::User>),
    UserFull(enums::users::UserFull),
    ChatFull(enums::messages::ChatFull),
    ResolvedPeer(enums::contacts::ResolvedPeer),
    Dialogs(enums::messages::Dialogs),
    PeerDialogs(enums::messages::PeerDialogs),
    Updates(enums::Updates),
    AffectedMessages(enums::messages::AffectedMessages),
    File(enums::upload::File),
    State(enums::updates::State),
    Difference(enums::updates::Difference),
}

// ─── Function ─────────────────────────────────────────────────────────────────

macro_rules! remote_calls {
    ($( $variant:ident => $func:ty : $obj:ident($ret:ty), $name:literal; )*) => {
        /// Every RPC request the session layer can issue.
        #[derive(Clone, Debug, PartialEq)]
        pub enum Function {
            $( $variant($func), )*
        }

        impl Function {
            /// Schema name of the request, e.g. `"messages.getDialogs"`.
            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$variant(_) => $name, )*
                }
            }
        }

        $(
            impl From<$func> for Function {
                fn from(f: $func) -> Self { Self::$variant(f) }
            }

            impl RemoteCall for $func {
                type Return = $ret;
                const NAME: &'static str = $name;

                fn unwrap_return(object: Object) -> Result<$ret, Object> {
                    match object {
                        Object::$obj(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

remote_calls! {
    AuthSendCode        => functions::auth::SendCode        : SentCode(enums::auth::SentCode),          "auth.sendCode";
    AuthResendCode      => functions::auth::ResendCode      : SentCode(enums::auth::SentCode),          "auth.resendCode";
    AuthCancelCode      => functions::auth::CancelCode      : Bool(bool),                               "auth.cancelCode";
    AuthSignIn          => functions::auth::SignIn          : Authorization(enums::auth::Authorization), "auth.signIn";
    AuthCheckPassword   => functions::auth::CheckPassword   : Authorization(enums::auth::Authorization), "auth.checkPassword";
    AuthLogOut          => functions::auth::LogOut          : LoggedOut(enums::auth::LoggedOut),        "auth.logOut";
    AccountGetPassword  => functions::account::GetPassword  : Password(enums::account::Password),       "account.getPassword";
    UsersGetUsers       => functions::users::GetUsers       : Users(Vec<enums::User>),                  "users.getUsers";
    UsersGetFullUser    => functions::users::GetFullUser    : UserFull(enums::users::UserFull),         "users.getFullUser";
    ChannelsGetFullChannel => functions::channels::GetFullChannel : ChatFull(enums::messages::ChatFull), "channels.getFullChannel";
    ContactsResolvePhone    => functions::contacts::ResolvePhone    : ResolvedPeer(enums::contacts::ResolvedPeer), "contacts.resolvePhone";
    ContactsResolveUsername => functions::contacts::ResolveUsername : ResolvedPeer(enums::contacts::ResolvedPeer), "contacts.resolveUsername";
    MessagesGetDialogs     => functions::messages::GetDialogs     : Dialogs(enums::messages::Dialogs),         "messages.getDialogs";
    MessagesGetPeerDialogs => functions::messages::GetPeerDialogs : PeerDialogs(enums::messages::PeerDialogs), "messages.getPeerDialogs";
    MessagesGetFullChat    => functions::messages::GetFullChat    : ChatFull(enums::messages::ChatFull),       "messages.getFullChat";
    MessagesSendMessage    => functions::messages::SendMessage    : Updates(enums::Updates),                   "messages.sendMessage";
    MessagesSendMedia      => functions::messages::SendMedia      : Updates(enums::Updates),                   "messages.sendMedia";
    MessagesReadHistory    => functions::messages::ReadHistory    : AffectedMessages(enums::messages::AffectedMessages), "messages.readHistory";
    UploadGetFile          => functions::upload::GetFile          : File(enums::upload::File), "upload.getFile";
    UploadSaveFilePart     => functions::upload::SaveFilePart     : Bool(bool),                "upload.saveFilePart";
    UploadSaveBigFilePart  => functions::upload::SaveBigFilePart  : Bool(bool),                "upload.saveBigFilePart";
    UpdatesGetState        => functions::updates::GetState        : State(enums::updates::State),           "updates.getState";
    UpdatesGetDifference   => functions::updates::GetDifference   : Difference(enums::updates::Difference), "updates.getDifference";
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

impl enums::Peer {
    /// Numeric id regardless of peer kind.
    pub fn id(&self) -> i64 {
        match self {
            Self::User(p)    => p.user_id,
            Self::Chat(p)    => p.chat_id,
            Self::Channel(p) => p.channel_id,
        }
    }
}

impl enums::Updates {
    /// Users and chats embedded in the container, if any.
    pub fn entities(&self) -> (&[enums::User], &[enums::Chat]) {
        match self {
            Self::Combined(u) => (&u.users, &u.chats),
            Self::Updates(u)  => (&u.users, &u.chats),
            _ => (&[], &[]),
        }
    }

    /// Flatten the container into its individual updates.
    pub fn into_updates(self) -> Vec<enums::Update> {
        match self {
            Self::UpdateShort(s) => vec![s.update],
            Self::Combined(u)    => u.updates,
            Self::Updates(u)     => u.updates,
            Self::TooLong | Self::UpdateShortSentMessage(_) => Vec::new(),
        }
    }
}
