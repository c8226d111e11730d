//! Boxed types as `enum`s, one variant per constructor.

use crate::types;

// ─── Peers ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Peer {
    User(types::PeerUser),
    Chat(types::PeerChat),
    Channel(types::PeerChannel),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputPeer {
    #[default]
    Empty,
    PeerSelf,
    User(types::InputPeerUser),
    Chat(types::InputPeerChat),
    Channel(types::InputPeerChannel),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputUser {
    #[default]
    Empty,
    UserSelf,
    User(types::InputUser),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputChannel {
    #[default]
    Empty,
    Channel(types::InputChannel),
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputDialogPeer {
    Peer(types::InputDialogPeer),
}

#[derive(Clone, Debug, PartialEq)]
pub enum User {
    Empty(types::UserEmpty),
    User(types::User),
}

impl User {
    pub fn id(&self) -> i64 {
        match self {
            Self::Empty(u) => u.id,
            Self::User(u)  => u.id,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UserFull {
    UserFull(types::UserFull),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Chat {
    Empty(types::ChatEmpty),
    Chat(types::Chat),
    Forbidden(types::ChatForbidden),
    Channel(types::Channel),
    ChannelForbidden(types::ChannelForbidden),
}

impl Chat {
    pub fn id(&self) -> i64 {
        match self {
            Self::Empty(c)            => c.id,
            Self::Chat(c)             => c.id,
            Self::Forbidden(c)        => c.id,
            Self::Channel(c)          => c.id,
            Self::ChannelForbidden(c) => c.id,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChatFull {
    ChatFull(types::ChatFull),
    ChannelFull(types::ChannelFull),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Dialog {
    Dialog(types::Dialog),
    Folder(types::DialogFolder),
}

// ─── Messages ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Empty(types::MessageEmpty),
    Message(types::Message),
    Service(types::MessageService),
}

impl Message {
    pub fn id(&self) -> i32 {
        match self {
            Self::Empty(m)   => m.id,
            Self::Message(m) => m.id,
            Self::Service(m) => m.id,
        }
    }

    pub fn date(&self) -> i32 {
        match self {
            Self::Empty(_)   => 0,
            Self::Message(m) => m.date,
            Self::Service(m) => m.date,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MessageMedia {
    Empty,
    Photo(types::MessageMediaPhoto),
    Geo(types::MessageMediaGeo),
    Contact(types::MessageMediaContact),
    Unsupported,
    Document(types::MessageMediaDocument),
    WebPage,
    Venue,
    Game,
    Invoice,
    GeoLive,
    Poll,
    Dice,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Photo {
    Empty(types::PhotoEmpty),
    Photo(types::Photo),
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhotoSize {
    Empty(types::PhotoSizeEmpty),
    Size(types::PhotoSize),
    PhotoCachedSize(types::PhotoCachedSize),
    PhotoStrippedSize(types::PhotoStrippedSize),
    Progressive(types::PhotoSizeProgressive),
    PhotoPathSize(types::PhotoPathSize),
}

#[derive(Clone, Debug, PartialEq)]
pub enum GeoPoint {
    Empty,
    GeoPoint(types::GeoPoint),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    Empty(types::DocumentEmpty),
    Document(types::Document),
}

#[derive(Clone, Debug, PartialEq)]
pub enum DocumentAttribute {
    ImageSize(types::DocumentAttributeImageSize),
    Animated,
    Sticker(types::DocumentAttributeSticker),
    Video(types::DocumentAttributeVideo),
    Audio(types::DocumentAttributeAudio),
    Filename(types::DocumentAttributeFilename),
}

// ─── File transfer ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum InputFileLocation {
    InputPhotoFileLocation(types::InputPhotoFileLocation),
    InputDocumentFileLocation(types::InputDocumentFileLocation),
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputFile {
    InputFile(types::InputFile),
    Big(types::InputFileBig),
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputMedia {
    UploadedPhoto(types::InputMediaUploadedPhoto),
    UploadedDocument(types::InputMediaUploadedDocument),
}

// ─── Updates ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    NewMessage(types::UpdateNewMessage),
    NewChannelMessage(types::UpdateNewChannelMessage),
    EditMessage(types::UpdateEditMessage),
    DeleteMessages(types::UpdateDeleteMessages),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Updates {
    TooLong,
    UpdateShort(types::UpdateShort),
    Combined(types::UpdatesCombined),
    Updates(types::Updates),
    UpdateShortSentMessage(types::UpdateShortSentMessage),
}

// ─── Auth ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum CodeSettings {
    CodeSettings(types::CodeSettings),
}

impl Default for CodeSettings {
    fn default() -> Self { Self::CodeSettings(types::CodeSettings::default()) }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputCheckPasswordSrp {
    InputCheckPasswordEmpty,
    InputCheckPasswordSrp(types::InputCheckPasswordSrp),
}

#[derive(Clone, Debug, PartialEq)]
pub enum PasswordKdfAlgo {
    Unknown,
    Sha256Sha256Pbkdf2HmacSha512iter100000Sha256ModPow(
        types::PasswordKdfAlgoSha256Sha256Pbkdf2HmacSha512iter100000Sha256ModPow,
    ),
}

// ─── Namespaced boxed types ──────────────────────────────────────────────────

pub mod auth {
    use crate::types;

    #[derive(Clone, Debug, PartialEq)]
    pub enum SentCode {
        SentCode(types::auth::SentCode),
        Success(types::auth::SentCodeSuccess),
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum SentCodeType {
        App(types::auth::SentCodeTypeApp),
        Sms(types::auth::SentCodeTypeSms),
        Call(types::auth::SentCodeTypeCall),
        FlashCall(types::auth::SentCodeTypeFlashCall),
        MissedCall(types::auth::SentCodeTypeMissedCall),
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CodeType {
        Sms,
        Call,
        FlashCall,
        MissedCall,
        FragmentSms,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum Authorization {
        Authorization(types::auth::Authorization),
        SignUpRequired(types::auth::AuthorizationSignUpRequired),
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum LoggedOut {
        LoggedOut(types::auth::LoggedOut),
    }
}

pub mod account {
    use crate::types;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Password {
        Password(types::account::Password),
    }
}

pub mod messages {
    use crate::types;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Dialogs {
        Dialogs(types::messages::Dialogs),
        Slice(types::messages::DialogsSlice),
        NotModified(types::messages::DialogsNotModified),
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum PeerDialogs {
        PeerDialogs(types::messages::PeerDialogs),
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum ChatFull {
        ChatFull(types::messages::ChatFull),
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum AffectedMessages {
        AffectedMessages(types::messages::AffectedMessages),
    }
}

pub mod users {
    use crate::types;

    #[derive(Clone, Debug, PartialEq)]
    pub enum UserFull {
        UserFull(types::users::UserFull),
    }
}

pub mod contacts {
    use crate::types;

    #[derive(Clone, Debug, PartialEq)]
    pub enum ResolvedPeer {
        ResolvedPeer(types::contacts::ResolvedPeer),
    }
}

pub mod upload {
    use crate::types;

    #[derive(Clone, Debug, PartialEq)]
    pub enum File {
        File(types::upload::File),
        CdnRedirect(types::upload::FileCdnRedirect),
    }
}

pub mod storage {
    /// Storage file-type tag attached to every downloaded chunk.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum FileType {
        Unknown,
        Partial,
        Jpeg,
        Gif,
        Png,
        Pdf,
        Mp3,
        Mov,
        Mp4,
        Webp,
    }
}

pub mod updates {
    use crate::types;

    #[derive(Clone, Debug, PartialEq)]
    pub enum State {
        State(types::updates::State),
    }

    #[derive(Clone, Debug, PartialEq)]
    pub enum Difference {
        Empty(types::updates::DifferenceEmpty),
        Difference(types::updates::Difference),
        Slice(types::updates::DifferenceSlice),
        TooLong(types::updates::DifferenceTooLong),
    }
}
