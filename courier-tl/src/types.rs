//! Concrete constructors (bare types).
//!
//! Only the fields the session layer reads or writes are modelled; flag
//! fields that are absent on the wire are `Option`s or `false`.

use crate::enums;

// ─── Peers ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PeerUser {
    pub user_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PeerChat {
    pub chat_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PeerChannel {
    pub channel_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputPeerUser {
    pub user_id:     i64,
    pub access_hash: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputPeerChat {
    pub chat_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputPeerChannel {
    pub channel_id:  i64,
    pub access_hash: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputUser {
    pub user_id:     i64,
    pub access_hash: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InputChannel {
    pub channel_id:  i64,
    pub access_hash: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputDialogPeer {
    pub peer: enums::InputPeer,
}

// ─── Users ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserEmpty {
    pub id: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct User {
    pub is_self:     bool,
    pub contact:     bool,
    pub bot:         bool,
    pub deleted:     bool,
    pub id:          i64,
    pub access_hash: Option<i64>,
    pub first_name:  Option<String>,
    pub last_name:   Option<String>,
    pub username:    Option<String>,
    pub phone:       Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserFull {
    pub id:          i64,
    pub about:       Option<String>,
    pub common_chats_count: i32,
}

// ─── Chats ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatEmpty {
    pub id: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chat {
    pub id:                 i64,
    pub title:              String,
    pub participants_count: i32,
    pub date:               i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatForbidden {
    pub id:    i64,
    pub title: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Channel {
    pub broadcast:   bool,
    pub megagroup:   bool,
    pub id:          i64,
    pub access_hash: Option<i64>,
    pub title:       String,
    pub username:    Option<String>,
    pub date:        i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelForbidden {
    pub id:          i64,
    pub access_hash: i64,
    pub title:       String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatFull {
    pub id:    i64,
    pub about: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChannelFull {
    pub id:                 i64,
    pub about:              String,
    pub participants_count: Option<i32>,
    pub pts:                i32,
}

// ─── Dialogs ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Dialog {
    pub pinned:        bool,
    pub peer:          enums::Peer,
    pub top_message:   i32,
    pub unread_count:  i32,
    pub pts:           Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DialogFolder {
    pub folder_id:  i32,
    pub top_message: i32,
}

// ─── Messages ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageEmpty {
    pub id:      i32,
    pub peer_id: Option<enums::Peer>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub out:     bool,
    pub id:      i32,
    pub from_id: Option<enums::Peer>,
    pub peer_id: enums::Peer,
    pub date:    i32,
    pub message: String,
    pub media:   Option<enums::MessageMedia>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageService {
    pub out:     bool,
    pub id:      i32,
    pub peer_id: enums::Peer,
    pub date:    i32,
}

// ─── Media ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageMediaPhoto {
    pub photo:       Option<enums::Photo>,
    pub ttl_seconds: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MessageMediaGeo {
    pub geo: enums::GeoPoint,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageMediaContact {
    pub phone_number: String,
    pub first_name:   String,
    pub last_name:    String,
    pub vcard:        String,
    pub user_id:      i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageMediaDocument {
    pub document:    Option<enums::Document>,
    pub ttl_seconds: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoEmpty {
    pub id: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Photo {
    pub id:             i64,
    pub access_hash:    i64,
    pub file_reference: Vec<u8>,
    pub date:           i32,
    pub sizes:          Vec<enums::PhotoSize>,
    pub dc_id:          i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoSizeEmpty {
    pub r#type: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoSize {
    pub r#type: String,
    pub w:      i32,
    pub h:      i32,
    pub size:   i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoCachedSize {
    pub r#type: String,
    pub w:      i32,
    pub h:      i32,
    pub bytes:  Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoStrippedSize {
    pub r#type: String,
    pub bytes:  Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoSizeProgressive {
    pub r#type: String,
    pub w:      i32,
    pub h:      i32,
    pub sizes:  Vec<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhotoPathSize {
    pub r#type: String,
    pub bytes:  Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoPoint {
    pub long:            f64,
    pub lat:             f64,
    pub access_hash:     i64,
    pub accuracy_radius: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentEmpty {
    pub id: i64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub id:             i64,
    pub access_hash:    i64,
    pub file_reference: Vec<u8>,
    pub date:           i32,
    pub mime_type:      String,
    pub size:           i64,
    pub thumbs:         Option<Vec<enums::PhotoSize>>,
    pub dc_id:          i32,
    pub attributes:     Vec<enums::DocumentAttribute>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentAttributeImageSize {
    pub w: i32,
    pub h: i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentAttributeSticker {
    pub mask: bool,
    pub alt:  String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentAttributeVideo {
    pub round_message:      bool,
    pub supports_streaming: bool,
    pub duration:           f64,
    pub w:                  i32,
    pub h:                  i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentAttributeAudio {
    pub voice:     bool,
    pub duration:  i32,
    pub title:     Option<String>,
    pub performer: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentAttributeFilename {
    pub file_name: String,
}

// ─── File transfer ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputPhotoFileLocation {
    pub id:             i64,
    pub access_hash:    i64,
    pub file_reference: Vec<u8>,
    pub thumb_size:     String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputDocumentFileLocation {
    pub id:             i64,
    pub access_hash:    i64,
    pub file_reference: Vec<u8>,
    pub thumb_size:     String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputFile {
    pub id:           i64,
    pub parts:        i32,
    pub name:         String,
    pub md5_checksum: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputFileBig {
    pub id:    i64,
    pub parts: i32,
    pub name:  String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputMediaUploadedPhoto {
    pub spoiler:     bool,
    pub file:        enums::InputFile,
    pub ttl_seconds: Option<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InputMediaUploadedDocument {
    pub nosound_video: bool,
    pub force_file:    bool,
    pub file:          enums::InputFile,
    pub mime_type:     String,
    pub attributes:    Vec<enums::DocumentAttribute>,
}

// ─── Updates ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateNewMessage {
    pub message:   enums::Message,
    pub pts:       i32,
    pub pts_count: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateNewChannelMessage {
    pub message:   enums::Message,
    pub pts:       i32,
    pub pts_count: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateEditMessage {
    pub message:   enums::Message,
    pub pts:       i32,
    pub pts_count: i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateDeleteMessages {
    pub messages:  Vec<i32>,
    pub pts:       i32,
    pub pts_count: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateShort {
    pub update: enums::Update,
    pub date:   i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdatesCombined {
    pub updates:   Vec<enums::Update>,
    pub users:     Vec<enums::User>,
    pub chats:     Vec<enums::Chat>,
    pub date:      i32,
    pub seq_start: i32,
    pub seq:       i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Updates {
    pub updates: Vec<enums::Update>,
    pub users:   Vec<enums::User>,
    pub chats:   Vec<enums::Chat>,
    pub date:    i32,
    pub seq:     i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateShortSentMessage {
    pub out:  bool,
    pub id:   i32,
    pub pts:  i32,
    pub date: i32,
}

// ─── Auth settings ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeSettings {
    pub allow_flashcall:  bool,
    pub current_number:   bool,
    pub allow_app_hash:   bool,
    pub logout_tokens:    Option<Vec<Vec<u8>>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputCheckPasswordSrp {
    pub srp_id: i64,
    pub a:      Vec<u8>,
    pub m1:     Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PasswordKdfAlgoSha256Sha256Pbkdf2HmacSha512iter100000Sha256ModPow {
    pub salt1: Vec<u8>,
    pub salt2: Vec<u8>,
    pub g:     i32,
    pub p:     Vec<u8>,
}

// ─── Namespaced constructors ─────────────────────────────────────────────────

pub mod auth {
    use crate::enums;

    #[derive(Clone, Debug, PartialEq)]
    pub struct SentCode {
        pub r#type:          enums::auth::SentCodeType,
        pub phone_code_hash: String,
        pub next_type:       Option<enums::auth::CodeType>,
        pub timeout:         Option<i32>,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct SentCodeSuccess {
        pub authorization: enums::auth::Authorization,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SentCodeTypeApp {
        pub length: i32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SentCodeTypeSms {
        pub length: i32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SentCodeTypeCall {
        pub length: i32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SentCodeTypeFlashCall {
        pub pattern: String,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SentCodeTypeMissedCall {
        pub prefix: String,
        pub length: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Authorization {
        pub setup_password_required: bool,
        pub user:                    enums::User,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct AuthorizationSignUpRequired {
        pub terms_of_service: Option<String>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct LoggedOut {
        pub future_auth_token: Option<Vec<u8>>,
    }
}

pub mod account {
    use crate::enums;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Password {
        pub has_recovery:  bool,
        pub has_password:  bool,
        pub current_algo:  Option<enums::PasswordKdfAlgo>,
        pub srp_b:         Option<Vec<u8>>,
        pub srp_id:        Option<i64>,
        pub hint:          Option<String>,
        pub secure_random: Vec<u8>,
    }
}

pub mod messages {
    use crate::enums;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Dialogs {
        pub dialogs:  Vec<enums::Dialog>,
        pub messages: Vec<enums::Message>,
        pub chats:    Vec<enums::Chat>,
        pub users:    Vec<enums::User>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct DialogsSlice {
        pub count:    i32,
        pub dialogs:  Vec<enums::Dialog>,
        pub messages: Vec<enums::Message>,
        pub chats:    Vec<enums::Chat>,
        pub users:    Vec<enums::User>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct DialogsNotModified {
        pub count: i32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct PeerDialogs {
        pub dialogs:  Vec<enums::Dialog>,
        pub messages: Vec<enums::Message>,
        pub chats:    Vec<enums::Chat>,
        pub users:    Vec<enums::User>,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct ChatFull {
        pub full_chat: enums::ChatFull,
        pub chats:     Vec<enums::Chat>,
        pub users:     Vec<enums::User>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct AffectedMessages {
        pub pts:       i32,
        pub pts_count: i32,
    }
}

pub mod users {
    use crate::enums;

    #[derive(Clone, Debug, PartialEq)]
    pub struct UserFull {
        pub full_user: enums::UserFull,
        pub chats:     Vec<enums::Chat>,
        pub users:     Vec<enums::User>,
    }
}

pub mod contacts {
    use crate::enums;

    #[derive(Clone, Debug, PartialEq)]
    pub struct ResolvedPeer {
        pub peer:  enums::Peer,
        pub chats: Vec<enums::Chat>,
        pub users: Vec<enums::User>,
    }
}

pub mod upload {
    use crate::enums;

    #[derive(Clone, Debug, PartialEq)]
    pub struct File {
        pub r#type: enums::storage::FileType,
        pub mtime:  i32,
        pub bytes:  Vec<u8>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct FileCdnRedirect {
        pub dc_id:          i32,
        pub file_token:     Vec<u8>,
        pub encryption_key: Vec<u8>,
        pub encryption_iv:  Vec<u8>,
    }
}

pub mod updates {
    use crate::enums;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct State {
        pub pts:          i32,
        pub qts:          i32,
        pub date:         i32,
        pub seq:          i32,
        pub unread_count: i32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct DifferenceEmpty {
        pub date: i32,
        pub seq:  i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct Difference {
        pub new_messages: Vec<enums::Message>,
        pub other_updates: Vec<enums::Update>,
        pub chats:        Vec<enums::Chat>,
        pub users:        Vec<enums::User>,
        pub state:        enums::updates::State,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct DifferenceSlice {
        pub new_messages:       Vec<enums::Message>,
        pub other_updates:      Vec<enums::Update>,
        pub chats:              Vec<enums::Chat>,
        pub users:              Vec<enums::User>,
        pub intermediate_state: enums::updates::State,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct DifferenceTooLong {
        pub pts: i32,
    }
}
