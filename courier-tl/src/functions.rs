//! RPC functions as `struct`s. Each implements [`crate::RemoteCall`].

pub mod auth {
    use crate::enums;

    #[derive(Clone, Debug, PartialEq)]
    pub struct SendCode {
        pub phone_number: String,
        pub api_id:       i32,
        pub api_hash:     String,
        pub settings:     enums::CodeSettings,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct ResendCode {
        pub phone_number:    String,
        pub phone_code_hash: String,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct CancelCode {
        pub phone_number:    String,
        pub phone_code_hash: String,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SignIn {
        pub phone_number:    String,
        pub phone_code_hash: String,
        pub phone_code:      Option<String>,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct CheckPassword {
        pub password: enums::InputCheckPasswordSrp,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct LogOut {}
}

pub mod account {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetPassword {}
}

pub mod users {
    use crate::enums;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetUsers {
        pub id: Vec<enums::InputUser>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetFullUser {
        pub id: enums::InputUser,
    }
}

pub mod channels {
    use crate::enums;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetFullChannel {
        pub channel: enums::InputChannel,
    }
}

pub mod contacts {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct ResolvePhone {
        pub phone: String,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct ResolveUsername {
        pub username: String,
    }
}

pub mod messages {
    use crate::enums;

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetDialogs {
        pub exclude_pinned: bool,
        pub offset_date:    i32,
        pub offset_id:      i32,
        pub offset_peer:    enums::InputPeer,
        pub limit:          i32,
        pub hash:           i64,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetPeerDialogs {
        pub peers: Vec<enums::InputDialogPeer>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetFullChat {
        pub chat_id: i64,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SendMessage {
        pub no_webpage: bool,
        pub silent:     bool,
        pub peer:       enums::InputPeer,
        pub message:    String,
        pub random_id:  i64,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub struct SendMedia {
        pub silent:    bool,
        pub peer:      enums::InputPeer,
        pub media:     enums::InputMedia,
        pub message:   String,
        pub random_id: i64,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct ReadHistory {
        pub peer:   enums::InputPeer,
        pub max_id: i32,
    }
}

pub mod upload {
    use crate::enums;

    #[derive(Clone, Debug, PartialEq)]
    pub struct GetFile {
        pub precise:       bool,
        pub cdn_supported: bool,
        pub location:      enums::InputFileLocation,
        pub offset:        i64,
        pub limit:         i32,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SaveFilePart {
        pub file_id:   i64,
        pub file_part: i32,
        pub bytes:     Vec<u8>,
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct SaveBigFilePart {
        pub file_id:          i64,
        pub file_part:        i32,
        pub file_total_parts: i32,
        pub bytes:            Vec<u8>,
    }
}

pub mod updates {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetState {}

    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct GetDifference {
        pub pts:  i32,
        pub date: i32,
        pub qts:  i32,
    }
}
