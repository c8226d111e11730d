//! Canonical message envelope exchanged with the conversation service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// External identity of a conversation participant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id:         i64,
    /// Channel kind the identity lives on, e.g. `"telegram"` or `"phone"`.
    pub channel:    String,
    /// Channel-specific contact id (user id, phone number…).
    pub contact:    String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name:  String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username:   String,
}

impl Account {
    /// `"First Last"`, falling back to the username.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name).trim().to_string();
        if name.is_empty() { self.username.clone() } else { name }
    }
}

/// Conversation channel resolved by the gateway for an external chat.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id:      i64,
    pub chat_id: String,
    pub contact: Account,
    /// `true` when the channel was created by this lookup.
    #[serde(default)]
    pub is_new:  bool,
}

/// Binary attachment already stored in the object storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id:      i64,
    pub url:     String,
    pub mime:    String,
    pub name:    String,
    pub size:    i64,
    #[serde(default)]
    pub malware: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    File,
    Contact,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text    => "text",
            Self::File    => "file",
            Self::Contact => "contact",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id:        i64,
    #[serde(rename = "type")]
    pub kind:      MessageKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text:      String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file:      Option<File>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact:   Option<Account>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub variables: HashMap<String, String>,
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Self { kind: MessageKind::Text, text: text.into(), ..Default::default() }
    }

    pub fn file(file: File, caption: impl Into<String>) -> Self {
        Self { kind: MessageKind::File, text: caption.into(), file: Some(file), ..Default::default() }
    }
}

/// One inbound or outbound message bound to a channel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub id:      i64,
    pub chat:    Channel,
    pub message: Message,
}

fn is_zero(v: &i64) -> bool { *v == 0 }
