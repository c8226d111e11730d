//! Inbound normalization: Telegram updates → gateway [`Update`]s.
//!
//! Only new messages in private (user-to-user) threads are delivered. Group
//! and channel traffic, outgoing echoes, bots and the account itself are
//! skipped.

use async_trait::async_trait;
use courier_gateway::{Account, Channel, File, GatewayError, Message, MessageKind, Update};
use courier_tl as tl;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::Client;
use crate::errors::InvocationError;
use crate::gateway::GatewayHandle;
use crate::invoker::UpdateHandler;
use crate::media::MediaTransfer;
use crate::peers::PeerKey;

/// Channel kind of Telegram contacts.
pub const CHANNEL: &str = "telegram";

#[derive(Error, Debug)]
pub enum UpdateError {
    /// The gateway refused the normalized message.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

// ─── Normalizer ───────────────────────────────────────────────────────────────

/// Turns new private messages into gateway updates and marks them read.
pub struct Normalizer {
    client:  Client,
    gateway: GatewayHandle,
    media:   MediaTransfer,
}

#[async_trait]
impl UpdateHandler for Normalizer {
    async fn handle(&self, cancel: &CancellationToken, updates: tl::enums::Updates) -> Result<(), UpdateError> {
        let mut first_err = None;
        for update in updates.into_updates() {
            let tl::enums::Update::NewMessage(update) = update else { continue };
            if let Err(e) = self.on_new_message(cancel, update).await {
                tracing::error!(error = %e, "[courier] updateNewMessage not delivered");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl Normalizer {
    pub fn new(client: Client, gateway: GatewayHandle, media: MediaTransfer) -> Self {
        Self { client, gateway, media }
    }

    async fn on_new_message(
        &self,
        cancel: &CancellationToken,
        update: tl::types::UpdateNewMessage,
    ) -> Result<(), UpdateError> {
        let tl::enums::Message::Message(msg) = update.message else { return Ok(()) };
        if msg.out {
            return Ok(());
        }
        let tl::enums::Peer::User(peer) = &msg.peer_id else { return Ok(()) };
        let from_id = peer.user_id;
        if from_id == 0 {
            tracing::warn!("[courier] private message without sender; ignored");
            return Ok(());
        }

        let user = match self.resolve_user(cancel, from_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(user_id = from_id, "[courier] sender not found; ignored");
                return Ok(());
            }
            Err(e) => {
                tracing::error!(user_id = from_id, error = %e, "[courier] sender unresolved; ignored");
                return Ok(());
            }
        };
        if user.bot || user.is_self {
            let reason = if user.bot { "message.from.bot" } else { "message.from.self" };
            tracing::warn!(user_id = from_id, reason, "[courier] ignored");
            return Ok(());
        }

        let result = self.deliver(cancel, &msg, &user).await;
        self.mark_read(cancel, &msg).await;
        result
    }

    async fn deliver(
        &self,
        cancel: &CancellationToken,
        msg:    &tl::types::Message,
        user:   &tl::types::User,
    ) -> Result<(), UpdateError> {
        let chat_id = user.id.to_string();
        let contact = Account {
            id:         0,
            channel:    CHANNEL.to_string(),
            contact:    chat_id.clone(),
            first_name: user.first_name.clone().unwrap_or_default(),
            last_name:  user.last_name.clone().unwrap_or_default(),
            username:   user.username.clone().unwrap_or_default(),
        };

        let gateway = self.gateway.get();
        let channel = gateway.get_channel(cancel, &chat_id, &contact).await?;

        let Some(mut message) = self.content(cancel, msg, user.id, &channel).await else {
            return Ok(());
        };

        message.variables.insert(chat_id, msg.id.to_string());
        if channel.is_new {
            message.variables.insert("username".to_string(), contact.username.clone());
        }
        gateway.read(cancel, Update { id: 0, chat: channel, message }).await?;
        Ok(())
    }

    /// The normalized message body, or `None` when the content is not
    /// supported or could not be fetched.
    async fn content(
        &self,
        cancel:    &CancellationToken,
        msg:       &tl::types::Message,
        sender_id: i64,
        channel:   &Channel,
    ) -> Option<Message> {
        use tl::enums::MessageMedia;

        let Some(media) = &msg.media else {
            return Some(Message::text(msg.message.clone()));
        };
        match media {
            MessageMedia::Empty => None,

            MessageMedia::Photo(m) => {
                let Some(tl::enums::Photo::Photo(photo)) = &m.photo else {
                    tracing::warn!("[courier] photo unavailable; ignored");
                    return None;
                };
                let mut file = File::default();
                let (thumb_size, size) = largest_size(&photo.sizes)?;
                if let Some(size) = size {
                    file.size = size;
                }
                let location = tl::enums::InputFileLocation::InputPhotoFileLocation(
                    tl::types::InputPhotoFileLocation {
                        id:             photo.id,
                        access_hash:    photo.access_hash,
                        file_reference: photo.file_reference.clone(),
                        thumb_size,
                    },
                );
                let file = self.download(cancel, file, location).await?;
                Some(Message::file(file, msg.message.clone()))
            }

            MessageMedia::Geo(m) => match &m.geo {
                tl::enums::GeoPoint::GeoPoint(g) => Some(Message::text(format!(
                    "https://www.google.com/maps/place/{:.6},{:.6}",
                    g.lat, g.long,
                ))),
                tl::enums::GeoPoint::Empty => {
                    tracing::warn!("[courier] empty geo point; ignored");
                    None
                }
            },

            MessageMedia::Contact(m) => {
                let mut account = Account {
                    channel:    "phone".to_string(),
                    contact:    m.phone_number.clone(),
                    first_name: m.first_name.clone(),
                    last_name:  m.last_name.clone(),
                    ..Default::default()
                };
                if m.user_id != 0 && m.user_id == sender_id {
                    account.id = channel.contact.id;
                }
                let mut name = format!("{} {}", m.first_name, m.last_name).trim().to_string();
                if !name.is_empty() {
                    name = format!("<{name}>");
                }
                let text = format!("{name} {}", m.phone_number).trim().to_string();
                Some(Message {
                    kind:    MessageKind::Contact,
                    text,
                    contact: Some(account),
                    ..Default::default()
                })
            }

            MessageMedia::Document(m) => {
                let Some(tl::enums::Document::Document(doc)) = &m.document else {
                    tracing::warn!("[courier] document unavailable; ignored");
                    return None;
                };
                let mut file = File { mime: doc.mime_type.clone(), size: doc.size, ..Default::default() };
                let mut thumb_size = String::new();
                let mut text = String::new();

                for attr in &doc.attributes {
                    match attr {
                        tl::enums::DocumentAttribute::Sticker(s) => {
                            if let Some((kind, size)) = doc.thumbs.as_deref().and_then(largest_size) {
                                thumb_size = kind;
                                if let Some(size) = size {
                                    file.size = size;
                                }
                            }
                            text = s.alt.clone();
                            file.mime = "image/webp".to_string();
                            file.name = format!("{}.webp", uuid::Uuid::new_v4());
                        }
                        tl::enums::DocumentAttribute::Filename(f) => {
                            if file.name.is_empty() {
                                file.name = f.file_name.clone();
                            }
                        }
                        tl::enums::DocumentAttribute::ImageSize(_)
                        | tl::enums::DocumentAttribute::Animated
                        | tl::enums::DocumentAttribute::Video(_)
                        | tl::enums::DocumentAttribute::Audio(_) => {}
                    }
                }

                let location = tl::enums::InputFileLocation::InputDocumentFileLocation(
                    tl::types::InputDocumentFileLocation {
                        id:             doc.id,
                        access_hash:    doc.access_hash,
                        file_reference: doc.file_reference.clone(),
                        thumb_size,
                    },
                );
                let file = self.download(cancel, file, location).await?;
                if text.is_empty() {
                    text = msg.message.clone();
                }
                Some(Message::file(file, text))
            }

            other => {
                tracing::warn!(media = ?other, "[courier] media reaction not implemented; ignored");
                None
            }
        }
    }

    async fn download(
        &self,
        cancel:   &CancellationToken,
        file:     File,
        location: tl::enums::InputFileLocation,
    ) -> Option<File> {
        match self.media.download_to_storage(cancel, file, location).await {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::error!(error = %e, "[courier] upload.getFile failed; message ignored");
                None
            }
        }
    }

    /// Sender snapshot from the directory, else `users.getUsers`.
    async fn resolve_user(
        &self,
        cancel:  &CancellationToken,
        user_id: i64,
    ) -> Result<Option<tl::types::User>, InvocationError> {
        let peers = self.client.peers();
        if let Some(user) = peers.find_user(user_id) {
            return Ok(Some(user));
        }
        let access_hash = peers.find(PeerKey::user(user_id)).map(|v| v.access_hash).unwrap_or(0);
        let req = tl::functions::users::GetUsers {
            id: vec![tl::enums::InputUser::User(tl::types::InputUser { user_id, access_hash })],
        };
        let users = self.client.invoke(cancel, req).await?;
        Ok(users.into_iter().find_map(|u| match u {
            tl::enums::User::User(u) if u.id == user_id => Some(u),
            _ => None,
        }))
    }

    async fn mark_read(&self, cancel: &CancellationToken, msg: &tl::types::Message) {
        let req = tl::functions::messages::ReadHistory {
            peer:   self.client.peers().input_peer(&msg.peer_id),
            max_id: msg.id,
        };
        if let Err(e) = self.client.invoke(cancel, req).await {
            tracing::warn!(error = %e, "[courier] messages.readHistory failed");
        }
    }
}

/// Thumbnail type (and byte size, when known) of the largest downloadable
/// size, searching from the end.
fn largest_size(sizes: &[tl::enums::PhotoSize]) -> Option<(String, Option<i64>)> {
    sizes.iter().rev().find_map(|s| match s {
        tl::enums::PhotoSize::Size(s)        => Some((s.r#type.clone(), Some(s.size as i64))),
        tl::enums::PhotoSize::Progressive(s) => Some((s.r#type.clone(), None)),
        tl::enums::PhotoSize::Empty(_)
        | tl::enums::PhotoSize::PhotoCachedSize(_)
        | tl::enums::PhotoSize::PhotoStrippedSize(_)
        | tl::enums::PhotoSize::PhotoPathSize(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn largest_size_skips_inline_variants() {
        let sizes = vec![
            tl::enums::PhotoSize::Size(tl::types::PhotoSize { r#type: "m".into(), w: 320, h: 320, size: 900 }),
            tl::enums::PhotoSize::Progressive(tl::types::PhotoSizeProgressive {
                r#type: "y".into(), w: 1280, h: 1280, sizes: vec![10, 20],
            }),
            tl::enums::PhotoSize::PhotoStrippedSize(tl::types::PhotoStrippedSize {
                r#type: "i".into(), bytes: vec![1],
            }),
        ];
        assert_eq!(largest_size(&sizes), Some(("y".to_string(), None)));
        assert_eq!(largest_size(&sizes[..1]), Some(("m".to_string(), Some(900))));
        assert_eq!(largest_size(&sizes[2..]), None);
    }
}
