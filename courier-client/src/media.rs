//! Media transfer between Telegram and the internal object storage.
//!
//! ## Download
//! [`MediaTransfer::download_to_storage`] pumps a Telegram file location
//! chunk by chunk into a [`FileStorage`] upload stream, never holding more
//! than one chunk in memory.
//!
//! ## Upload
//! [`MediaTransfer::upload_from_url`] fetches a stored file over HTTP, pushes
//! it to Telegram part by part as the body arrives and returns the
//! `InputMedia` to send it with. A body without `Content-Length` is held
//! back only until it crosses the big-file threshold.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use courier_gateway::{File, FileStorage, UploadMetadata, UploadStream};
use courier_tl as tl;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::Client;
use crate::errors::{InvocationError, MediaError};
use crate::gateway::GatewayHandle;

// ─── Constants ────────────────────────────────────────────────────────────────

/// Files at least this large are uploaded with `upload.saveBigFilePart`.
const BIG_FILE_THRESHOLD: usize = 10 * 1024 * 1024;

/// Delay before retrying a chunk that timed out server-side.
const TIMEOUT_BACKOFF: Duration = Duration::from_secs(1);

// ─── UploadedMedia ────────────────────────────────────────────────────────────

/// A file pushed to Telegram, ready to be attached to a message.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadedMedia {
    pub file: tl::enums::InputFile,
    pub name: String,
    pub mime: String,
    pub size: usize,
}

impl UploadedMedia {
    /// Pick the media kind by MIME type: GIF animation, photo, audio, video
    /// or a generic document.
    pub fn input_media(&self) -> tl::enums::InputMedia {
        let filename = tl::enums::DocumentAttribute::Filename(tl::types::DocumentAttributeFilename {
            file_name: self.name.clone(),
        });
        let document = |force_file: bool, attributes: Vec<tl::enums::DocumentAttribute>| {
            tl::enums::InputMedia::UploadedDocument(tl::types::InputMediaUploadedDocument {
                nosound_video: false,
                force_file,
                file:          self.file.clone(),
                mime_type:     self.mime.clone(),
                attributes,
            })
        };

        let mime = media_type(&self.mime);
        if mime == "image/gif" {
            return document(false, vec![tl::enums::DocumentAttribute::Animated, filename]);
        }
        match mime.split('/').next().unwrap_or_default() {
            "image" => tl::enums::InputMedia::UploadedPhoto(tl::types::InputMediaUploadedPhoto {
                spoiler:     false,
                file:        self.file.clone(),
                ttl_seconds: None,
            }),
            "audio" => document(false, vec![
                tl::enums::DocumentAttribute::Audio(tl::types::DocumentAttributeAudio::default()),
                filename,
            ]),
            "video" => document(false, vec![
                tl::enums::DocumentAttribute::Video(tl::types::DocumentAttributeVideo {
                    supports_streaming: true,
                    ..Default::default()
                }),
                filename,
            ]),
            _ => document(true, vec![filename]),
        }
    }
}

// ─── MediaTransfer ────────────────────────────────────────────────────────────

/// Moves files between Telegram and the object storage for one account.
#[derive(Clone)]
pub struct MediaTransfer {
    client:  Client,
    storage: Arc<dyn FileStorage>,
    gateway: GatewayHandle,
    http:    reqwest::Client,
}

impl MediaTransfer {
    pub fn new(client: Client, storage: Arc<dyn FileStorage>, gateway: GatewayHandle) -> Self {
        Self { client, storage, gateway, http: reqwest::Client::new() }
    }

    /// Use a preconfigured HTTP client for [`upload_from_url`](Self::upload_from_url).
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn chunk_size(&self) -> usize {
        self.client.config().chunk_size.max(1)
    }

    // ── Download ───────────────────────────────────────────────────────────

    /// Copy the file at `location` into storage.
    ///
    /// `file` seeds the descriptor: a non-empty `name` or `mime` is kept
    /// where the storage file type does not decide it.
    pub async fn download_to_storage(
        &self,
        cancel:   &CancellationToken,
        mut file: File,
        location: tl::enums::InputFileLocation,
    ) -> Result<File, MediaError> {
        let limit = self.chunk_size();
        let mut req = tl::functions::upload::GetFile {
            precise:       false,
            cdn_supported: false,
            location,
            offset:        0,
            limit:         limit as i32,
        };
        let mut stream: Option<Box<dyn UploadStream>> = None;

        loop {
            let part = match self.client.invoke(cancel, req.clone()).await {
                Ok(tl::enums::upload::File::File(part)) => part,
                Ok(tl::enums::upload::File::CdnRedirect(r)) => {
                    return Err(MediaError::CdnRedirect { dc_id: r.dc_id });
                }
                Err(e) => {
                    let delay = match e.flood_wait_seconds() {
                        Some(secs)              => Duration::from_secs(secs),
                        None if e.is_timeout()  => TIMEOUT_BACKOFF,
                        None                    => return Err(e.into()),
                    };
                    tracing::debug!(offset = req.offset, "[courier] upload.getFile: {e}; retrying in {delay:?}");
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => continue,
                        _ = cancel.cancelled() => return Err(InvocationError::Cancelled.into()),
                    }
                }
            };

            req.offset += part.bytes.len() as i64;
            let last = part.bytes.len() < limit;

            if stream.is_none() {
                name_by_file_type(&mut file, part.r#type);
                let meta = UploadMetadata {
                    domain_id: self.gateway.get().domain_id(),
                    mime:      file.mime.clone(),
                    name:      file.name.clone(),
                    uuid:      uuid::Uuid::new_v4().to_string(),
                };
                stream = Some(self.storage.upload_file(cancel, meta).await?);
            }

            if let Some(sink) = stream.as_mut() {
                if !part.bytes.is_empty() {
                    sink.send(part.bytes).await?;
                }
                if last {
                    sink.send(Vec::new()).await?;
                    break;
                }
            }
        }

        let Some(stream) = stream else { return Err(MediaError::NoLocation) };
        let stored = stream.close().await?;
        tracing::debug!(file_id = stored.id, size = stored.size, "[courier] media stored ✓");

        file.id      = stored.id;
        file.url     = self.absolute_url(stored.url);
        file.size    = stored.size;
        file.malware = stored.malware;
        Ok(file)
    }

    /// Rebase a filesystem-absolute storage path onto the public host URL.
    fn absolute_url(&self, url: String) -> String {
        if !url.starts_with('/') {
            return url;
        }
        let host = self.gateway.get().host_url();
        match Url::parse(&host).and_then(|base| base.join(&url)) {
            Ok(u) => u.to_string(),
            Err(e) => {
                tracing::warn!(host, error = %e, "[courier] host URL unusable; keeping storage path");
                url
            }
        }
    }

    // ── Upload ─────────────────────────────────────────────────────────────

    /// Fetch `file.url` and upload its content to Telegram.
    pub async fn upload_from_url(
        &self,
        cancel: &CancellationToken,
        file:   &File,
    ) -> Result<UploadedMedia, MediaError> {
        let http_err = |source| MediaError::Http { url: file.url.clone(), source };

        let mut rsp = tokio::select! {
            r = self.http.get(&file.url).send() => r.map_err(http_err)?,
            _ = cancel.cancelled() => return Err(InvocationError::Cancelled.into()),
        };
        let status = rsp.status();
        if status.as_u16() >= 400 {
            return Err(MediaError::HttpStatus {
                url:    file.url.clone(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let header = |name: reqwest::header::HeaderName| {
            rsp.headers().get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
        };
        let content_type = header(reqwest::header::CONTENT_TYPE).map(|v| media_type(&v)).unwrap_or_default();
        let disposition  = header(reqwest::header::CONTENT_DISPOSITION);

        let mut name = file.name.clone();
        if name.is_empty() {
            name = disposition.as_deref().and_then(disposition_filename).unwrap_or_default();
        }
        if name.is_empty() {
            name = url_basename(rsp.url());
        }
        if !has_extension(&name) {
            if let Some(ext) = mime_guess::get_mime_extensions_str(&content_type).and_then(|e| e.first()) {
                name = format!("{name}.{ext}");
            }
        }

        let mut mime = media_type(&file.mime);
        if mime.is_empty() {
            mime = content_type;
        }
        if mime.is_empty() {
            mime = mime_guess::from_path(&name).first_or_octet_stream().essence_str().to_string();
        }

        let mut upload = PartUpload::new(&self.client, cancel, self.chunk_size(), rsp.content_length());
        loop {
            let chunk = tokio::select! {
                c = rsp.chunk() => c.map_err(http_err)?,
                _ = cancel.cancelled() => return Err(InvocationError::Cancelled.into()),
            };
            let Some(chunk) = chunk else { break };
            upload.write(&chunk).await?;
        }
        let size  = upload.size;
        let input = upload.finish(&name).await?;
        tracing::info!("[courier] file '{name}' uploaded ({size} bytes)");
        Ok(UploadedMedia { file: input, name, mime, size })
    }
}

// ─── PartUpload ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
enum PartMode {
    Small,
    /// `total` is `None` while the length is unknown; such parts carry `-1`
    /// until the last one.
    Big { total: Option<i32> },
    /// No length announced: parts are held back until the file crosses the
    /// big-file threshold or ends.
    Unsized,
}

/// Pushes a body to Telegram as it arrives, one part at a time.
struct PartUpload<'a> {
    client:    &'a Client,
    cancel:    &'a CancellationToken,
    file_id:   i64,
    part_size: usize,
    mode:      PartMode,
    pending:   Vec<u8>,
    held:      Vec<Vec<u8>>,
    next:      i32,
    size:      usize,
}

impl<'a> PartUpload<'a> {
    fn new(client: &'a Client, cancel: &'a CancellationToken, part_size: usize, length: Option<u64>) -> Self {
        let mode = match length.map(|n| n as usize) {
            Some(n) if n >= BIG_FILE_THRESHOLD => PartMode::Big { total: Some(n.div_ceil(part_size).max(1) as i32) },
            Some(_) => PartMode::Small,
            None => PartMode::Unsized,
        };
        Self {
            client,
            cancel,
            file_id: crate::random_i64(),
            part_size,
            mode,
            pending: Vec::with_capacity(part_size),
            held: Vec::new(),
            next: 0,
            size: 0,
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), InvocationError> {
        self.size += data.len();
        self.pending.extend_from_slice(data);
        // Keep the tail: the last part must be known as such when it is sent.
        while self.pending.len() > self.part_size {
            let rest = self.pending.split_off(self.part_size);
            let part = std::mem::replace(&mut self.pending, rest);
            self.part(part, false).await?;
        }
        Ok(())
    }

    async fn finish(mut self, name: &str) -> Result<tl::enums::InputFile, InvocationError> {
        let last = std::mem::take(&mut self.pending);
        self.part(last, true).await?;

        Ok(match self.mode {
            PartMode::Big { .. } => tl::enums::InputFile::Big(tl::types::InputFileBig {
                id:    self.file_id,
                parts: self.next,
                name:  name.to_string(),
            }),
            _ => tl::enums::InputFile::InputFile(tl::types::InputFile {
                id:           self.file_id,
                parts:        self.next,
                name:         name.to_string(),
                md5_checksum: String::new(),
            }),
        })
    }

    async fn part(&mut self, bytes: Vec<u8>, last: bool) -> Result<(), InvocationError> {
        if self.mode != PartMode::Unsized {
            return self.send(bytes, last).await;
        }

        self.held.push(bytes);
        if self.size >= BIG_FILE_THRESHOLD {
            self.mode = PartMode::Big { total: None };
        } else if last {
            self.mode = PartMode::Small;
        } else {
            return Ok(());
        }
        let held = std::mem::take(&mut self.held);
        let count = held.len();
        for (i, bytes) in held.into_iter().enumerate() {
            self.send(bytes, last && i + 1 == count).await?;
        }
        Ok(())
    }

    async fn send(&mut self, bytes: Vec<u8>, last: bool) -> Result<(), InvocationError> {
        let file_part = self.next;
        if let PartMode::Big { total } = self.mode {
            let file_total_parts = total.unwrap_or(if last { file_part + 1 } else { -1 });
            let req = tl::functions::upload::SaveBigFilePart {
                file_id: self.file_id,
                file_part,
                file_total_parts,
                bytes,
            };
            self.client.invoke_with_retry(self.cancel, req).await?;
        } else {
            let req = tl::functions::upload::SaveFilePart { file_id: self.file_id, file_part, bytes };
            self.client.invoke_with_retry(self.cancel, req).await?;
        }
        self.next += 1;
        tracing::debug!("[courier] uploaded part {}", self.next);
        Ok(())
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Fill MIME type and default name from the storage file-type tag of the
/// first chunk.
fn name_by_file_type(file: &mut File, kind: tl::enums::storage::FileType) {
    use tl::enums::storage::FileType;

    let (mime, prefix, ext) = match kind {
        FileType::Jpeg => ("image/jpeg", "image", "jpg"),
        FileType::Gif  => ("image/gif", "image", "gif"),
        FileType::Png  => ("image/png", "image", "png"),
        FileType::Pdf  => ("application/pdf", "doc", "pdf"),
        FileType::Mp3  => ("audio/mpeg", "audio", "mp3"),
        FileType::Mov  => ("video/quicktime", "video", "mov"),
        FileType::Mp4  => ("video/mp4", "video", "mp4"),
        FileType::Webp => ("image/webp", "image", "webp"),
        FileType::Unknown | FileType::Partial => ("", "file", "bin"),
    };
    if !mime.is_empty() {
        file.mime = mime.to_string();
    } else if file.mime.is_empty() {
        file.mime = "application/octet-stream".to_string();
    }
    if file.name.is_empty() {
        file.name = format!("{prefix}{}.{ext}", Local::now().format("_%Y-%m-%d_%H-%M-%S"));
    }
}

/// `type/subtype` without parameters, lowercased.
fn media_type(value: &str) -> String {
    value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// The `filename` parameter of a `Content-Disposition` header, path stripped.
fn disposition_filename(value: &str) -> Option<String> {
    let raw = value
        .split(';')
        .skip(1)
        .filter_map(|p| p.trim().split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, v)| v.trim().trim_matches('"'))?;
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    match base {
        "" | "." | ".." => None,
        b => Some(b.to_string()),
    }
}

fn url_basename(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut s| s.next_back())
        .unwrap_or_default()
        .to_string()
}

fn has_extension(name: &str) -> bool {
    std::path::Path::new(name).extension().is_some()
}
