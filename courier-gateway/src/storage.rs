//! Internal object-storage streaming ingest.
//!
//! An upload is one metadata frame ([`FileStorage::upload_file`]), any number
//! of data frames ([`UploadStream::send`]) and an explicit close that returns
//! the stored file descriptor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Header frame opening an upload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub domain_id: i64,
    pub mime:      String,
    pub name:      String,
    pub uuid:      String,
}

/// Storage-assigned descriptor returned when an upload stream is closed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub id:      i64,
    /// Network URL, or a filesystem-absolute path the caller must rebase.
    pub url:     String,
    pub size:    i64,
    #[serde(default)]
    pub malware: bool,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Open an upload stream and send its metadata frame.
    async fn upload_file(
        &self,
        cancel: &CancellationToken,
        meta:   UploadMetadata,
    ) -> Result<Box<dyn UploadStream>>;
}

#[async_trait]
pub trait UploadStream: Send {
    /// Send one data frame. An empty frame marks end of file.
    async fn send(&mut self, chunk: Vec<u8>) -> Result<()>;

    /// Close the stream and receive the stored file descriptor.
    async fn close(self: Box<Self>) -> Result<UploadedFile>;
}
