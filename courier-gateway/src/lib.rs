//! Contracts shared by courier channel providers.
//!
//! A [`Provider`] adapts one external messaging platform. It is built from a
//! bot profile ([`Gateway`]) through a [`ProviderRegistry`], stores binary
//! attachments through [`FileStorage`] and exchanges messages as [`Update`]s.

#![deny(unsafe_code)]

pub mod envelope;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod storage;

pub use envelope::{Account, Channel, File, Message, MessageKind, Update};
pub use error::{GatewayError, Result};
pub use gateway::Gateway;
pub use provider::{Provider, ProviderFactory, ProviderRegistry};
pub use storage::{FileStorage, UploadMetadata, UploadStream, UploadedFile};
