//! cfr2-core: Core library for the cfr2 R2 CLI client
//!
//! This crate provides the core functionality for cfr2, including:
//! - Configuration loading (file + environment)
//! - The ObjectStore trait the transfer layer runs against
//! - Byte-counting progress decorators
//! - The transfer operations themselves (list, download, upload, delete,
//!   rename, presign)
//!
//! This crate is independent of the S3 SDK, so the transfer layer can be
//! tested against in-memory and mocked stores.

pub mod config;
pub mod error;
pub mod progress;
pub mod traits;
pub mod transfer;

pub use config::{Config, ConfigManager, EnvOverrides};
pub use error::{Error, Result};
pub use progress::{NoProgress, ProgressObserver, ProgressReader, ProgressWriter, TransferProgress};
pub use traits::{BoxedReader, ListPage, ObjectBody, ObjectInfo, ObjectStore, PresignedUrl};
pub use transfer::DEFAULT_PRESIGN_EXPIRY;
