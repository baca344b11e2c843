//! docfs: Virtual Path Resolution and Archive Streaming
//!
//! Resolves slash-delimited virtual paths over handle-based storage providers
//! through a lazily populated, cached document tree, and streams zip archives
//! and subtree copies between providers and local storage.

pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod tooling;
pub mod transfer;
pub mod tree;
pub mod types;

pub use error::{ApiError, ProviderError, TransferError};
pub use provider::{LocalProvider, MemoryProvider, StorageProvider};
pub use transfer::{ArchiveOptions, TransferOutcome};
pub use tree::DocumentTree;
pub use types::{Handle, OpenMode};
