use crate::error::ProviderError;
use crate::types::{Handle, OpenMode, DIRECTORY_MIME_TYPE};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Metadata a provider reports for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    pub mime_type: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
}

impl DocumentMetadata {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: DIRECTORY_MIME_TYPE.to_string(),
            size: 0,
        }
    }

    pub fn file(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.mime_type == DIRECTORY_MIME_TYPE
    }
}

/// One child returned by a directory enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub handle: Handle,
    pub metadata: DocumentMetadata,
}

/// Capability interface over a handle-based storage backend.
///
/// Every call may block on I/O and runs on the calling thread.
pub trait StorageProvider: Send + Sync {
    /// Short provider name for diagnostics.
    fn kind(&self) -> &'static str;

    fn metadata(&self, handle: &Handle) -> Result<DocumentMetadata, ProviderError>;

    /// Enumerate the children of a directory. Each call performs a fresh query.
    fn children(&self, directory: &Handle) -> Result<Vec<DocumentEntry>, ProviderError>;

    fn open_read(&self, handle: &Handle) -> Result<Box<dyn Read + Send>, ProviderError>;

    /// Open a document for writing. `OpenMode::Read` is rejected.
    fn open_write(
        &self,
        handle: &Handle,
        mode: OpenMode,
    ) -> Result<Box<dyn Write + Send>, ProviderError>;

    /// Open a document and detach a raw descriptor for a native caller.
    fn open_descriptor(&self, handle: &Handle, mode: OpenMode) -> Result<i32, ProviderError> {
        let _ = (handle, mode);
        Err(ProviderError::Unsupported("raw descriptors"))
    }

    /// Create a document (or a directory when `mime_type` is the directory
    /// mime type) under `parent`.
    ///
    /// Idempotent: when a child with the same name exists its handle is
    /// returned instead.
    fn create_document(
        &self,
        parent: &Handle,
        name: &str,
        mime_type: &str,
    ) -> Result<Handle, ProviderError>;
}

/// Whether `handle` can be enumerated as a directory tree root.
pub fn is_tree_valid(provider: &dyn StorageProvider, handle: &Handle) -> bool {
    provider.children(handle).is_ok()
}

/// Reject names a provider must never create.
pub(crate) fn validate_name(name: &str) -> Result<(), ProviderError> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(ProviderError::InvalidName(name.to_string()));
    }
    Ok(())
}
