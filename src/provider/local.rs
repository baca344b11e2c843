//! Local storage provider.
//!
//! Handles are canonical absolute paths rendered as strings, so a tree bound
//! to a `LocalProvider` behaves like any opaque provider while staying cheap
//! to inspect.

use super::contract::{validate_name, DocumentEntry, DocumentMetadata, StorageProvider};
use crate::error::ProviderError;
use crate::types::{mime_for_name, Handle, OpenMode, DIRECTORY_MIME_TYPE};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Provider over plain local storage.
#[derive(Debug, Clone, Default)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }

    /// Handle for an existing local path.
    pub fn handle_for(path: &Path) -> Result<Handle, ProviderError> {
        let canonical = dunce::canonicalize(path)
            .map_err(|e| ProviderError::io(path.display(), e))?;
        Ok(Handle::new(canonical.to_string_lossy().into_owned()))
    }

    fn path_of(handle: &Handle) -> PathBuf {
        PathBuf::from(handle.as_str())
    }

    fn map_io(handle: &Handle, e: io::Error) -> ProviderError {
        match e.kind() {
            io::ErrorKind::NotFound => ProviderError::NotFound(handle.to_string()),
            _ => ProviderError::io(handle, e),
        }
    }

    fn metadata_for(path: &Path, meta: &fs::Metadata) -> DocumentMetadata {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if meta.is_dir() {
            DocumentMetadata::directory(name)
        } else {
            let mime = mime_for_name(&name);
            DocumentMetadata::file(name, mime, meta.len())
        }
    }

    fn open_options(mode: OpenMode) -> OpenOptions {
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => {
                options.read(true);
            }
            OpenMode::WriteTruncate => {
                options.write(true).create(true).truncate(true);
            }
            OpenMode::WriteAppend => {
                options.append(true).create(true);
            }
            OpenMode::ReadWrite => {
                options.read(true).write(true).create(true);
            }
        }
        options
    }

    fn open_file(handle: &Handle, mode: OpenMode) -> Result<File, ProviderError> {
        let path = Self::path_of(handle);
        if path.is_dir() {
            return Err(ProviderError::IsADirectory(handle.to_string()));
        }
        Self::open_options(mode)
            .open(&path)
            .map_err(|e| Self::map_io(handle, e))
    }
}

impl StorageProvider for LocalProvider {
    fn kind(&self) -> &'static str {
        "local"
    }

    fn metadata(&self, handle: &Handle) -> Result<DocumentMetadata, ProviderError> {
        let path = Self::path_of(handle);
        let meta = fs::metadata(&path).map_err(|e| Self::map_io(handle, e))?;
        Ok(Self::metadata_for(&path, &meta))
    }

    fn children(&self, directory: &Handle) -> Result<Vec<DocumentEntry>, ProviderError> {
        let path = Self::path_of(directory);
        if !path.is_dir() {
            return Err(ProviderError::NotADirectory(directory.to_string()));
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&path).map_err(|e| Self::map_io(directory, e))? {
            let entry = entry.map_err(|e| ProviderError::io(directory, e))?;
            let child_path = entry.path();
            let meta = match fs::metadata(&child_path) {
                Ok(meta) => meta,
                Err(e) => {
                    // Dangling symlinks and races with deletion are skipped.
                    tracing::debug!("Skipping unreadable entry {}: {}", child_path.display(), e);
                    continue;
                }
            };
            entries.push(DocumentEntry {
                handle: Handle::new(child_path.to_string_lossy().into_owned()),
                metadata: Self::metadata_for(&child_path, &meta),
            });
        }
        entries.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(entries)
    }

    fn open_read(&self, handle: &Handle) -> Result<Box<dyn Read + Send>, ProviderError> {
        Ok(Box::new(Self::open_file(handle, OpenMode::Read)?))
    }

    fn open_write(
        &self,
        handle: &Handle,
        mode: OpenMode,
    ) -> Result<Box<dyn Write + Send>, ProviderError> {
        if !mode.is_write() {
            return Err(ProviderError::InvalidMode(mode.as_str().to_string()));
        }
        Ok(Box::new(Self::open_file(handle, mode)?))
    }

    #[cfg(unix)]
    fn open_descriptor(&self, handle: &Handle, mode: OpenMode) -> Result<i32, ProviderError> {
        use std::os::fd::IntoRawFd;
        Ok(Self::open_file(handle, mode)?.into_raw_fd())
    }

    fn create_document(
        &self,
        parent: &Handle,
        name: &str,
        mime_type: &str,
    ) -> Result<Handle, ProviderError> {
        validate_name(name)?;
        let parent_path = Self::path_of(parent);
        if !parent_path.is_dir() {
            return Err(ProviderError::NotADirectory(parent.to_string()));
        }

        let path = parent_path.join(name);
        let handle = Handle::new(path.to_string_lossy().into_owned());
        if path.exists() {
            return Ok(handle);
        }

        if mime_type == DIRECTORY_MIME_TYPE {
            fs::create_dir(&path).map_err(|e| ProviderError::io(&handle, e))?;
        } else {
            OpenOptions::new()
                .write(true)
                .create(true)
                .open(&path)
                .map_err(|e| ProviderError::io(&handle, e))?;
        }
        Ok(handle)
    }
}
