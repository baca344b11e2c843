//! In-memory opaque provider.
//!
//! Issues `memory://document/<id>` handles with no path structure, the way a
//! content-resolver style backend does. Supports simulated revocation so the
//! lookup layer's degrade-to-miss behavior can be exercised.

use super::contract::{validate_name, DocumentEntry, DocumentMetadata, StorageProvider};
use crate::error::ProviderError;
use crate::types::{mime_for_name, Handle, OpenMode, DIRECTORY_MIME_TYPE};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const HANDLE_PREFIX: &str = "memory://document/";

#[derive(Debug)]
enum DocumentBody {
    Directory(BTreeMap<String, u64>),
    File(Vec<u8>),
}

#[derive(Debug)]
struct MemoryDocument {
    name: String,
    mime_type: String,
    body: DocumentBody,
}

impl MemoryDocument {
    fn metadata(&self) -> DocumentMetadata {
        match &self.body {
            DocumentBody::Directory(_) => DocumentMetadata::directory(self.name.clone()),
            DocumentBody::File(data) => {
                DocumentMetadata::file(self.name.clone(), self.mime_type.clone(), data.len() as u64)
            }
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    documents: HashMap<u64, MemoryDocument>,
}

impl MemoryState {
    fn insert(&mut self, document: MemoryDocument) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.documents.insert(id, document);
        id
    }
}

/// Opaque in-memory storage provider.
#[derive(Debug, Clone)]
pub struct MemoryProvider {
    state: Arc<RwLock<MemoryState>>,
    available: Arc<AtomicBool>,
    enumerations: Arc<AtomicUsize>,
    root: u64,
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProvider {
    /// Create a provider holding a single empty root directory.
    pub fn new() -> Self {
        let mut state = MemoryState::default();
        let root = state.insert(MemoryDocument {
            name: "root".to_string(),
            mime_type: DIRECTORY_MIME_TYPE.to_string(),
            body: DocumentBody::Directory(BTreeMap::new()),
        });
        Self {
            state: Arc::new(RwLock::new(state)),
            available: Arc::new(AtomicBool::new(true)),
            enumerations: Arc::new(AtomicUsize::new(0)),
            root,
        }
    }

    pub fn root_handle(&self) -> Handle {
        Self::handle(self.root)
    }

    /// Toggle availability; while unavailable every call fails as if access
    /// had been revoked.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `children` calls served so far.
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Create every missing directory along the slash path `path`.
    pub fn add_directory(&self, path: &str) -> Result<Handle, ProviderError> {
        let mut current = self.root_handle();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.create_document(&current, segment, DIRECTORY_MIME_TYPE)?;
        }
        Ok(current)
    }

    /// Create a file at the slash path `path` (and its parents) with `data`.
    pub fn add_file(&self, path: &str, data: &[u8]) -> Result<Handle, ProviderError> {
        let path = path.trim_end_matches('/');
        let (parent, name) = match path.rsplit_once('/') {
            Some((parent, name)) => (self.add_directory(parent)?, name),
            None => (self.root_handle(), path),
        };
        let handle = self.create_document(&parent, name, mime_for_name(name))?;
        let mut writer = self.open_write(&handle, OpenMode::WriteTruncate)?;
        writer
            .write_all(data)
            .and_then(|_| writer.flush())
            .map_err(|e| ProviderError::io(&handle, e))?;
        Ok(handle)
    }

    fn handle(id: u64) -> Handle {
        Handle::new(format!("{}{}", HANDLE_PREFIX, id))
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ProviderError::Unavailable("memory provider revoked".to_string()))
        }
    }

    fn id_of(&self, handle: &Handle) -> Result<u64, ProviderError> {
        self.check_available()?;
        let id = handle
            .as_str()
            .strip_prefix(HANDLE_PREFIX)
            .and_then(|raw| raw.parse::<u64>().ok())
            .ok_or_else(|| ProviderError::NotFound(handle.to_string()))?;
        if self.state.read().documents.contains_key(&id) {
            Ok(id)
        } else {
            Err(ProviderError::NotFound(handle.to_string()))
        }
    }
}

impl StorageProvider for MemoryProvider {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn metadata(&self, handle: &Handle) -> Result<DocumentMetadata, ProviderError> {
        let id = self.id_of(handle)?;
        let state = self.state.read();
        state
            .documents
            .get(&id)
            .map(MemoryDocument::metadata)
            .ok_or_else(|| ProviderError::NotFound(handle.to_string()))
    }

    fn children(&self, directory: &Handle) -> Result<Vec<DocumentEntry>, ProviderError> {
        let id = self.id_of(directory)?;
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read();
        let Some(DocumentBody::Directory(children)) = state.documents.get(&id).map(|d| &d.body)
        else {
            return Err(ProviderError::NotADirectory(directory.to_string()));
        };

        Ok(children
            .values()
            .filter_map(|child| {
                state.documents.get(child).map(|doc| DocumentEntry {
                    handle: Self::handle(*child),
                    metadata: doc.metadata(),
                })
            })
            .collect())
    }

    fn open_read(&self, handle: &Handle) -> Result<Box<dyn Read + Send>, ProviderError> {
        let id = self.id_of(handle)?;
        let state = self.state.read();
        match state.documents.get(&id).map(|d| &d.body) {
            Some(DocumentBody::File(data)) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(DocumentBody::Directory(_)) => {
                Err(ProviderError::IsADirectory(handle.to_string()))
            }
            None => Err(ProviderError::NotFound(handle.to_string())),
        }
    }

    fn open_write(
        &self,
        handle: &Handle,
        mode: OpenMode,
    ) -> Result<Box<dyn Write + Send>, ProviderError> {
        if !mode.is_write() {
            return Err(ProviderError::InvalidMode(mode.as_str().to_string()));
        }
        let id = self.id_of(handle)?;
        let existing = match self.state.read().documents.get(&id).map(|d| &d.body) {
            Some(DocumentBody::File(data)) => data.clone(),
            Some(DocumentBody::Directory(_)) => {
                return Err(ProviderError::IsADirectory(handle.to_string()))
            }
            None => return Err(ProviderError::NotFound(handle.to_string())),
        };

        let mut buffer = match mode {
            OpenMode::WriteTruncate => Cursor::new(Vec::new()),
            _ => Cursor::new(existing),
        };
        if mode == OpenMode::WriteAppend {
            buffer
                .seek(SeekFrom::End(0))
                .map_err(|e| ProviderError::io(handle, e))?;
        }

        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
            id,
            buffer,
        }))
    }

    fn create_document(
        &self,
        parent: &Handle,
        name: &str,
        mime_type: &str,
    ) -> Result<Handle, ProviderError> {
        validate_name(name)?;
        let parent_id = self.id_of(parent)?;
        let mut state = self.state.write();

        match state.documents.get(&parent_id).map(|d| &d.body) {
            Some(DocumentBody::Directory(children)) => {
                if let Some(existing) = children.get(name) {
                    return Ok(Self::handle(*existing));
                }
            }
            _ => return Err(ProviderError::NotADirectory(parent.to_string())),
        }

        let body = if mime_type == DIRECTORY_MIME_TYPE {
            DocumentBody::Directory(BTreeMap::new())
        } else {
            DocumentBody::File(Vec::new())
        };
        let id = state.insert(MemoryDocument {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            body,
        });
        if let Some(DocumentBody::Directory(children)) =
            state.documents.get_mut(&parent_id).map(|d| &mut d.body)
        {
            children.insert(name.to_string(), id);
        }
        Ok(Self::handle(id))
    }
}

/// Buffered writer that publishes its contents on flush and on drop.
struct MemoryWriter {
    state: Arc<RwLock<MemoryState>>,
    id: u64,
    buffer: Cursor<Vec<u8>>,
}

impl MemoryWriter {
    fn commit(&self) -> io::Result<()> {
        let mut state = self.state.write();
        match state.documents.get_mut(&self.id).map(|d| &mut d.body) {
            Some(DocumentBody::File(data)) => {
                data.clone_from(self.buffer.get_ref());
                Ok(())
            }
            _ => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "document no longer exists",
            )),
        }
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit()
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if let Err(e) = self.commit() {
            tracing::warn!("Dropping memory writer for document {}: {}", self.id, e);
        }
    }
}
