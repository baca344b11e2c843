//! Path Resolver
//!
//! Walks slash-delimited paths through a `DocumentTree`. Every lookup-style
//! operation here answers with a plain value or a sentinel (`false`, `-1`,
//! the input string) instead of an error: the far side of this surface is a
//! native caller checking return codes.

use super::document_tree::DocumentTree;
use super::node::NodeInfo;
use crate::types::{mime_for_name, OpenMode, DIRECTORY_MIME_TYPE};
use std::io::{Read, Write};
use tracing::{debug, warn};

/// Separator for virtual paths, independent of the host platform.
pub const SEPARATOR: char = '/';

/// Descriptor returned to native callers when a path cannot be opened.
pub const INVALID_DESCRIPTOR: i32 = -1;

/// Size reported for paths that do not resolve.
pub const UNKNOWN_SIZE: i64 = -1;

/// Split a path into segments, dropping empty ones so repeated, leading and
/// trailing separators are tolerated.
pub fn tokenize(path: &str) -> impl Iterator<Item = &str> {
    path.split(SEPARATOR).filter(|segment| !segment.is_empty())
}

/// Whether `path` is a host path rather than a virtual one.
pub fn is_native_path(path: &str) -> bool {
    path.starts_with(SEPARATOR)
}

impl DocumentTree {
    /// Resolve `path` to a node, populating directories on the way down.
    ///
    /// Fails at the first missing segment without creating anything. A path
    /// with no segments resolves to the root without touching the provider.
    pub fn resolve(&self, path: &str) -> Option<NodeInfo> {
        let mut current = self.root()?.id;
        for segment in tokenize(path) {
            current = self.child(current, segment)?;
        }
        self.node(current)
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    pub fn is_directory(&self, path: &str) -> bool {
        self.resolve(path).map_or(false, |node| node.is_directory)
    }

    /// Name of the resolved node, or `path` itself when it does not resolve.
    pub fn filename(&self, path: &str) -> String {
        match self.resolve(path) {
            Some(node) if !node.name.is_empty() => node.name,
            _ => path.to_string(),
        }
    }

    /// Lowercased extension of the resolved filename.
    pub fn extension(&self, path: &str) -> String {
        let name = self.filename(path);
        match name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => name.to_lowercase(),
        }
    }

    /// Handle string of a writable directory for `path`.
    ///
    /// Returns the parent's handle when the parent is a directory, otherwise
    /// the node's own handle. Unresolvable paths come back unchanged.
    pub fn parent_directory(&self, path: &str) -> String {
        let Some(node) = self.resolve(path) else {
            return path.to_string();
        };
        let parent = node.parent.and_then(|id| self.node(id));
        let handle = match parent {
            Some(parent) if parent.is_directory => parent.handle,
            _ => node.handle,
        };
        handle.map_or_else(|| path.to_string(), |h| h.to_string())
    }

    /// Size in bytes, `0` for directories, `-1` when the path does not
    /// resolve or the provider cannot answer.
    pub fn file_size(&self, path: &str) -> i64 {
        let Some(node) = self.resolve(path) else {
            return UNKNOWN_SIZE;
        };
        if node.is_directory {
            return 0;
        }
        let Some(handle) = node.handle else {
            return UNKNOWN_SIZE;
        };
        match self.provider().metadata(&handle) {
            Ok(metadata) => i64::try_from(metadata.size).unwrap_or(i64::MAX),
            Err(e) => {
                warn!("Failed to stat {}: {}", handle, e);
                UNKNOWN_SIZE
            }
        }
    }

    /// Open `path` and hand back a raw descriptor, or `-1`.
    pub fn open_for_io(&self, path: &str, mode: &str) -> i32 {
        let mode = match mode.parse::<OpenMode>() {
            Ok(mode) => mode,
            Err(e) => {
                warn!("Refusing to open {}: {}", path, e);
                return INVALID_DESCRIPTOR;
            }
        };
        let Some(handle) = self.resolve(path).and_then(|node| node.handle) else {
            debug!("Cannot open {}: not found", path);
            return INVALID_DESCRIPTOR;
        };
        match self.provider().open_descriptor(&handle, mode) {
            Ok(fd) => fd,
            Err(e) => {
                warn!("Cannot open {}: {}", handle, e);
                INVALID_DESCRIPTOR
            }
        }
    }

    pub fn open_read(&self, path: &str) -> Option<Box<dyn Read + Send>> {
        let handle = self.resolve(path)?.handle?;
        self.provider()
            .open_read(&handle)
            .map_err(|e| warn!("Cannot read {}: {}", handle, e))
            .ok()
    }

    pub fn open_write(&self, path: &str, mode: OpenMode) -> Option<Box<dyn Write + Send>> {
        let handle = self.resolve(path)?.handle?;
        self.provider()
            .open_write(&handle, mode)
            .map_err(|e| warn!("Cannot write {}: {}", handle, e))
            .ok()
    }

    /// Child names of a directory, sorted; empty when `path` is not one.
    pub fn list_names(&self, path: &str) -> Vec<String> {
        match self.resolve(path) {
            Some(node) if node.is_directory => self
                .children(node.id)
                .into_iter()
                .map(|child| child.name)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Drop the cached listing below `path`. Returns whether it resolved.
    pub fn invalidate_path(&self, path: &str) -> bool {
        match self.resolve(path) {
            Some(node) => {
                self.invalidate(node.id);
                true
            }
            None => false,
        }
    }

    /// Create a file named `name` (percent-encoded names are decoded) in the
    /// directory at `parent_path`. Returns the existing node if one is there.
    pub fn create_file(&self, parent_path: &str, name: &str) -> Option<NodeInfo> {
        self.create_document(parent_path, name, false)
    }

    pub fn create_directory(&self, parent_path: &str, name: &str) -> Option<NodeInfo> {
        self.create_document(parent_path, name, true)
    }

    fn create_document(&self, parent_path: &str, name: &str, directory: bool) -> Option<NodeInfo> {
        let parent = self.resolve(parent_path).filter(|node| node.is_directory)?;
        let parent_handle = parent.handle?;

        let name = match urlencoding::decode(name) {
            Ok(decoded) => decoded.into_owned(),
            Err(e) => {
                warn!("Cannot decode document name {:?}: {}", name, e);
                return None;
            }
        };
        let mime_type = if directory {
            DIRECTORY_MIME_TYPE
        } else {
            mime_for_name(&name)
        };

        let handle = match self
            .provider()
            .create_document(&parent_handle, &name, mime_type)
        {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cannot create {:?} under {}: {}", name, parent_handle, e);
                return None;
            }
        };

        self.adopt(parent.id, name.clone(), handle, directory)
            .or_else(|| self.child(parent.id, &name).and_then(|id| self.node(id)))
    }
}
