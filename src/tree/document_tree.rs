use super::node::{Arena, DocumentNode, NodeId, NodeInfo};
use crate::concurrency::PopulateLocks;
use crate::provider::StorageProvider;
use crate::types::Handle;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lazily populated tree of provider documents.
///
/// The tree is safe to share between threads. Enumeration of a directory is
/// single-flight: concurrent lookups through the same unloaded directory
/// block on its population lock and then see the loaded children. Provider
/// calls never run while the arena lock is held.
pub struct DocumentTree {
    provider: Arc<dyn StorageProvider>,
    arena: RwLock<Arena>,
    populate_locks: PopulateLocks,
}

impl DocumentTree {
    /// Create an unbound tree; every lookup misses until `bind` is called.
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            provider,
            arena: RwLock::new(Arena::default()),
            populate_locks: PopulateLocks::new(),
        }
    }

    /// Create a tree already bound to `root`.
    pub fn bound(provider: Arc<dyn StorageProvider>, root: Handle) -> Self {
        let tree = Self::new(provider);
        tree.bind(root);
        tree
    }

    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    /// Replace the tree with a fresh, unloaded root bound to `root`.
    ///
    /// Every previously issued `NodeId` goes stale.
    pub fn bind(&self, root: Handle) {
        debug!("Binding {} tree to {}", self.provider.kind(), root);
        let mut arena = self.arena.write();
        arena.reset(root);
        self.populate_locks.clear();
    }

    pub fn root(&self) -> Option<NodeInfo> {
        let arena = self.arena.read();
        arena.root().and_then(|id| arena.info(id))
    }

    pub fn node(&self, id: NodeId) -> Option<NodeInfo> {
        self.arena.read().info(id)
    }

    /// Number of nodes currently cached, root included.
    pub fn cached_nodes(&self) -> usize {
        self.arena.read().len()
    }

    /// Make sure the children of `id` have been fetched.
    ///
    /// Enumerates an unloaded directory through the provider exactly once;
    /// repeated calls are no-ops. A provider failure is logged and leaves the
    /// node unloaded with no children, so lookups through it miss. Returns
    /// whether the node is loaded afterwards.
    pub fn ensure_loaded(&self, id: NodeId) -> bool {
        {
            let arena = self.arena.read();
            match arena.get(id) {
                None => return false,
                Some(node) if node.loaded || !node.is_directory => return node.loaded,
                Some(_) => {}
            }
        }

        let lock = self.populate_locks.lock_for(id);
        let _guard = lock.lock();

        // Another thread may have finished populating while we waited.
        let handle = {
            let arena = self.arena.read();
            match arena.get(id) {
                None => return false,
                Some(node) if node.loaded => return true,
                Some(node) => match &node.handle {
                    Some(handle) => handle.clone(),
                    None => return false,
                },
            }
        };

        let entries = match self.provider.children(&handle) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to enumerate {}: {}", handle, e);
                return false;
            }
        };

        let mut arena = self.arena.write();
        // A concurrent bind or invalidate may have freed the node.
        if arena.get(id).is_none() {
            return false;
        }
        let count = entries.len();
        for entry in entries {
            let name = entry.metadata.name.clone();
            if arena
                .insert_child(id, DocumentNode::from_entry(entry, id))
                .is_none()
            {
                debug!("Skipping duplicate entry {:?} under {}", name, handle);
            }
        }
        if let Some(node) = arena.get_mut(id) {
            node.loaded = true;
        }
        debug!("Loaded {} entries under {}", count, handle);
        true
    }

    /// Look up the direct child `name` of `parent`, loading the parent first.
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.ensure_loaded(parent);
        let arena = self.arena.read();
        arena.get(parent)?.children.get(name).copied()
    }

    /// Children of `id`, loading it first, sorted by name.
    pub fn children(&self, id: NodeId) -> Vec<NodeInfo> {
        self.ensure_loaded(id);
        let arena = self.arena.read();
        let Some(node) = arena.get(id) else {
            return Vec::new();
        };
        let mut children: Vec<NodeInfo> = node
            .children
            .values()
            .filter_map(|child| arena.info(*child))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        children
    }

    /// Drop the cached children of `id` so the next lookup re-enumerates.
    ///
    /// The cache never expires on its own; this is the only way to pick up
    /// changes made behind the tree's back. Ids of the dropped descendants
    /// go stale.
    pub fn invalidate(&self, id: NodeId) {
        let freed = self.arena.write().clear_children(id);
        debug!("Invalidated node, {} descendants dropped", freed.len());
        self.populate_locks.release(&freed);
    }

    /// Register a document the tree created itself under a loaded parent.
    /// Returns `None` when the parent is gone or not loaded yet.
    pub(crate) fn adopt(
        &self,
        parent: NodeId,
        name: String,
        handle: Handle,
        is_directory: bool,
    ) -> Option<NodeInfo> {
        let mut arena = self.arena.write();
        let parent_node = arena.get(parent)?;
        if let Some(existing) = parent_node.children.get(&name).copied() {
            return arena.info(existing);
        }
        if !parent_node.loaded {
            // The parent's first enumeration will pick it up.
            return None;
        }
        let node = DocumentNode {
            name,
            handle: Some(handle),
            is_directory,
            loaded: !is_directory,
            children: Default::default(),
            parent: Some(parent),
        };
        let id = arena.insert_child(parent, node)?;
        arena.info(id)
    }
}
