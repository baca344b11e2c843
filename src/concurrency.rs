//! Single-flight directory population
//!
//! Provides per-node mutexes so that concurrent resolvers walking through the
//! same unloaded directory enumerate it once: the first caller populates the
//! node while the others block, then observe it as loaded.

use crate::tree::NodeId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-node population lock registry
///
/// Locks are created on demand and dropped when their node is freed, so the
/// registry never outgrows the live part of the tree.
pub struct PopulateLocks {
    /// Map from node to its population mutex
    locks: RwLock<HashMap<NodeId, Arc<Mutex<()>>>>,
}

impl PopulateLocks {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create the population lock for a node
    pub fn lock_for(&self, node: NodeId) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(&node) {
                return lock.clone();
            }
        }

        // Another thread may have inserted it between the two guards.
        let mut map = self.locks.write();
        map.entry(node)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Forget the locks of freed nodes.
    pub fn release(&self, nodes: &[NodeId]) {
        if nodes.is_empty() {
            return;
        }
        let mut map = self.locks.write();
        for node in nodes {
            map.remove(node);
        }
    }

    /// Forget every lock (the tree was rebound).
    pub fn clear(&self) {
        self.locks.write().clear();
    }

    pub fn len(&self) -> usize {
        self.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PopulateLocks {
    fn default() -> Self {
        Self::new()
    }
}
