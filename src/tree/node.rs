//! Tree nodes and the slot arena that owns them

use crate::provider::DocumentEntry;
use crate::types::Handle;
use std::collections::HashMap;

/// Index of a node in the arena, tagged with the slot generation.
///
/// Ids outlive the nodes they name: once a slot is freed its generation
/// moves on and the old id stops resolving instead of aliasing a new node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// One path segment in the tree.
#[derive(Debug, Clone)]
pub(crate) struct DocumentNode {
    pub name: String,
    /// Only the root may lack a handle.
    pub handle: Option<Handle>,
    pub is_directory: bool,
    pub loaded: bool,
    pub children: HashMap<String, NodeId>,
    /// Non-owning back reference; the arena owns every node.
    pub parent: Option<NodeId>,
}

impl DocumentNode {
    pub fn root(handle: Handle) -> Self {
        Self {
            name: String::new(),
            handle: Some(handle),
            is_directory: true,
            loaded: false,
            children: HashMap::new(),
            parent: None,
        }
    }

    /// Child built from an enumeration entry. Files have nothing to defer and
    /// start out loaded.
    pub fn from_entry(entry: DocumentEntry, parent: NodeId) -> Self {
        let is_directory = entry.metadata.is_directory();
        Self {
            name: entry.metadata.name,
            handle: Some(entry.handle),
            is_directory,
            loaded: !is_directory,
            children: HashMap::new(),
            parent: Some(parent),
        }
    }
}

/// Read-only snapshot of a node handed out by lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub handle: Option<Handle>,
    pub is_directory: bool,
    pub loaded: bool,
    pub parent: Option<NodeId>,
}

impl NodeInfo {
    fn snapshot(id: NodeId, node: &DocumentNode) -> Self {
        Self {
            id,
            name: node.name.clone(),
            handle: node.handle.clone(),
            is_directory: node.is_directory,
            loaded: node.loaded,
            parent: node.parent,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<DocumentNode>,
}

/// Generational slot arena holding one tree.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Option<NodeId>,
}

impl Arena {
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&DocumentNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut DocumentNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn info(&self, id: NodeId) -> Option<NodeInfo> {
        self.get(id).map(|node| NodeInfo::snapshot(id, node))
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    fn alloc(&mut self, node: DocumentNode) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        }
    }

    fn free_slot(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            if slot.generation == id.generation && slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    /// Drop every node and install a fresh root bound to `handle`.
    pub fn reset(&mut self, handle: Handle) -> NodeId {
        let live: Vec<NodeId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.node.is_some())
            .map(|(index, slot)| NodeId::new(index as u32, slot.generation))
            .collect();
        for id in live {
            self.free_slot(id);
        }
        let root = self.alloc(DocumentNode::root(handle));
        self.root = Some(root);
        root
    }

    /// Insert a child under `parent`. Returns `None` (and inserts nothing)
    /// when the parent is gone or already has a child with that name.
    pub fn insert_child(&mut self, parent: NodeId, node: DocumentNode) -> Option<NodeId> {
        let name = node.name.clone();
        match self.get(parent) {
            Some(p) if !p.children.contains_key(&name) => {}
            _ => return None,
        }
        let id = self.alloc(node);
        if let Some(p) = self.get_mut(parent) {
            p.children.insert(name, id);
        }
        Some(id)
    }

    /// Free every descendant of `id` and mark it unloaded. Returns the freed
    /// ids.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut pending: Vec<NodeId> = match self.get_mut(id) {
            Some(node) => {
                if node.is_directory {
                    node.loaded = false;
                }
                node.children.drain().map(|(_, child)| child).collect()
            }
            None => return Vec::new(),
        };

        let mut freed = Vec::new();
        while let Some(child) = pending.pop() {
            if let Some(node) = self.get_mut(child) {
                pending.extend(node.children.drain().map(|(_, c)| c));
            }
            self.free_slot(child);
            freed.push(child);
        }
        freed
    }
}
