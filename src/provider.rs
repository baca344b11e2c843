//! Storage Provider Adapter
//!
//! Thin capability interface over backends that hand out opaque handles
//! instead of paths. One implementation is selected when a tree is bound.

pub mod contract;
pub mod local;
pub mod memory;

pub use contract::{is_tree_valid, DocumentEntry, DocumentMetadata, StorageProvider};
pub use local::LocalProvider;
pub use memory::MemoryProvider;
