//! Virtual Path Tree
//!
//! Lazily populated index mapping slash-delimited path segments to provider
//! handles. Directories are enumerated on first lookup and cached until the
//! node is invalidated or the tree is rebound.

mod document_tree;
pub mod node;
pub mod resolver;

pub use document_tree::DocumentTree;
pub use node::{NodeId, NodeInfo};
pub use resolver::{is_native_path, tokenize};
