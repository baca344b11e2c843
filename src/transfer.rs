//! Archive Transfer Engine
//!
//! Streams zip archives in and out of storage and mirrors provider subtrees
//! onto local storage. All transfers are synchronous, report progress once
//! per unit of work (one entry or one file), and stop between units when the
//! progress callback asks them to.

pub mod compress;
pub mod extract;
pub mod mirror;
pub mod progress;

pub use compress::{compress, compress_relative_to, ArchiveOptions};
pub use extract::{extract, extract_file};
pub use mirror::{copy_document, mirror_tree};
pub use progress::{never_cancel, ProgressTracker, TransferOutcome, TransferProgress};
