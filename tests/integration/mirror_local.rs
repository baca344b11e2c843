use std::fs;
use std::sync::Arc;

use docfs::provider::{LocalProvider, MemoryProvider};
use docfs::transfer::{copy_document, mirror_tree, never_cancel};
use docfs::{DocumentTree, TransferError};
use tempfile::TempDir;

fn provider() -> MemoryProvider {
    let provider = MemoryProvider::new();
    provider.add_file("games/0100/update.nsp", b"update").unwrap();
    provider.add_file("games/0100/dlc/a.nsp", b"dlc").unwrap();
    provider.add_file("games/readme.txt", b"readme").unwrap();
    provider.add_directory("games/empty").unwrap();
    provider
}

#[test]
fn tree_mirror_copies_every_entry() {
    let provider = provider();
    let tree = DocumentTree::bound(Arc::new(provider.clone()), provider.root_handle());
    let temp = TempDir::new().unwrap();

    let mut totals = Vec::new();
    let outcome = tree.mirror("games", temp.path(), |total, _| {
        totals.push(total);
        false
    });
    assert!(outcome.is_completed(), "{:?}", outcome);
    // 0100, 0100/dlc, a.nsp, update.nsp, empty, readme.txt
    assert_eq!(totals, vec![6; 6]);
    assert_eq!(fs::read(temp.path().join("0100/dlc/a.nsp")).unwrap(), b"dlc");
    assert_eq!(fs::read(temp.path().join("readme.txt")).unwrap(), b"readme");
    assert!(temp.path().join("empty").is_dir());
}

#[test]
fn mirror_overwrites_existing_files() {
    let provider = provider();
    let tree = DocumentTree::bound(Arc::new(provider.clone()), provider.root_handle());
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("readme.txt"), b"an older and longer readme").unwrap();

    assert!(tree.mirror("games", temp.path(), never_cancel).is_completed());
    assert_eq!(fs::read(temp.path().join("readme.txt")).unwrap(), b"readme");
}

#[test]
fn mirror_of_missing_path_fails_not_found() {
    let provider = provider();
    let tree = DocumentTree::bound(Arc::new(provider.clone()), provider.root_handle());
    let temp = TempDir::new().unwrap();

    let outcome = tree.mirror("games/missing", temp.path(), never_cancel);
    assert!(matches!(
        outcome.error(),
        Some(TransferError::NotFound { .. })
    ));
}

#[test]
fn mirror_between_local_directories() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("source");
    fs::create_dir_all(source.join("a/b")).unwrap();
    fs::write(source.join("a/b/c.txt"), b"c").unwrap();

    let local = LocalProvider::new();
    let handle = LocalProvider::handle_for(&source).unwrap();
    let dest = temp.path().join("dest");
    assert!(mirror_tree(&local, &handle, &dest, never_cancel).is_completed());
    assert_eq!(fs::read(dest.join("a/b/c.txt")).unwrap(), b"c");
}

#[test]
fn copy_document_into_local_storage() {
    let provider = provider();
    let tree = DocumentTree::bound(Arc::new(provider.clone()), provider.root_handle());
    let handle = tree.resolve("games/0100/update.nsp").unwrap().handle.unwrap();
    let temp = TempDir::new().unwrap();

    let copied = copy_document(&provider, &handle, &temp.path().join("cache"), None).unwrap();
    assert_eq!(copied, temp.path().join("cache/update.nsp"));
    assert_eq!(fs::read(&copied).unwrap(), b"update");
}
