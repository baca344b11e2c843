use std::io::{Read, Write};
use std::sync::{Arc, Barrier};
use std::thread;

use docfs::provider::{is_tree_valid, LocalProvider, MemoryProvider, StorageProvider};
use docfs::tree::resolver::{INVALID_DESCRIPTOR, UNKNOWN_SIZE};
use docfs::{DocumentTree, OpenMode};
use tempfile::TempDir;

fn emulator_tree() -> (MemoryProvider, DocumentTree) {
    let provider = MemoryProvider::new();
    provider
        .add_file("nand/user/save/0000000000000001/data.bin", b"0123456789")
        .unwrap();
    provider.add_file("keys/prod.keys", b"key = value").unwrap();
    provider.add_file("config/Settings.INI", b"[ui]").unwrap();
    provider.add_directory("load").unwrap();
    let tree = DocumentTree::bound(Arc::new(provider.clone()), provider.root_handle());
    (provider, tree)
}

#[test]
fn lookups_answer_with_sentinels_instead_of_errors() {
    let (_provider, tree) = emulator_tree();

    assert!(tree.exists("keys/prod.keys"));
    assert!(!tree.exists("keys/title.keys"));
    assert!(tree.is_directory("nand/user"));
    assert!(!tree.is_directory("keys/prod.keys"));
    assert!(!tree.is_directory("missing"));

    assert_eq!(tree.filename("config/Settings.INI"), "Settings.INI");
    assert_eq!(tree.filename("config/missing.ini"), "config/missing.ini");
    assert_eq!(tree.extension("config/Settings.INI"), "ini");

    assert_eq!(tree.file_size("nand/user/save/0000000000000001/data.bin"), 10);
    assert_eq!(tree.file_size("load"), 0);
    assert_eq!(tree.file_size("nope"), UNKNOWN_SIZE);

    assert_eq!(tree.list_names(""), vec!["config", "keys", "load", "nand"]);
    assert!(tree.list_names("keys/prod.keys").is_empty());
}

#[test]
fn redundant_separators_resolve_to_the_same_node() {
    let (_provider, tree) = emulator_tree();
    let plain = tree.resolve("keys/prod.keys").unwrap();
    assert_eq!(tree.resolve("/keys/prod.keys").unwrap().id, plain.id);
    assert_eq!(tree.resolve("//keys///prod.keys/").unwrap().id, plain.id);
    assert_eq!(tree.resolve("/").unwrap().id, tree.root().unwrap().id);
}

#[test]
fn parent_directory_reports_handles() {
    let (provider, tree) = emulator_tree();
    let keys = tree.resolve("keys").unwrap().handle.unwrap();
    assert_eq!(tree.parent_directory("keys/prod.keys"), keys.to_string());
    assert_eq!(
        tree.parent_directory("keys"),
        provider.root_handle().to_string()
    );
    assert_eq!(tree.parent_directory("keys/none"), "keys/none");
}

#[test]
fn repeated_lookups_hit_the_cache() {
    let (provider, tree) = emulator_tree();
    assert!(tree.exists("nand/user/save/0000000000000001/data.bin"));
    let after_first = provider.enumeration_count();
    for _ in 0..10 {
        assert!(tree.exists("nand/user/save/0000000000000001/data.bin"));
        assert!(tree.exists("nand/user"));
    }
    assert_eq!(provider.enumeration_count(), after_first);
}

#[test]
fn cache_is_stale_until_invalidated() {
    let (provider, tree) = emulator_tree();
    assert!(!tree.exists("load/mod.bin"));

    provider.add_file("load/mod.bin", b"mod").unwrap();
    assert!(!tree.exists("load/mod.bin"));

    assert!(tree.invalidate_path("load"));
    assert!(tree.exists("load/mod.bin"));
}

#[test]
fn revoked_provider_degrades_to_misses() {
    let (provider, tree) = emulator_tree();
    provider.set_available(false);

    assert!(!tree.exists("keys/prod.keys"));
    assert_eq!(tree.file_size("keys/prod.keys"), UNKNOWN_SIZE);
    assert!(tree.list_names("").is_empty());
    assert!(!is_tree_valid(&provider, &provider.root_handle()));

    // Failed enumeration leaves the directory unloaded, so access comes back.
    provider.set_available(true);
    assert!(tree.exists("keys/prod.keys"));
}

#[test]
fn created_documents_are_visible_without_invalidation() {
    let (provider, tree) = emulator_tree();
    assert!(tree.exists("keys"));

    let created = tree.create_file("keys", "title%20keys.txt").unwrap();
    assert_eq!(created.name, "title keys.txt");
    assert!(tree.exists("keys/title keys.txt"));

    let again = tree.create_file("keys", "title keys.txt").unwrap();
    assert_eq!(again.id, created.id);
    assert_eq!(
        provider
            .metadata(created.handle.as_ref().unwrap())
            .unwrap()
            .mime_type,
        "text/plain"
    );

    let dir = tree.create_directory("", "shader").unwrap();
    assert!(dir.is_directory);
    assert!(tree.is_directory("shader"));
    assert!(tree.create_file("missing", "a.bin").is_none());
}

#[test]
fn streams_write_then_read_back() {
    let (_provider, tree) = emulator_tree();
    {
        let mut writer = tree
            .open_write("keys/prod.keys", OpenMode::WriteAppend)
            .unwrap();
        writer.write_all(b"\nmore = keys").unwrap();
        writer.flush().unwrap();
    }
    let mut contents = String::new();
    tree.open_read("keys/prod.keys")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "key = value\nmore = keys");
    assert!(tree.open_write("keys/prod.keys", OpenMode::Read).is_none());
}

#[test]
fn descriptors_depend_on_the_provider() {
    let (_provider, tree) = emulator_tree();
    assert_eq!(tree.open_for_io("keys/prod.keys", "r"), INVALID_DESCRIPTOR);
    assert_eq!(tree.open_for_io("keys/prod.keys", "x"), INVALID_DESCRIPTOR);

    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("rom.xci"), b"rom").unwrap();
    let local = DocumentTree::bound(
        Arc::new(LocalProvider::new()),
        LocalProvider::handle_for(temp.path()).unwrap(),
    );
    assert_eq!(local.open_for_io("missing.xci", "r"), INVALID_DESCRIPTOR);
    assert_eq!(local.open_for_io("rom.xci", "bogus"), INVALID_DESCRIPTOR);

    #[cfg(unix)]
    {
        use std::os::unix::io::FromRawFd;
        let fd = local.open_for_io("rom.xci", "r");
        assert!(fd >= 0);
        let mut file = unsafe { std::fs::File::from_raw_fd(fd) };
        let mut contents = String::new();
        file.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "rom");
    }
}

#[test]
fn concurrent_resolution_enumerates_each_directory_once() {
    let (provider, tree) = emulator_tree();
    let tree = Arc::new(tree);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let tree = Arc::clone(&tree);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                tree.exists("nand/user/save/0000000000000001/data.bin")
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
    // root, nand, user, save, 0000000000000001
    assert_eq!(provider.enumeration_count(), 5);
}

#[test]
fn rebinding_drops_the_cache() {
    let (provider, tree) = emulator_tree();
    let keys = tree.resolve("keys").unwrap();

    let other = provider.add_directory("other/root").unwrap();
    provider.add_file("other/root/inner.txt", b"x").unwrap();
    tree.bind(other);

    assert!(tree.node(keys.id).is_none());
    assert!(tree.exists("inner.txt"));
    assert!(!tree.exists("keys"));
}
