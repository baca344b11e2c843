use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use docfs::transfer::{compress, compress_relative_to, extract, extract_file, never_cancel};
use docfs::{ArchiveOptions, DocumentTree, LocalProvider, TransferError, TransferOutcome};
use tempfile::TempDir;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn populate(root: &Path) {
    fs::create_dir_all(root.join("nand/user/save")).unwrap();
    fs::create_dir_all(root.join("sdmc/atmosphere")).unwrap();
    fs::write(root.join("nand/user/save/0001.bin"), vec![7u8; 4096]).unwrap();
    fs::write(root.join("sdmc/atmosphere/config.ini"), b"[exosphere]").unwrap();
    fs::write(root.join("profiles.dat"), b"profiles").unwrap();
}

fn files_below(root: &Path) -> Vec<(String, Vec<u8>)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (relative, fs::read(entry.path()).unwrap())
        })
        .collect()
}

#[test]
fn compressed_tree_extracts_to_identical_files() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("user");
    populate(&source);

    for options in [ArchiveOptions::default(), ArchiveOptions::store_only()] {
        let archive = temp.path().join("backup.zip");
        let sink = fs::File::create(&archive).unwrap();
        assert!(compress(&source, sink, options, never_cancel).is_completed());

        let restored = temp.path().join("restored");
        let _ = fs::remove_dir_all(&restored);
        let outcome = extract_file(&archive, &restored, never_cancel);
        assert!(outcome.is_completed(), "{:?}", outcome);
        assert_eq!(files_below(&source), files_below(&restored));
    }
}

#[test]
fn archive_of_a_subdirectory_keeps_its_prefix() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("user");
    populate(&root);

    let mut sink = Cursor::new(Vec::new());
    let outcome = compress_relative_to(
        &root.join("nand"),
        &root,
        &mut sink,
        ArchiveOptions::default(),
        never_cancel,
    );
    assert!(outcome.is_completed());

    sink.set_position(0);
    let restored = temp.path().join("restored");
    assert!(extract(sink, &restored, never_cancel).is_completed());
    assert!(restored.join("nand/user/save/0001.bin").is_file());
    assert!(!restored.join("profiles.dat").exists());
}

#[test]
fn zip_slip_entries_never_escape() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("nested/dest");

    for name in ["../../escaped.txt", "/abs.txt", "ok/../../escaped.txt"] {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(b"pwned").unwrap();
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);

        let outcome = extract(cursor, &dest, never_cancel);
        assert!(
            matches!(
                outcome,
                TransferOutcome::Failed(TransferError::PathTraversal { .. })
            ),
            "{}: {:?}",
            name,
            outcome
        );
    }
    assert!(!temp.path().join("escaped.txt").exists());
    assert!(!temp.path().join("nested/escaped.txt").exists());
}

#[test]
fn cancelled_compression_reports_cancelled() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("user");
    populate(&source);

    let mut seen = Vec::new();
    let outcome = compress(
        &source,
        Cursor::new(Vec::new()),
        ArchiveOptions::default(),
        |total, completed| {
            seen.push((total, completed));
            completed == 2
        },
    );
    assert!(outcome.is_cancelled());
    assert_eq!(seen, vec![(3, 0), (3, 1), (3, 2)]);
}

#[test]
fn extraction_through_a_bound_tree_needs_invalidation() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("user");
    populate(&source);
    let archive = temp.path().join("backup.zip");
    assert!(compress(
        &source,
        fs::File::create(&archive).unwrap(),
        ArchiveOptions::default(),
        never_cancel
    )
    .is_completed());

    let target = temp.path().join("target");
    fs::create_dir_all(&target).unwrap();
    let tree = DocumentTree::bound(
        Arc::new(LocalProvider::new()),
        LocalProvider::handle_for(&target).unwrap(),
    );
    assert!(tree.list_names("").is_empty());

    assert!(extract_file(&archive, &target, never_cancel).is_completed());
    assert!(!tree.exists("profiles.dat"));
    tree.invalidate(tree.root().unwrap().id);
    assert!(tree.exists("profiles.dat"));
    assert_eq!(tree.file_size("nand/user/save/0001.bin"), 4096);
}
