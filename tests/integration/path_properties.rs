use std::sync::Arc;

use docfs::provider::MemoryProvider;
use docfs::tree::tokenize;
use docfs::DocumentTree;
use proptest::prelude::*;

fn separators() -> impl Strategy<Value = String> {
    "/{0,3}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tokenize_never_yields_empty_segments(path in "[a-z/]{0,24}") {
        for segment in tokenize(&path) {
            prop_assert!(!segment.is_empty());
            prop_assert!(!segment.contains('/'));
        }
    }

    #[test]
    fn redundant_separators_do_not_change_resolution(
        lead in separators(),
        mid in "/{1,4}",
        trail in separators(),
    ) {
        let provider = MemoryProvider::new();
        provider.add_file("nand/save.bin", b"x").unwrap();
        let tree = DocumentTree::bound(Arc::new(provider.clone()), provider.root_handle());

        let canonical = tree.resolve("nand/save.bin").unwrap();
        let noisy = format!("{}nand{}save.bin{}", lead, mid, trail);
        prop_assert_eq!(tree.resolve(&noisy).map(|node| node.id), Some(canonical.id));
    }

    #[test]
    fn unknown_names_always_miss(name in "[a-z]{1,12}") {
        prop_assume!(name != "nand");
        let provider = MemoryProvider::new();
        provider.add_directory("nand").unwrap();
        let tree = DocumentTree::bound(Arc::new(provider.clone()), provider.root_handle());

        prop_assert!(!tree.exists(&name));
        prop_assert_eq!(tree.filename(&name), name.clone());
    }
}
