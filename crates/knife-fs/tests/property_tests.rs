use knife_fs::{EntryPath, FilePattern};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_entry_path_normalization_invariants(s in "\\PC*") {
        let path = EntryPath::new(&s);
        let as_str = path.as_str();

        prop_assert!(as_str.starts_with('/'));
        prop_assert!(!as_str.contains('\\'));
        prop_assert!(!as_str.contains("//"));
        prop_assert!(path.is_root() || !as_str.ends_with('/'));

        // Normalizing twice changes nothing
        prop_assert_eq!(EntryPath::new(as_str), path.clone());
    }

    #[test]
    fn test_parent_join_roundtrip(segments in prop::collection::vec("[a-z0-9_]{1,8}(\\.json)?", 1..5)) {
        let path = EntryPath::new(segments.join("/"));
        let parent = path.parent().unwrap();
        prop_assert_eq!(parent.join(path.name()), path.clone());
        prop_assert!(path.starts_with(&parent));
        prop_assert_eq!(path.depth(), segments.len());
    }

    #[test]
    fn test_exact_pattern_matches_only_its_own_path(
        segments in prop::collection::vec("[a-z0-9_]{1,8}(\\.json)?", 0..5),
        other in "[a-z0-9_]{1,8}",
    ) {
        let text = format!("/{}", segments.join("/"));
        let pattern = FilePattern::new(&text).unwrap();
        let path = EntryPath::new(&text);

        prop_assert!(pattern.is_exact());
        prop_assert_eq!(pattern.exact_path(), Some(path.clone()));
        prop_assert!(pattern.matches(&path));
        prop_assert!(!pattern.matches(&path.join(&other)));
        prop_assert!(!pattern.could_match_children(&path));
    }

    #[test]
    fn test_globstar_matches_every_descendant(
        prefix in "[a-z]{1,6}",
        rest in prop::collection::vec("[a-z0-9_]{1,8}", 0..4),
    ) {
        let pattern = FilePattern::new(&format!("/{prefix}/**")).unwrap();
        let mut path = EntryPath::root().join(&prefix);
        prop_assert!(pattern.matches(&path));
        for segment in &rest {
            prop_assert!(pattern.could_match_children(&path));
            path = path.join(segment);
            prop_assert!(pattern.matches(&path));
        }
    }
}
