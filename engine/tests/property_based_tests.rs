use engine::restore_points::files::clean_relative_path;
use engine::restore_points::state_paths::{
    build_restore_point_id_at, is_path_in_directory, is_trusted_restore_point_id,
    restore_point_id_millis,
};
use engine::restore_points::RestorePointEntry;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::path::PathBuf;

fn has_trusted_shape(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 23
        && id.starts_with("rp-")
        && bytes[3..16].iter().all(u8::is_ascii_digit)
        && bytes[16] == b'-'
        && bytes[17..]
            .iter()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

mod id_properties {
    use super::*;

    proptest! {
        #[test]
        fn test_only_the_exact_shape_is_trusted(id in "\\PC{0,30}") {
            prop_assert_eq!(is_trusted_restore_point_id(&id), has_trusted_shape(&id));
        }

        #[test]
        fn test_untrusted_ids_never_become_entries(id in "\\PC{0,30}") {
            prop_assume!(!has_trusted_shape(&id));
            let value = json!({ "id": id, "type": "manual", "sourceTheme": "nord" });
            prop_assert!(RestorePointEntry::from_value(&value).is_none());
            prop_assert!(RestorePointEntry::fallback_for_id(&id).is_none());
        }

        #[test]
        fn test_well_formed_ids_are_trusted(id in "rp-[0-9]{13}-[a-z0-9]{6}") {
            prop_assert!(is_trusted_restore_point_id(&id));
            let value = json!({ "id": id.clone() });
            let entry = RestorePointEntry::from_value(&value);
            prop_assert_eq!(entry.map(|e| e.id), Some(id));
        }

        #[test]
        fn test_generated_ids_encode_their_millis(
            millis in 1_000_000_000_000i64..9_999_999_999_999,
            seed in any::<u64>()
        ) {
            let id = build_restore_point_id_at(millis, &mut StdRng::seed_from_u64(seed));
            prop_assert!(is_trusted_restore_point_id(&id));
            prop_assert_eq!(restore_point_id_millis(&id), Some(millis));
        }
    }
}

mod containment_properties {
    use super::*;

    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-z0-9_]{1,8}", 1..6)
    }

    proptest! {
        #[test]
        fn test_paths_below_directory_are_inside(parts in segments()) {
            let root = PathBuf::from("/nonexistent-lastlayer/restore_points/rp-1700000000000-abc123");
            let path = parts.iter().fold(root.clone(), |p, s| p.join(s));
            prop_assert!(is_path_in_directory(&path, &root));
            prop_assert!(is_path_in_directory(&root, &root));
        }

        #[test]
        fn test_siblings_are_outside(parts in segments(), suffix in "[a-z0-9]{1,4}") {
            let root = PathBuf::from("/nonexistent-lastlayer/restore_points/rp-1700000000000-abc123");
            let sibling = PathBuf::from(format!("{}{}", root.display(), suffix));
            let path = parts.iter().fold(sibling, |p, s| p.join(s));
            prop_assert!(!is_path_in_directory(&path, &root));
        }

        #[test]
        fn test_dot_dot_segments_are_rejected(
            before in segments(),
            after in segments(),
            backslash in any::<bool>()
        ) {
            let separator = if backslash { "\\" } else { "/" };
            let raw = [before.join(separator), "..".to_string(), after.join(separator)].join(separator);
            prop_assert!(clean_relative_path(&raw).is_err());
        }

        #[test]
        fn test_clean_paths_have_no_edge_slashes(parts in segments()) {
            let raw = format!("//{}/", parts.join("\\"));
            let cleaned = clean_relative_path(&raw).unwrap();
            prop_assert_eq!(cleaned, parts.join("/"));
        }
    }
}
