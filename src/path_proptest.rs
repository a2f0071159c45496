//! Property-based tests for path, mount and type normalization.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::descriptor::AppType;
    use crate::mounts::{self, normalize, to_mapping};
    use crate::path::{contained_relative, normalize_relative, relative_to, slugify};
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};
    use std::path::PathBuf;

    // ============================================================================
    // normalize_relative property tests
    // ============================================================================

    proptest! {
        /// Property: normalizing twice is the same as normalizing once
        #[test]
        fn normalize_relative_is_idempotent(input in "[/ a-z0-9._-]{0,40}") {
            let once = normalize_relative(&input);
            prop_assert_eq!(normalize_relative(&once), once);
        }

        /// Property: the result never starts or ends with a slash
        #[test]
        fn normalize_relative_strips_slashes(input in "/{0,3}[a-z]{1,8}(/[a-z]{1,8}){0,3}/{0,3}") {
            let result = normalize_relative(&input);
            prop_assert!(!result.starts_with('/'));
            prop_assert!(!result.ends_with('/'));
            prop_assert!(!result.is_empty());
        }

        /// Property: an accepted contained path has no parent or current-dir part
        #[test]
        fn contained_relative_never_climbs(input in "[/a-z.]{0,24}") {
            if let Ok(path) = contained_relative(&input) {
                prop_assert!(path.split('/').all(|part| part != ".." && part != "."));
                prop_assert_eq!(contained_relative(&path), Ok(path.clone()));
            }
        }
    }

    // ============================================================================
    // slugify property tests
    // ============================================================================

    proptest! {
        /// Property: a slug is a single non-empty path component
        #[test]
        fn slugify_is_one_safe_component(input in ".*") {
            let slug = slugify(&input);
            prop_assert!(!slug.is_empty());
            prop_assert!(!slug.contains('/'));
            prop_assert!(!slug.contains('\\'));
            prop_assert!(slug != "." && slug != "..");
        }

        /// Property: already-safe ids are kept as they are
        #[test]
        fn slugify_preserves_safe_ids(input in "[a-zA-Z0-9_][a-zA-Z0-9_.]{0,20}") {
            prop_assume!(input != "." && input != "..");
            prop_assert_eq!(slugify(&input), input);
        }
    }

    // ============================================================================
    // relative_to property tests
    // ============================================================================

    proptest! {
        /// Property: base joined with the relative path names the target
        #[test]
        fn relative_to_rejoins(
            common in prop::collection::vec("[a-z]{1,6}", 0..3),
            target in prop::collection::vec("[a-z]{1,6}", 0..3),
            base in prop::collection::vec("[a-z]{1,6}", 0..3),
        ) {
            let root: PathBuf = std::iter::once("/".to_string()).chain(common).collect();
            let target_path: PathBuf = target.iter().fold(root.clone(), |p, c| p.join(c));
            let base_path: PathBuf = base.iter().fold(root.join("_base"), |p, c| p.join(c));

            let relative = relative_to(&target_path, &base_path);
            let mut resolved = base_path.clone();
            for component in relative.components() {
                match component {
                    std::path::Component::ParentDir => { resolved.pop(); }
                    std::path::Component::CurDir => {}
                    other => resolved.push(other.as_os_str()),
                }
            }
            prop_assert_eq!(resolved, target_path);
        }
    }

    // ============================================================================
    // AppType property tests
    // ============================================================================

    proptest! {
        /// Property: parsing splits at the first colon
        #[test]
        fn app_type_parse_splits(ecosystem in "[a-z]{1,10}", version in "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}") {
            let parsed = AppType::parse(&format!("{}:{}", ecosystem, version));
            prop_assert_eq!(parsed.version.as_deref(), Some(version.as_str()));
            if ecosystem != "hhvm" {
                prop_assert_eq!(&parsed.ecosystem, &ecosystem);
            }
        }

        /// Property: display and parse agree
        #[test]
        fn app_type_display_round_trips(raw in "[a-z]{1,10}(:[0-9.]{1,5})?") {
            let parsed = AppType::parse(&raw);
            prop_assert_eq!(AppType::parse(&parsed.to_string()), parsed);
        }
    }

    // ============================================================================
    // Mount normalization property tests
    // ============================================================================

    fn raw_mounts() -> impl Strategy<Value = Mapping> {
        prop::collection::btree_map(
            "/?[a-z]{1,6}(/[a-z]{1,6}){0,2}/?",
            prop_oneof![
                "[a-z]{1,8}".prop_map(|p| Value::from(format!("shared:files/{}", p))),
                "[a-z]{1,8}".prop_map(|p| {
                    let mut m = Mapping::new();
                    m.insert(Value::from("source"), Value::from("local"));
                    m.insert(Value::from("source_path"), Value::from(format!("/{}/", p)));
                    Value::Mapping(m)
                }),
                Just({
                    let mut m = Mapping::new();
                    m.insert(Value::from("source"), Value::from("tmp"));
                    Value::Mapping(m)
                }),
            ],
            0..6,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(k, v)| (Value::from(k), v))
                .collect::<Mapping>()
        })
    }

    proptest! {
        /// Property: normalizing a normalized table changes nothing
        #[test]
        fn mount_normalize_is_idempotent(raw in raw_mounts()) {
            let once = normalize(&raw).unwrap();
            let twice = normalize(&to_mapping(&once).unwrap()).unwrap();
            prop_assert_eq!(twice, once);
        }

        /// Property: every normalized key matches itself
        #[test]
        fn mount_keys_match_themselves(raw in raw_mounts()) {
            let normalized = normalize(&raw).unwrap();
            for key in normalized.keys() {
                let slashed = format!("/{}/", key);
                prop_assert_eq!(mounts::match_path(&slashed, &normalized).unwrap(), key.clone());
            }
        }
    }
}
