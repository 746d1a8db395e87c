//! Property-based tests for storage key allocation.
//!
//! - Allocated keys always sit under the requested prefix
//! - The key body always has the `hex4/hex4/hex4-millis` shape

use proptest::prelude::*;

use super::path::allocate;

fn is_hex4(s: &str) -> bool {
    s.len() == 4 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

proptest! {
    #[test]
    fn prop_key_under_prefix(prefix in "([a-z0-9]{1,8}/){0,3}") {
        let key = allocate(&prefix);
        prop_assert!(key.starts_with(&prefix));
        prop_assert!(!key.starts_with('/'));
    }

    #[test]
    fn prop_key_body_shape(prefix in "([a-z]{1,5}/){0,2}") {
        let key = allocate(&prefix);
        let body = &key[prefix.len()..];
        let parts: Vec<&str> = body.split('/').collect();
        prop_assert_eq!(parts.len(), 3);
        prop_assert!(is_hex4(parts[0]));
        prop_assert!(is_hex4(parts[1]));

        let (segment, millis) = parts[2].split_once('-').expect("timestamp suffix");
        prop_assert!(is_hex4(segment));
        let millis: i64 = millis.parse().expect("numeric timestamp");
        prop_assert!(millis > 0);
    }

    #[test]
    fn prop_consecutive_keys_differ(prefix in "[a-z]{0,6}") {
        let prefix = if prefix.is_empty() { prefix } else { format!("{prefix}/") };
        prop_assert_ne!(allocate(&prefix), allocate(&prefix));
    }
}
