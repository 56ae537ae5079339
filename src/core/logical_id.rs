//! BLAKE3 addressing: logical ids for tree paths and template fingerprints.

/// Hex digits of the path hash appended to every logical id.
const SUFFIX_LEN: usize = 8;

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

/// Logical id for a node path.
///
/// Path components are stripped to ASCII alphanumerics and concatenated,
/// then suffixed with the first eight upper-case hex digits of the BLAKE3
/// hash of the full path. Distinct paths that sanitize to the same prefix
/// still get distinct ids.
pub fn logical_id(path: &str) -> String {
    let readable: String = path
        .split('/')
        .flat_map(|component| component.chars().filter(char::is_ascii_alphanumeric))
        .collect();
    let digest = blake3::hash(path.as_bytes()).to_hex();
    let suffix = digest[..SUFFIX_LEN].to_ascii_uppercase();
    format!("{}{}", readable, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_string_prefix() {
        let h = hash_string("hello");
        assert!(h.starts_with("blake3:"));
        assert_eq!(h.len(), "blake3:".len() + 64);
        assert_eq!(h, hash_string("hello"));
        assert_ne!(h, hash_string("hello!"));
    }

    #[test]
    fn test_logical_id_shape() {
        let id = logical_id("Stack/ebs-csi/Role");
        assert!(id.starts_with("StackebscsiRole"));
        assert_eq!(id.len(), "StackebscsiRole".len() + SUFFIX_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_logical_id_distinguishes_sanitized_collisions() {
        assert_ne!(logical_id("A/b-c"), logical_id("A/bc"));
        assert_ne!(logical_id("Ab/c"), logical_id("A/bc"));
    }

    proptest! {
        #[test]
        fn prop_logical_id_alphanumeric_and_stable(path in "[A-Za-z0-9/_-]{1,40}") {
            let id = logical_id(&path);
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
            prop_assert_eq!(id, logical_id(&path));
        }
    }
}
