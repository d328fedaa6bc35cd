//! Storage key derivation
//!
//! Keys are 32 bytes from the operating system CSPRNG, encoded as URL-safe
//! base64 without padding, followed by an extension taken from the declared
//! media type. Placement under an aspect folder happens in [`locator_for`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::TryRngCore;
use reelvault_core::{AspectClass, StorageKey, StorageLocator};

/// Number of random bytes in every key.
pub const KEY_ENTROPY_BYTES: usize = 32;

/// Extension for a declared media type: `video/mp4` -> `.mp4`.
///
/// Anything that is not exactly `type/subtype` maps to `.bin`.
pub fn media_type_to_ext(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    if parts.len() != 2 {
        return ".bin".to_string();
    }
    format!(".{}", parts[1])
}

/// Derive a fresh, unguessable storage key for an object of `media_type`.
///
/// # Panics
///
/// Panics if the OS entropy source fails. There is no fallback source.
pub fn derive_storage_key(media_type: &str) -> StorageKey {
    let mut bytes = [0u8; KEY_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .unwrap_or_else(|e| panic!("OS entropy source failed while deriving storage key: {e}"));

    let encoded = URL_SAFE_NO_PAD.encode(bytes);
    StorageKey::new(format!("{}{}", encoded, media_type_to_ext(media_type)))
}

/// Place a key under the folder for its aspect class.
pub fn locator_for(class: AspectClass, key: &StorageKey) -> StorageLocator {
    StorageLocator::for_class(class, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_media_type_to_ext() {
        assert_eq!(media_type_to_ext("video/mp4"), ".mp4");
        assert_eq!(media_type_to_ext("video/quicktime"), ".quicktime");
        assert_eq!(media_type_to_ext("mp4"), ".bin");
        assert_eq!(media_type_to_ext("video/mp4/extra"), ".bin");
        assert_eq!(media_type_to_ext(""), ".bin");
    }

    #[test]
    fn test_key_shape() {
        let key = derive_storage_key("video/mp4");
        let (encoded, ext) = key.as_str().split_at(43);
        assert_eq!(ext, ".mp4");
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(URL_SAFE_NO_PAD.decode(encoded).unwrap().len(), 32);
    }

    #[test]
    fn test_keys_are_distinct() {
        let keys: HashSet<String> = (0..10_000)
            .map(|_| derive_storage_key("video/mp4").as_str().to_string())
            .collect();
        assert_eq!(keys.len(), 10_000);
    }

    #[test]
    fn test_locator_for_class() {
        let key = StorageKey::new("k.mp4");
        assert_eq!(locator_for(AspectClass::Portrait, &key).as_str(), "portrait/k.mp4");
    }
}
