//! Persisted locator codec
//!
//! A video record stores where its object lives as a single string field,
//! `{store_id},{locator}`. Records written before locators existed hold a
//! plain URL in the same field, so decoding never fails: anything that is not
//! exactly two fields comes back as [`DecodedLocator::Unsignable`].

use reelvault_core::constants::LOCATOR_SEPARATOR;
use reelvault_core::StorageLocator;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("Store identifier must not be empty")]
    EmptyStoreId,

    #[error("Locator must not be empty")]
    EmptyLocator,

    #[error("'{0}' contains the locator separator '{sep}'", sep = LOCATOR_SEPARATOR)]
    ContainsSeparator(String),
}

/// Store identifier plus the object's locator inside that store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLocator {
    store_id: String,
    locator: StorageLocator,
}

impl PersistedLocator {
    pub fn new(store_id: impl Into<String>, locator: StorageLocator) -> Result<Self, LocatorError> {
        let store_id = store_id.into();
        if store_id.is_empty() {
            return Err(LocatorError::EmptyStoreId);
        }
        if locator.as_str().is_empty() {
            return Err(LocatorError::EmptyLocator);
        }
        for part in [store_id.as_str(), locator.as_str()] {
            if part.contains(LOCATOR_SEPARATOR) {
                return Err(LocatorError::ContainsSeparator(part.to_string()));
            }
        }
        Ok(Self { store_id, locator })
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn locator(&self) -> &StorageLocator {
        &self.locator
    }

    /// Serialize into the single persisted field.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.store_id, LOCATOR_SEPARATOR, self.locator)
    }

    /// Parse a persisted field. Never fails.
    pub fn decode(field: &str) -> DecodedLocator {
        let parts: Vec<&str> = field.split(LOCATOR_SEPARATOR).collect();
        match parts.as_slice() {
            [store_id, locator] => DecodedLocator::Signable(PersistedLocator {
                store_id: store_id.to_string(),
                locator: StorageLocator::from_raw(*locator),
            }),
            _ => DecodedLocator::Unsignable(field.to_string()),
        }
    }
}

/// Result of decoding a persisted field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedLocator {
    Signable(PersistedLocator),
    /// Pass-through value, returned to readers as is.
    Unsignable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(s: &str) -> StorageLocator {
        StorageLocator::from_raw(s)
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let persisted = PersistedLocator::new("videos-bucket", locator("landscape/abc.mp4")).unwrap();
        let encoded = persisted.encode();
        assert_eq!(encoded, "videos-bucket,landscape/abc.mp4");
        assert_eq!(
            PersistedLocator::decode(&encoded),
            DecodedLocator::Signable(persisted.clone())
        );
        match PersistedLocator::decode(&encoded) {
            DecodedLocator::Signable(decoded) => assert_eq!(decoded.encode(), encoded),
            other => panic!("expected signable, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_field_count_is_unsignable() {
        for field in [
            "https://cdn.example.com/video.mp4",
            "",
            "a,b,c",
            "bucket,landscape/k.mp4,extra",
        ] {
            assert_eq!(
                PersistedLocator::decode(field),
                DecodedLocator::Unsignable(field.to_string())
            );
        }
    }

    #[test]
    fn test_construction_rejects_separator() {
        assert_eq!(
            PersistedLocator::new("bad,store", locator("other/k.bin")),
            Err(LocatorError::ContainsSeparator("bad,store".to_string()))
        );
        assert!(PersistedLocator::new("store", locator("other/a,b")).is_err());
        assert_eq!(
            PersistedLocator::new("", locator("other/k.bin")),
            Err(LocatorError::EmptyStoreId)
        );
        assert_eq!(
            PersistedLocator::new("store", locator("")),
            Err(LocatorError::EmptyLocator)
        );
    }
}
