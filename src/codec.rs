//! JSON codec between typed records and storage entries.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::StorageEntry;

/// Error type for record encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Value could not be serialized.
    #[error("failed to encode entry {key:?}: {source}")]
    Encode {
        /// Target storage key.
        key: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },
    /// Stored bytes are not a valid record.
    #[error("failed to decode entry {key:?}: {source}")]
    Decode {
        /// Source storage key.
        key: String,
        /// Underlying deserializer error.
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize a value into a storage entry under `key`.
pub fn encode_entry<T: Serialize>(key: impl Into<String>, value: &T) -> Result<StorageEntry, CodecError> {
    let key = key.into();
    match serde_json::to_vec(value) {
        Ok(bytes) => Ok(StorageEntry::new(key, bytes)),
        Err(source) => Err(CodecError::Encode { key, source }),
    }
}

/// Deserialize the value of a storage entry.
pub fn decode_entry<T: DeserializeOwned>(entry: &StorageEntry) -> Result<T, CodecError> {
    serde_json::from_slice(&entry.value).map_err(|source| CodecError::Decode {
        key: entry.key.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserEntry;

    #[test]
    fn test_encode_user_entry() {
        let entry = UserEntry::new(["ops".to_string()].into_iter().collect());
        let stored = encode_entry("user/alice", &entry).unwrap();

        assert_eq!(stored.key, "user/alice");
        assert_eq!(stored.value, br#"{"Policies":["ops"]}"#.to_vec());
    }

    #[test]
    fn test_decode_user_entry() {
        let stored = StorageEntry::new("user/bob", br#"{"Policies":["b","a"]}"#.to_vec());
        let entry: UserEntry = decode_entry(&stored).unwrap();
        assert_eq!(entry.policy_list(), vec!["a", "b"]);
    }

    #[test]
    fn test_decode_garbage_reports_key() {
        let stored = StorageEntry::new("user/broken", b"not json".to_vec());
        let err = decode_entry::<UserEntry>(&stored).unwrap_err();
        assert!(matches!(err, CodecError::Decode { ref key, .. } if key == "user/broken"));
        assert!(err.to_string().contains("user/broken"));
    }
}
