//! Serde helpers for snapshot serialization.
//!
//! File contents are almost always text, so they are stored as a JSON string
//! when they decode as UTF-8. Anything else falls back to a byte array, which
//! keeps the snapshot lossless without bloating the common case.

use serde::{de, Deserializer, Serializer};
use std::fmt;

// ============================================================================
// Vec<u8> as UTF-8 string or byte array
// ============================================================================

/// Serde module for file content.
///
/// # Format
///
/// - valid UTF-8 serializes as a string, e.g. `"hello\n"`
/// - anything else serializes as an array of bytes, e.g. `[255, 0]`
///
/// # Usage
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Blob {
///     #[serde(with = "kpawnd_vfs::serde_helpers::utf8_or_bytes")]
///     content: Vec<u8>,
/// }
/// ```
pub mod utf8_or_bytes {
    use super::*;

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match std::str::from_utf8(value) {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => serializer.collect_seq(value.iter()),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ContentVisitor;

        impl<'de> de::Visitor<'de> for ContentVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or byte array")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(s.as_bytes().to_vec())
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v.to_vec())
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(b) = seq.next_element::<u8>()? {
                    bytes.push(b);
                }
                Ok(bytes)
            }
        }

        deserializer.deserialize_any(ContentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        #[serde(with = "super::utf8_or_bytes")]
        content: Vec<u8>,
    }

    #[test]
    fn test_text_is_stored_as_string() {
        let blob = Blob {
            content: b"hello\nworld".to_vec(),
        };
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"content":"hello\nworld"}"#);
    }

    #[test]
    fn test_binary_is_stored_as_array() {
        let blob = Blob {
            content: vec![0xff, 0x00, 0x41],
        };
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, r#"{"content":[255,0,65]}"#);

        let back: Blob = serde_json::from_str(&json).unwrap();
        assert_eq!(back, blob);
    }
}
