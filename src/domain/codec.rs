//! Wire codec for cache payloads.
//!
//! Three payload shapes exist in the store:
//! 1. ASCII decimal digits (optional leading `-`): a plain integer.
//! 2. `'!'` followed by a JSON blob: any other value.
//! 3. Anything else: a legacy payload from before tagging, passed through.

use crate::domain::error::CacheError;
use crate::domain::value::CacheValue;

/// Marker byte prefixed to JSON-serialized payloads.
const TAG: u8 = b'!';

/// Encodes a value into its wire representation.
///
/// Integers become plain ASCII decimal so the store can mutate them with its
/// native increment primitive; everything else gets the tag byte followed by
/// its JSON serialization. `Raw` bytes are written unchanged.
pub fn encode(value: &CacheValue) -> Result<Vec<u8>, CacheError> {
    match value {
        CacheValue::Int(n) => Ok(n.to_string().into_bytes()),
        CacheValue::Json(v) => {
            let mut buf = vec![TAG];
            let json = serde_json::to_vec(v).map_err(|e| {
                CacheError::serialization(format!("Failed to serialize cache value: {}", e))
            })?;
            buf.extend_from_slice(&json);
            Ok(buf)
        }
        CacheValue::Raw(bytes) => Ok(bytes.clone()),
    }
}

/// Decodes a raw store payload. The reversal of [`encode`].
///
/// `None` input means the key was absent and decodes to `None`. A tagged
/// payload that fails to deserialize also decodes to `None`: a corrupt cache
/// entry must look like a miss, never crash the caller. Bytes that are
/// neither tagged nor an integer are legacy payloads and come back verbatim.
pub fn decode(raw: Option<&[u8]>) -> Option<CacheValue> {
    let bytes = raw?;
    if let Some(payload) = bytes.strip_prefix(&[TAG]) {
        return match serde_json::from_slice(payload) {
            Ok(v) => Some(CacheValue::Json(v)),
            Err(e) => {
                tracing::warn!("Discarding corrupt cache payload: {}", e);
                None
            }
        };
    }
    match std::str::from_utf8(bytes).ok().and_then(|s| s.parse().ok()) {
        Some(n) => Some(CacheValue::Int(n)),
        None => Some(CacheValue::Raw(bytes.to_vec())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_int_round_trip() {
        for n in [0i64, 1, 42, -1, -303, i64::MAX, i64::MIN] {
            let encoded = encode(&CacheValue::Int(n)).unwrap();
            assert_eq!(decode(Some(&encoded)), Some(CacheValue::Int(n)));
        }
    }

    #[test]
    fn test_int_has_no_tag() {
        let encoded = encode(&CacheValue::Int(42)).unwrap();
        assert_eq!(encoded, b"42");
    }

    #[test]
    fn test_json_round_trip() {
        let values = [
            json!({"x": 1, "y": [1, 2, 3]}),
            json!("plain string"),
            json!(true),
            json!(null),
            json!(1.5),
        ];

        for v in values {
            let encoded = encode(&CacheValue::Json(v.clone())).unwrap();
            assert_eq!(encoded[0], b'!');
            assert_eq!(decode(Some(&encoded)), Some(CacheValue::Json(v)));
        }
    }

    #[test]
    fn test_absent_decodes_to_none() {
        assert_eq!(decode(None), None);
    }

    #[test]
    fn test_corrupt_tagged_payload_decodes_to_none() {
        assert_eq!(decode(Some(b"!not json at all")), None);
        assert_eq!(decode(Some(b"!{\"truncated\":")), None);
    }

    #[test]
    fn test_legacy_payload_passes_through() {
        let legacy = b"some pre-tagging value".as_slice();
        assert_eq!(
            decode(Some(legacy)),
            Some(CacheValue::Raw(legacy.to_vec()))
        );
    }

    #[test]
    fn test_legacy_non_utf8_passes_through() {
        let legacy = [0xff, 0xfe, 0x00, 0x01];
        assert_eq!(
            decode(Some(&legacy)),
            Some(CacheValue::Raw(legacy.to_vec()))
        );
    }

    #[test]
    fn test_raw_encode_is_verbatim() {
        let bytes = b"opaque".to_vec();
        assert_eq!(encode(&CacheValue::Raw(bytes.clone())).unwrap(), bytes);
    }

    #[test]
    fn test_bool_takes_tagged_path() {
        let encoded = encode(&CacheValue::Json(json!(true))).unwrap();
        assert_eq!(encoded, b"!true");
        assert_eq!(decode(Some(&encoded)), Some(CacheValue::Json(json!(true))));
    }

    #[test]
    fn test_integer_like_string_stays_tagged() {
        // A JSON string "42" must not come back as the integer 42.
        let encoded = encode(&CacheValue::Json(json!("42"))).unwrap();
        assert_eq!(decode(Some(&encoded)), Some(CacheValue::Json(json!("42"))));
    }
}
