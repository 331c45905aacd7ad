// Payload codec for cache entries.
// Compresses JSON values with zlib and wraps them in base64 for transport.
// Decode failures never propagate: a corrupt entry degrades to an empty
// object so read paths stay alive.

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

/// Payloads smaller than this are not worth compressing.
pub const COMPRESSION_THRESHOLD: usize = 1024;

/// Version tag written into every cached envelope. Bump when the shape of
/// a cached entity changes; older entries then read as misses.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Error, Debug)]
enum CodecError {
    #[error("base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),

    #[error("invalid UTF-8 in payload: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Versioned wrapper around every cached entity.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u32,
    data: Value,
}

/// Serialize a JSON value to a compact base64 string.
///
/// Degrades to the plain JSON text when compression fails, so consumers
/// always receive something `decode` can handle.
pub fn encode(value: &Value) -> String {
    let json = value.to_string();
    match compress(json.as_bytes()) {
        Ok(bytes) => STANDARD.encode(bytes),
        Err(e) => {
            warn!(error = %e, "compression failed, storing plain JSON");
            json
        }
    }
}

/// Decode a payload produced by `encode`, including degraded plain-JSON
/// entries and corrupt data.
///
/// Payloads starting with `{` or `[` were written by the degraded path and
/// are parsed directly. Anything else is treated as base64 + zlib. A
/// payload that fails every stage yields an empty object, never an error.
pub fn decode(payload: &str) -> Value {
    if payload.starts_with('{') || payload.starts_with('[') {
        return serde_json::from_str(payload).unwrap_or_else(|e| {
            warn!(error = %e, "cached payload is not valid JSON");
            empty_object()
        });
    }

    match decompress(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "payload decompression failed, trying plain parse");
            serde_json::from_str(payload).unwrap_or_else(|_| empty_object())
        }
    }
}

/// Whether the serialized form of `value` exceeds `threshold` bytes.
/// Advisory only; `encode` compresses unconditionally.
pub fn should_compress(value: &Value, threshold: usize) -> bool {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len() > threshold)
        .unwrap_or(false)
}

/// Encode an entity inside a versioned envelope.
pub fn encode_entity<T: Serialize>(data: &T) -> String {
    let value = match serde_json::to_value(data) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "entity serialization failed, caching empty envelope");
            return "{}".to_string();
        }
    };
    encode(&json!({ "v": SCHEMA_VERSION, "data": value }))
}

/// Decode an entity from a cached payload.
///
/// Returns `None` when the payload is corrupt, carries a different schema
/// version, or does not match the expected shape. Callers treat `None` as
/// a cache miss.
pub fn decode_entity<T: DeserializeOwned>(payload: &str) -> Option<T> {
    let envelope: Envelope = match serde_json::from_value(decode(payload)) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "cached payload is not a valid envelope");
            return None;
        }
    };

    if envelope.v != SCHEMA_VERSION {
        debug!(
            found = envelope.v,
            expected = SCHEMA_VERSION,
            "cached envelope has stale schema version"
        );
        return None;
    }

    match serde_json::from_value(envelope.data) {
        Ok(entity) => Some(entity),
        Err(e) => {
            debug!(error = %e, "cached envelope does not match entity shape");
            None
        }
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn decompress(payload: &str) -> Result<Value, CodecError> {
    let bytes = STANDARD.decode(payload)?;
    let mut json = Vec::new();
    ZlibDecoder::new(bytes.as_slice()).read_to_end(&mut json)?;
    let text = String::from_utf8(json)?;
    Ok(serde_json::from_str(&text)?)
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_nested_structures() {
        let value = json!({
            "id": 42,
            "title": "Inca Trail Explorer",
            "tags": ["hiking", "peru"],
            "pricing": { "amount": 1899, "currency": "USD" },
            "empty_list": [],
            "empty_map": {},
            "nothing": null,
        });
        assert_eq!(decode(&encode(&value)), value);
    }

    #[test]
    fn round_trips_scalars() {
        for value in [json!(null), json!(true), json!(-17), json!("plain text")] {
            assert_eq!(decode(&encode(&value)), value);
        }
    }

    #[test]
    fn decodes_legacy_plain_json() {
        // Entries written by the degraded path are stored uncompressed.
        assert_eq!(decode("{\"a\":1}"), json!({ "a": 1 }));
        assert_eq!(decode("[1,2,3]"), json!([1, 2, 3]));
    }

    #[test]
    fn corrupt_payload_degrades_to_empty_object() {
        assert_eq!(decode("not-valid-base64!!"), json!({}));
        // Valid base64, invalid zlib stream.
        assert_eq!(decode(&STANDARD.encode(b"garbage")), json!({}));
    }

    #[test]
    fn truncated_compressed_payload_degrades() {
        let full = encode(&json!({ "a": [1, 2, 3] }));
        let truncated = &full[..full.len() / 2];
        assert_eq!(decode(truncated), json!({}));
    }

    #[test]
    fn should_compress_respects_threshold() {
        let small = json!({ "a": 1 });
        let large = json!({ "blob": "x".repeat(2048) });
        assert!(!should_compress(&small, COMPRESSION_THRESHOLD));
        assert!(should_compress(&large, COMPRESSION_THRESHOLD));
    }

    #[test]
    fn entity_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Sample {
            id: u64,
            name: String,
        }

        let sample = Sample {
            id: 9,
            name: "Sahara Camp".into(),
        };
        let payload = encode_entity(&sample);
        assert_eq!(decode_entity::<Sample>(&payload), Some(sample));
    }

    #[test]
    fn stale_schema_version_reads_as_miss() {
        let payload = encode(&json!({ "v": SCHEMA_VERSION + 1, "data": { "id": 1 } }));
        assert_eq!(decode_entity::<serde_json::Value>(&payload), None);
    }

    #[test]
    fn corrupt_entity_reads_as_miss() {
        assert_eq!(decode_entity::<serde_json::Value>("!!!"), None);
        // A valid payload that is not an envelope at all.
        let bare = encode(&json!({ "id": 1 }));
        assert_eq!(decode_entity::<serde_json::Value>(&bare), None);
    }

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ]{0,24}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 64, 8, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                proptest::collection::hash_map("[a-z]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn round_trip_law(value in json_value()) {
            prop_assert_eq!(decode(&encode(&value)), value);
        }
    }
}
