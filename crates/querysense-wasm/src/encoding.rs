//! UTF-8 ↔ UTF-16 offset conversion at the WASM boundary.
//!
//! Editors running in JavaScript count offsets in UTF-16 code units while the
//! engine works on UTF-8 byte offsets. Requests may opt into UTF-16 with
//! `"encoding": "utf16"`; the cursor is converted on the way in and every
//! offset in the result on the way out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text encoding for offset interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8 byte offsets
    #[default]
    Utf8,
    /// UTF-16 code unit offsets (Monaco, CodeMirror)
    Utf16,
}

/// Result keys holding a single offset into the text.
const OFFSET_KEYS: &[&str] = &["insertFrom"];

/// Converts a UTF-16 code unit offset to a UTF-8 byte offset.
///
/// An offset that falls between the two halves of a surrogate pair is an
/// error, as is one past the end of `text`.
pub fn utf16_to_utf8_offset(text: &str, utf16_offset: usize) -> Result<usize, String> {
    let mut utf16_count = 0;
    let mut byte_offset = 0;

    for ch in text.chars() {
        if utf16_count == utf16_offset {
            return Ok(byte_offset);
        }
        if utf16_count > utf16_offset {
            break;
        }
        utf16_count += ch.len_utf16();
        byte_offset += ch.len_utf8();
    }

    if utf16_count == utf16_offset {
        return Ok(byte_offset);
    }

    Err(format!(
        "UTF-16 offset {utf16_offset} is not a character position in text of {utf16_count} code units"
    ))
}

/// Converts a UTF-8 byte offset to a UTF-16 code unit offset.
pub fn utf8_to_utf16_offset(text: &str, utf8_offset: usize) -> Result<usize, String> {
    if utf8_offset > text.len() {
        return Err(format!(
            "UTF-8 offset {utf8_offset} exceeds text length {}",
            text.len()
        ));
    }
    if !text.is_char_boundary(utf8_offset) {
        return Err(format!(
            "UTF-8 offset {utf8_offset} does not land on a character boundary"
        ));
    }
    Ok(text[..utf8_offset].encode_utf16().count())
}

/// Rewrites every byte offset in a serialized result to UTF-16.
///
/// Spans are recognised as objects with numeric `start` and `end`; single
/// offsets by key. Offsets that cannot be converted are left as they are.
pub fn convert_offsets_to_utf16(text: &str, value: &mut Value) {
    match value {
        Value::Object(map) => {
            let is_span = map.get("start").is_some_and(Value::is_u64)
                && map.get("end").is_some_and(Value::is_u64);
            let keys: &[&str] = if is_span { &["start", "end"] } else { OFFSET_KEYS };

            for key in keys {
                let Some(offset) = map.get(*key).and_then(Value::as_u64) else {
                    continue;
                };
                if let Ok(converted) = utf8_to_utf16_offset(text, offset as usize) {
                    map.insert((*key).to_string(), Value::Number(converted.into()));
                }
            }

            for (_, nested) in map.iter_mut() {
                convert_offsets_to_utf16(text, nested);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                convert_offsets_to_utf16(text, item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_to_utf8_ascii_only() {
        let text = "SELECT * FROM users";
        assert_eq!(utf16_to_utf8_offset(text, 0).unwrap(), 0);
        assert_eq!(utf16_to_utf8_offset(text, 7).unwrap(), 7);
        assert_eq!(utf16_to_utf8_offset(text, 19).unwrap(), 19);
    }

    #[test]
    fn test_utf16_to_utf8_multibyte() {
        // '日' is 3 UTF-8 bytes, 1 UTF-16 code unit
        let text = "SELECT '日本語'";
        assert_eq!(utf16_to_utf8_offset(text, 8).unwrap(), 8);
        assert_eq!(utf16_to_utf8_offset(text, 9).unwrap(), 11);
        assert_eq!(utf16_to_utf8_offset(text, 10).unwrap(), 14);
    }

    #[test]
    fn test_utf16_inside_surrogate_pair_is_rejected() {
        // '😀' is 4 UTF-8 bytes, 2 UTF-16 code units
        let text = r#"{"name":"😀"#;
        assert_eq!(utf16_to_utf8_offset(text, 11).unwrap(), 13);
        assert!(utf16_to_utf8_offset(text, 10).is_err());
    }

    #[test]
    fn test_utf16_to_utf8_out_of_bounds() {
        assert!(utf16_to_utf8_offset("SELECT", 100).is_err());
    }

    #[test]
    fn test_utf8_to_utf16() {
        let text = "SELECT '日本語'";
        assert_eq!(utf8_to_utf16_offset(text, 8).unwrap(), 8);
        assert_eq!(utf8_to_utf16_offset(text, 14).unwrap(), 10);
        assert!(utf8_to_utf16_offset(text, 9).is_err());
        assert!(utf8_to_utf16_offset(text, 100).is_err());
    }

    #[test]
    fn test_convert_offsets_to_utf16() {
        let text = "SELECT '日本語' AS x FROM t";
        let mut json = serde_json::json!({
            "insertFrom": 29,
            "context": {
                "statementSpan": { "start": 0, "end": 30 },
                "tablesInScope": [{ "table": "t", "span": { "start": 29, "end": 30 } }]
            },
            "candidates": [{ "label": "id", "boost": 80 }]
        });

        convert_offsets_to_utf16(text, &mut json);

        assert_eq!(json["insertFrom"], 23);
        assert_eq!(json["context"]["statementSpan"]["end"], 24);
        assert_eq!(json["context"]["tablesInScope"][0]["span"]["start"], 23);
        assert_eq!(json["candidates"][0]["boost"], 80);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let text = "SELECT '日本😀語'";
        for utf8_pos in [0, 8, 11, 14, 18, 21] {
            let utf16 = utf8_to_utf16_offset(text, utf8_pos).unwrap();
            let back = utf16_to_utf8_offset(text, utf16).unwrap();
            assert_eq!(back, utf8_pos, "roundtrip failed for position {utf8_pos}");
        }
    }
}
