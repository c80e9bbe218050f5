pub mod encoding;

use encoding::{convert_offsets_to_utf16, utf16_to_utf8_offset, Encoding};
use querysense_core::{
    complete_mongo, complete_sql, MongoCompletionRequest, MongoCompletionResult,
    SqlCompletionRequest, SqlCompletionResult,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

const SERIALIZATION_FALLBACK: &str = r#"{"error":"Failed to serialize error result"}"#;

/// A request as sent over the boundary: the core request plus the offset
/// encoding the caller uses.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<R> {
    #[serde(flatten)]
    request: R,
    #[serde(default)]
    encoding: Encoding,
}

/// Access to the text and cursor shared by both request types.
trait CursorRequest {
    fn text(&self) -> &str;
    fn set_cursor(&mut self, offset: usize);
    fn cursor(&self) -> usize;
}

impl CursorRequest for SqlCompletionRequest {
    fn text(&self) -> &str {
        &self.text
    }

    fn cursor(&self) -> usize {
        self.cursor_offset
    }

    fn set_cursor(&mut self, offset: usize) {
        self.cursor_offset = offset;
    }
}

impl CursorRequest for MongoCompletionRequest {
    fn text(&self) -> &str {
        &self.text
    }

    fn cursor(&self) -> usize {
        self.cursor_offset
    }

    fn set_cursor(&mut self, offset: usize) {
        self.cursor_offset = offset;
    }
}

/// Installs the panic hook and, with the `tracing` feature, routes engine
/// spans to the browser console.
#[wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
    #[cfg(feature = "tracing")]
    tracing_wasm::set_as_global_default();
}

/// SQL completion entry point - accepts a JSON request, returns a JSON result.
/// This function never throws - errors are returned in the result's `error` field.
#[wasm_bindgen]
pub fn complete_sql_json(request_json: &str) -> String {
    complete_json(request_json, complete_sql, |message| {
        SqlCompletionResult::from_error(message)
    })
}

/// MongoDB completion entry point, same contract as [`complete_sql_json`].
#[wasm_bindgen]
pub fn complete_mongo_json(request_json: &str) -> String {
    complete_json(request_json, complete_mongo, |message| {
        MongoCompletionResult::from_error(message)
    })
}

/// Drops the memoized per-dialect function lists.
#[wasm_bindgen]
pub fn clear_function_cache() {
    querysense_core::clear_function_cache();
}

/// Get version information
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn complete_json<R, T>(
    request_json: &str,
    complete: impl Fn(&R) -> T,
    from_error: impl Fn(String) -> T,
) -> String
where
    R: DeserializeOwned + CursorRequest,
    T: Serialize,
{
    let Envelope {
        mut request,
        encoding,
    } = match serde_json::from_str::<Envelope<R>>(request_json) {
        Ok(envelope) => envelope,
        Err(e) => return to_json(&from_error(format!("Invalid request format: {e}"))),
    };

    if encoding == Encoding::Utf16 {
        match utf16_to_utf8_offset(request.text(), request.cursor()) {
            Ok(offset) => request.set_cursor(offset),
            Err(message) => return to_json(&from_error(message)),
        }
    }

    let result = complete(&request);
    let mut value = match serde_json::to_value(&result) {
        Ok(value) => value,
        Err(_) => return to_json(&from_error("Failed to serialize result".to_string())),
    };
    if encoding == Encoding::Utf16 {
        convert_offsets_to_utf16(request.text(), &mut value);
    }
    value.to_string()
}

fn to_json<T: Serialize>(result: &T) -> String {
    serde_json::to_string(result).unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_string())
}
