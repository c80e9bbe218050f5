//! Request validation errors.
//!
//! The completion pipelines never fail on malformed query text: unknown
//! structure degrades to `Unknown` contexts. The only error class is a request
//! that cannot be processed at all, which is reported through the `error`
//! field of the result instead of being returned as `Err`.

use thiserror::Error;

/// Maximum accepted text length in bytes.
pub const MAX_TEXT_LENGTH: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("input text too large: {len} bytes exceeds the {max} byte limit")]
    InputTooLarge { len: usize, max: usize },

    #[error("cursor offset {cursor} is out of bounds for text of length {len}")]
    CursorOutOfBounds { cursor: usize, len: usize },

    #[error("cursor offset {cursor} is not on a UTF-8 character boundary")]
    CursorNotCharBoundary { cursor: usize },
}

/// Checks that `cursor` is a usable byte offset into `text`.
pub fn validate_request(text: &str, cursor: usize) -> Result<(), CompletionError> {
    if text.len() > MAX_TEXT_LENGTH {
        return Err(CompletionError::InputTooLarge {
            len: text.len(),
            max: MAX_TEXT_LENGTH,
        });
    }
    if cursor > text.len() {
        return Err(CompletionError::CursorOutOfBounds {
            cursor,
            len: text.len(),
        });
    }
    if !text.is_char_boundary(cursor) {
        return Err(CompletionError::CursorNotCharBoundary { cursor });
    }
    Ok(())
}
