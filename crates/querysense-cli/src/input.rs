//! Input handling: query text, cursor placement and metadata files.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use std::io::{self, Read};
use std::path::Path;

/// Cursor marker recognised by `--marker`.
pub const CURSOR_MARKER: char = '|';

/// Query text with its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySource {
    pub name: String,
    pub content: String,
}

/// Read the query from `file`, or from stdin when none is given.
pub fn read_input(file: Option<&Path>) -> Result<QuerySource> {
    match file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            Ok(QuerySource {
                name: path.display().to_string(),
                content,
            })
        }
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read from stdin")?;
            Ok(QuerySource {
                name: "<stdin>".to_string(),
                content,
            })
        }
    }
}

/// Load a metadata snapshot, or its default when no file is given.
pub fn read_metadata<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid metadata JSON in {}", path.display()))
}

/// Returns the text to complete and the cursor byte offset in it.
///
/// With `marker`, the first `|` is removed and its position becomes the
/// cursor. Otherwise an explicit `cursor` is used as is, and the default is
/// the end of the text with trailing newlines excluded.
pub fn place_cursor(content: String, cursor: Option<usize>, marker: bool) -> Result<(String, usize)> {
    if marker {
        let Some(offset) = content.find(CURSOR_MARKER) else {
            bail!("--marker given but the input contains no '{CURSOR_MARKER}'");
        };
        let mut text = content;
        text.remove(offset);
        return Ok((text, offset));
    }
    let offset = cursor.unwrap_or_else(|| content.trim_end_matches(['\n', '\r']).len());
    Ok((content, offset))
}
