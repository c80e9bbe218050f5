use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Dialect;

/// A table known to the metadata provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
}

impl TableMeta {
    /// Key into [`SqlMetadata::columns`] for this table (`schema.table` or `table`).
    pub fn column_key(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// A column of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    /// Allowed values for enum-typed columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A foreign key from `source_table.source_column` to `target_table.target_column`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_schema: Option<String>,
    pub source_table: String,
    pub source_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_schema: Option<String>,
    pub target_table: String,
    pub target_column: String,
}

/// Catalog snapshot for SQL completion, frozen for the duration of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SqlMetadata {
    pub schemas: Vec<String>,
    pub tables: Vec<TableMeta>,
    /// Columns keyed by `schema.table` (or bare `table` when unqualified).
    pub columns: BTreeMap<String, Vec<ColumnMeta>>,
    pub foreign_keys: Vec<ForeignKeyEdge>,
}

/// Field of a sampled MongoDB document. Nested documents recurse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nested_fields: Vec<FieldInfo>,
}

/// Collection snapshot for MongoDB completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MongoMetadata {
    pub collections: Vec<String>,
    /// Sampled field trees keyed by collection name.
    pub fields: BTreeMap<String, Vec<FieldInfo>>,
}

/// Result size limits applied by the ranking engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionLimits {
    /// Prefix length (in chars) at which the caller is assumed to filter intentionally.
    pub show_all_threshold: usize,
    /// Total cap when the prefix is shorter than `show_all_threshold`.
    pub max_results: usize,
    /// Total cap when the prefix reaches `show_all_threshold`.
    pub max_filtered_results: usize,
    pub columns: usize,
    pub tables: usize,
    pub functions: usize,
    pub keywords: usize,
    pub other: usize,
    /// Cap on MongoDB field-path matches after recursive expansion.
    pub max_field_paths: usize,
}

impl Default for CompletionLimits {
    fn default() -> Self {
        Self {
            show_all_threshold: 2,
            max_results: 50,
            max_filtered_results: 100,
            columns: 25,
            tables: 15,
            functions: 12,
            keywords: 12,
            other: 12,
            max_field_paths: 20,
        }
    }
}

/// Per-request switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionOptions {
    /// Completion was explicitly requested (e.g. Ctrl+Space), so strings and
    /// comments are not suppressed.
    pub explicit: bool,
    pub limits: CompletionLimits,
}

/// Request for SQL completions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SqlCompletionRequest {
    pub text: String,
    /// Byte offset of the cursor in `text`.
    pub cursor_offset: usize,
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub metadata: SqlMetadata,
    #[serde(default)]
    pub options: CompletionOptions,
}

impl SqlCompletionRequest {
    pub fn new(text: impl Into<String>, cursor_offset: usize) -> Self {
        Self {
            text: text.into(),
            cursor_offset,
            dialect: Dialect::default(),
            metadata: SqlMetadata::default(),
            options: CompletionOptions::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_metadata(mut self, metadata: SqlMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn explicit(mut self) -> Self {
        self.options.explicit = true;
        self
    }
}

/// Request for MongoDB completions.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MongoCompletionRequest {
    pub text: String,
    /// Byte offset of the cursor in `text`.
    pub cursor_offset: usize,
    #[serde(default)]
    pub metadata: MongoMetadata,
    #[serde(default)]
    pub options: CompletionOptions,
}

impl MongoCompletionRequest {
    pub fn new(text: impl Into<String>, cursor_offset: usize) -> Self {
        Self {
            text: text.into(),
            cursor_offset,
            metadata: MongoMetadata::default(),
            options: CompletionOptions::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: MongoMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn explicit(mut self) -> Self {
        self.options.explicit = true;
        self
    }
}
