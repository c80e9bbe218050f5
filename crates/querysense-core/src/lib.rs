//! Context-aware completion for SQL and MongoDB query editors.
//!
//! Both pipelines take the editor text, a byte cursor offset and a metadata
//! snapshot, and return ranked candidates plus the context they were derived
//! from. Neither requires the text to parse.

pub mod cache;
pub mod error;
pub mod mongo;
pub mod ranking;
pub mod sql;
pub mod types;

pub use cache::clear_function_cache;
pub use error::{validate_request, CompletionError, MAX_TEXT_LENGTH};
pub use mongo::{complete_mongo, mongo_context};
pub use sql::{complete_sql, sql_context, FunctionCategory};

// Re-export types explicitly
pub use types::{
    ColumnMeta, CompletionItem, CompletionItemKind, CompletionLimits, CompletionOptions, CteRef,
    Dialect, ExpectedType, FieldInfo, ForeignKeyEdge, MongoCompletionRequest,
    MongoCompletionResult, MongoContext, MongoContextKind, MongoMetadata, QualifierTarget,
    SqlClause, SqlCompletionRequest, SqlCompletionResult, SqlContext, SqlMetadata, Span,
    TableMeta, TableRef,
};
