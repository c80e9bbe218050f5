//! Types for the completion API.
//!
//! Requests carry the editable text, a byte cursor offset and a read-only
//! metadata snapshot. Results carry the ranked candidates together with the
//! resolved cursor context so callers can inspect why a list was produced.

mod common;
mod completion;
mod request;

pub use common::{Dialect, DialectSet, Span};
pub use completion::{
    CompletionItem, CompletionItemKind, CteRef, ExpectedType, MongoCompletionResult, MongoContext,
    MongoContextKind, QualifierTarget, SqlClause, SqlCompletionResult, SqlContext, TableRef,
};
pub use request::{
    ColumnMeta, CompletionLimits, CompletionOptions, FieldInfo, ForeignKeyEdge,
    MongoCompletionRequest, MongoMetadata, SqlCompletionRequest, SqlMetadata, TableMeta,
};
