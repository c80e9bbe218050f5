//! SQL completion pipeline: scan, resolve context, generate, rank.

#[cfg(feature = "tracing")]
use tracing::{debug_span, trace};

mod context;
mod data_types;
mod functions;
mod generators;
mod keywords;
mod operators;
mod scanner;
mod snippets;
mod tokens;

pub use context::sql_context;
pub use functions::FunctionCategory;

use crate::error::validate_request;
use crate::ranking::apply_smart_limits;
use crate::types::{SqlCompletionRequest, SqlCompletionResult};

/// Computes SQL completions at the request's cursor.
///
/// Never panics on malformed SQL. An invalid request (cursor out of range,
/// oversized input) yields a result with `error` set and no candidates.
pub fn complete_sql(request: &SqlCompletionRequest) -> SqlCompletionResult {
    #[cfg(feature = "tracing")]
    let _span = debug_span!(
        "complete_sql",
        dialect = ?request.dialect,
        cursor = request.cursor_offset,
        len = request.text.len()
    )
    .entered();

    let text = request.text.as_str();
    let cursor = request.cursor_offset;
    if let Err(err) = validate_request(text, cursor) {
        return SqlCompletionResult::from_error(err.to_string());
    }

    let scanned = scanner::scan(text, request.dialect);
    let ctx = context::resolve(text, cursor, request.dialect, &scanned);
    let insert_from = cursor - ctx.current_word.len();

    #[cfg(feature = "tracing")]
    trace!(clause = ?ctx.clause, expected = ?ctx.expected, tables = ctx.tables_in_scope.len(), "resolved SQL context");

    if ctx.is_opaque() && !request.options.explicit {
        return SqlCompletionResult::empty(ctx, insert_from);
    }

    let generated = generators::generate(&ctx, &request.metadata, request.dialect);
    let candidates = apply_smart_limits(generated, &ctx.current_word, &request.options.limits);

    #[cfg(feature = "tracing")]
    trace!(candidates = candidates.len(), "ranked SQL candidates");

    let should_show = !(candidates.is_empty() && ctx.current_word.is_empty());
    SqlCompletionResult {
        insert_from,
        should_show,
        candidates,
        context: ctx,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompletionItemKind, Dialect, SqlClause, SqlMetadata, TableMeta};

    fn metadata() -> SqlMetadata {
        SqlMetadata {
            tables: vec![TableMeta {
                schema: None,
                name: "users".into(),
                row_count: None,
            }],
            ..SqlMetadata::default()
        }
    }

    #[test]
    fn test_comment_suppresses_completions() {
        let sql = "SELECT 1 -- FR";
        let result = complete_sql(&SqlCompletionRequest::new(sql, sql.len()));
        assert!(result.context.in_comment);
        assert!(!result.should_show);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_explicit_request_completes_inside_comment() {
        let sql = "SELECT 1 -- FR";
        let request = SqlCompletionRequest::new(sql, sql.len()).explicit();
        let result = complete_sql(&request);
        assert!(result.should_show);
        assert!(!result.candidates.is_empty());
    }

    #[test]
    fn test_insert_from_covers_current_word() {
        let sql = "SELECT * FROM us";
        let result =
            complete_sql(&SqlCompletionRequest::new(sql, sql.len()).with_metadata(metadata()));
        assert_eq!(result.insert_from, 14);
        assert_eq!(result.context.clause, SqlClause::From);
        assert_eq!(result.candidates[0].label, "users");
        assert_eq!(result.candidates[0].kind, CompletionItemKind::Table);
    }

    #[test]
    fn test_invalid_cursor_reports_error() {
        let result = complete_sql(&SqlCompletionRequest::new("SELECT", 42));
        assert!(result.error.is_some());
        assert!(!result.should_show);
    }

    #[test]
    fn test_dialect_is_honoured() {
        let sql = "SELECT * FROM users # note";
        let request = SqlCompletionRequest::new(sql, sql.len()).with_dialect(Dialect::Mysql);
        assert!(complete_sql(&request).context.in_comment);
    }
}
