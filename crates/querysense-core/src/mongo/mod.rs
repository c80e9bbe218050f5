//! MongoDB completion pipeline for JSON-like command documents.

#[cfg(feature = "tracing")]
use tracing::{debug_span, trace};

mod catalog;
mod context;
mod generators;
mod scanner;

pub use context::mongo_context;

use crate::error::validate_request;
use crate::ranking::apply_smart_limits;
use crate::types::{MongoCompletionRequest, MongoCompletionResult, MongoContext};
use catalog::COLLECTION_KEYS;
use scanner::MongoScan;

/// Computes MongoDB completions at the request's cursor.
///
/// The document does not need to parse: only the structure before the cursor
/// is tracked. An invalid request yields a result with `error` set.
pub fn complete_mongo(request: &MongoCompletionRequest) -> MongoCompletionResult {
    #[cfg(feature = "tracing")]
    let _span = debug_span!(
        "complete_mongo",
        cursor = request.cursor_offset,
        len = request.text.len()
    )
    .entered();

    let text = request.text.as_str();
    let cursor = request.cursor_offset;
    if let Err(err) = validate_request(text, cursor) {
        return MongoCompletionResult::from_error(err.to_string());
    }

    let ctx = context::resolve(&MongoScan::scan(&text[..cursor]));
    let insert_from = cursor - ctx.current_word.len();

    #[cfg(feature = "tracing")]
    trace!(kind = ?ctx.kind, stage = ?ctx.current_stage, depth = ctx.depth, "resolved Mongo context");

    if is_opaque(&ctx) && !request.options.explicit {
        return MongoCompletionResult::empty(ctx, insert_from);
    }

    let generated = generators::generate(&ctx, &request.metadata, &request.options.limits);
    let candidates = apply_smart_limits(generated, &ctx.current_word, &request.options.limits);

    #[cfg(feature = "tracing")]
    trace!(candidates = candidates.len(), "ranked Mongo candidates");

    let should_show = !(candidates.is_empty() && ctx.current_word.is_empty());
    MongoCompletionResult {
        insert_from,
        should_show,
        candidates,
        context: ctx,
        error: None,
    }
}

/// A string value is free text unless it starts a `$` reference or names a
/// collection. Key strings stay completable.
fn is_opaque(ctx: &MongoContext) -> bool {
    let names_collection = ctx
        .current_key
        .as_deref()
        .is_some_and(|key| COLLECTION_KEYS.contains(&key));
    ctx.in_string && ctx.after_colon && !ctx.current_word.starts_with('$') && !names_collection
}
