//! Output formatting modules.

pub mod json;
pub mod table;

pub use json::format_json;
pub use table::format_table;

use querysense_core::{CompletionItem, MongoCompletionResult, SqlCompletionResult};
use serde::Serialize;

/// Result of one CLI run, in either language.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CompletionReport {
    Sql(SqlCompletionResult),
    Mongo(MongoCompletionResult),
}

impl CompletionReport {
    pub fn candidates(&self) -> &[CompletionItem] {
        match self {
            Self::Sql(result) => &result.candidates,
            Self::Mongo(result) => &result.candidates,
        }
    }

    pub fn insert_from(&self) -> usize {
        match self {
            Self::Sql(result) => result.insert_from,
            Self::Mongo(result) => result.insert_from,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Sql(result) => result.error.as_deref(),
            Self::Mongo(result) => result.error.as_deref(),
        }
    }

    /// One-line description of the resolved cursor context.
    pub fn context_summary(&self) -> String {
        match self {
            Self::Sql(result) => {
                let ctx = &result.context;
                let mut summary = format!("clause {:?}, expecting {:?}", ctx.clause, ctx.expected);
                if !ctx.tables_in_scope.is_empty() {
                    let tables: Vec<_> = ctx
                        .tables_in_scope
                        .iter()
                        .map(|t| match &t.alias {
                            Some(alias) => format!("{} {alias}", t.table),
                            None => t.table.clone(),
                        })
                        .collect();
                    summary.push_str(&format!(", tables: {}", tables.join(", ")));
                }
                if ctx.is_opaque() {
                    summary.push_str(", inside string or comment");
                }
                summary
            }
            Self::Mongo(result) => {
                let ctx = &result.context;
                let mut summary = format!("{:?} at depth {}", ctx.kind, ctx.depth);
                if let Some(stage) = &ctx.current_stage {
                    summary.push_str(&format!(", stage {stage}"));
                }
                if let Some(collection) = &ctx.collection {
                    summary.push_str(&format!(", collection {collection}"));
                }
                summary
            }
        }
    }
}
