//! Ranking and limiting of merged generator output.
//!
//! Every candidate starts from the fixed boost of its kind; generators add
//! structural bonuses on top (foreign-key joins, relations already in scope).
//! [`apply_smart_limits`] then deduplicates, caps and orders the list.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::types::{CompletionItem, CompletionItemKind, CompletionLimits};

/// Base boost for operators.
pub const SCORE_OPERATOR: i32 = 100;
/// Base boost for aggregation stages.
pub const SCORE_STAGE: i32 = 95;
/// Base boost for group accumulators.
pub const SCORE_ACCUMULATOR: i32 = 90;
/// Base boost for aggregation expressions and SQL functions.
pub const SCORE_EXPRESSION: i32 = 85;
/// Base boost for document fields and SQL columns.
pub const SCORE_FIELD: i32 = 80;
/// Base boost for `$field.path` references.
pub const SCORE_FIELD_PATH: i32 = 75;
/// Base boost for collections, tables, CTEs and aliases.
pub const SCORE_RELATION: i32 = 70;
pub const SCORE_SCHEMA: i32 = 65;
pub const SCORE_KEYWORD: i32 = 62;
/// Base boost for snippets and data types.
pub const SCORE_SNIPPET: i32 = 60;
pub const SCORE_VARIABLE: i32 = 55;
pub const SCORE_VALUE: i32 = 50;

/// Bonus for a join condition derived from a foreign key between scoped relations.
pub const SCORE_FOREIGN_KEY_JOIN: i32 = 40;
/// Bonus for columns and tables already referenced by the statement.
pub const SCORE_IN_SCOPE: i32 = 25;
/// Bonus for candidates that fit the surrounding clause especially well.
pub const SCORE_CONTEXT_MATCH: i32 = 15;

/// Fixed boost for a candidate kind.
pub fn base_boost(kind: CompletionItemKind) -> i32 {
    use CompletionItemKind::*;
    match kind {
        Operator => SCORE_OPERATOR,
        Stage => SCORE_STAGE,
        Accumulator => SCORE_ACCUMULATOR,
        Expression | Function => SCORE_EXPRESSION,
        Field | Column => SCORE_FIELD,
        FieldPath => SCORE_FIELD_PATH,
        Collection | Table | Cte | Alias => SCORE_RELATION,
        Schema => SCORE_SCHEMA,
        Keyword => SCORE_KEYWORD,
        Snippet | DataType => SCORE_SNIPPET,
        Variable => SCORE_VARIABLE,
        Value => SCORE_VALUE,
        JoinCondition => SCORE_FIELD + SCORE_FOREIGN_KEY_JOIN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Bucket {
    Columns,
    Tables,
    Functions,
    Keywords,
    Other,
}

impl Bucket {
    const ORDER: [Bucket; 5] = [
        Bucket::Columns,
        Bucket::Tables,
        Bucket::Functions,
        Bucket::Keywords,
        Bucket::Other,
    ];

    fn of(kind: CompletionItemKind) -> Self {
        use CompletionItemKind::*;
        match kind {
            Column | Field | FieldPath => Bucket::Columns,
            Table | Schema | Cte | Collection | Alias => Bucket::Tables,
            Function | Expression | Accumulator | Stage => Bucket::Functions,
            Keyword => Bucket::Keywords,
            Operator | Snippet | JoinCondition | DataType | Variable | Value => Bucket::Other,
        }
    }

    fn cap(self, limits: &CompletionLimits) -> usize {
        match self {
            Bucket::Columns => limits.columns,
            Bucket::Tables => limits.tables,
            Bucket::Functions => limits.functions,
            Bucket::Keywords => limits.keywords,
            Bucket::Other => limits.other,
        }
    }
}

/// Case-insensitive prefix test used by every generator.
pub fn matches_prefix(label: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    label
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Removes duplicate `(label, kind)` pairs, keeping the highest boost.
///
/// The first occurrence keeps its position.
pub fn dedup_candidates(items: Vec<CompletionItem>) -> Vec<CompletionItem> {
    let mut seen: HashMap<(String, CompletionItemKind), usize> = HashMap::new();
    let mut out: Vec<CompletionItem> = Vec::with_capacity(items.len());
    for item in items {
        match seen.get(&(item.label.clone(), item.kind)) {
            Some(&idx) => {
                if item.boost > out[idx].boost {
                    out[idx] = item;
                }
            }
            None => {
                seen.insert((item.label.clone(), item.kind), out.len());
                out.push(item);
            }
        }
    }
    out
}

fn sort_candidates(items: &mut [CompletionItem]) {
    items.sort_by(|a, b| {
        Reverse(a.boost)
            .cmp(&Reverse(b.boost))
            .then_with(|| a.label.cmp(&b.label))
    });
}

/// Dedups, caps and orders the merged candidate list.
///
/// A prefix of at least `show_all_threshold` chars means the user is filtering
/// intentionally: everything is sorted and capped at `max_filtered_results`.
/// Shorter prefixes cap each bucket first so no single source floods the list.
pub fn apply_smart_limits(
    items: Vec<CompletionItem>,
    prefix: &str,
    limits: &CompletionLimits,
) -> Vec<CompletionItem> {
    let mut items = dedup_candidates(items);

    if prefix.chars().count() >= limits.show_all_threshold {
        sort_candidates(&mut items);
        items.truncate(limits.max_filtered_results);
        return items;
    }

    let mut buckets: HashMap<Bucket, Vec<CompletionItem>> = HashMap::new();
    for item in items {
        buckets.entry(Bucket::of(item.kind)).or_default().push(item);
    }

    let mut merged = Vec::new();
    for bucket in Bucket::ORDER {
        if let Some(mut entries) = buckets.remove(&bucket) {
            sort_candidates(&mut entries);
            entries.truncate(bucket.cap(limits));
            merged.extend(entries);
        }
    }

    sort_candidates(&mut merged);
    merged.truncate(limits.max_results);
    merged
}
