use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use querysense_core::{
    complete_mongo, complete_sql, mongo_context, sql_context, ColumnMeta, CompletionItem,
    CompletionItemKind, CompletionLimits, Dialect, FieldInfo, MongoCompletionRequest,
    MongoMetadata, SqlCompletionRequest, SqlMetadata, TableMeta,
};

fn dialect() -> impl Strategy<Value = Dialect> {
    prop::sample::select(Dialect::ALL.to_vec())
}

fn metadata(tables: &[String]) -> SqlMetadata {
    SqlMetadata {
        tables: tables
            .iter()
            .map(|name| TableMeta {
                schema: None,
                name: name.clone(),
                row_count: None,
            })
            .collect(),
        ..SqlMetadata::default()
    }
}

/// Thirty tables `t0..t29` with ten columns `c0..c9` each.
fn wide_sql_metadata() -> SqlMetadata {
    let names: Vec<String> = (0..30).map(|i| format!("t{i}")).collect();
    let mut metadata = metadata(&names);
    for name in &names {
        let columns = (0..10)
            .map(|c| ColumnMeta {
                name: format!("c{c}"),
                data_type: Some("integer".to_string()),
                nullable: true,
                ..ColumnMeta::default()
            })
            .collect();
        metadata.columns.insert(name.clone(), columns);
    }
    metadata
}

/// One collection `orders` with sixty top-level fields.
fn wide_mongo_metadata() -> MongoMetadata {
    let mut metadata = MongoMetadata {
        collections: vec!["orders".to_string(), "users".to_string()],
        ..MongoMetadata::default()
    };
    let fields = (0..60)
        .map(|i| FieldInfo {
            name: format!("f{i}"),
            field_type: Some("string".to_string()),
            ..FieldInfo::default()
        })
        .collect();
    metadata.fields.insert("orders".to_string(), fields);
    metadata
}

/// Mongo command prefixes that land in key, value and stage positions.
fn mongo_head() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        r#"{"find":"orders","filter":{""#,
        r#"{"find":"orders","filter":{"f1":{""#,
        r#"{"aggregate":"orders","pipeline":[{""#,
        r#"{"aggregate":"orders","pipeline":[{"$group":{"_id":""#,
        r#"{"aggregate":"orders","pipeline":[{"$group":{"_id":"$f1","n":{""#,
        r#"{"aggregate":"orders","pipeline":[{"$project":{"a":{""#,
        r#"{"find":"orders","sort":{""#,
        r#"{""#,
    ])
}

/// Cap of the ranking bucket `kind` falls into when the prefix is short.
fn bucket_cap(kind: CompletionItemKind, limits: &CompletionLimits) -> (u8, usize) {
    use CompletionItemKind::*;
    match kind {
        Column | Field | FieldPath => (0, limits.columns),
        Table | Schema | Cte | Collection | Alias => (1, limits.tables),
        Function | Expression | Accumulator | Stage => (2, limits.functions),
        Keyword => (3, limits.keywords),
        Operator | Snippet | JoinCondition | DataType | Variable | Value => (4, limits.other),
    }
}

/// Shared checks on a ranked list: unique by label and kind, sorted by boost,
/// and capped overall and per bucket when the prefix is short.
fn check_limits(candidates: &[CompletionItem], prefix: &str) -> Result<(), TestCaseError> {
    let limits = CompletionLimits::default();
    let mut seen = HashSet::new();
    for item in candidates {
        prop_assert!(seen.insert((item.label.clone(), item.kind)), "duplicate {}", item.label);
    }
    for pair in candidates.windows(2) {
        prop_assert!(pair[0].boost >= pair[1].boost);
    }
    prop_assert!(candidates.len() <= limits.max_filtered_results);
    if prefix.chars().count() < limits.show_all_threshold {
        prop_assert!(candidates.len() <= limits.max_results);
        let mut counts: HashMap<u8, usize> = HashMap::new();
        for item in candidates {
            let (bucket, cap) = bucket_cap(item.kind, &limits);
            let count = counts.entry(bucket).or_default();
            *count += 1;
            prop_assert!(*count <= cap, "bucket of {:?} over {cap}", item.kind);
        }
    }
    Ok(())
}

/// Largest char boundary not past `offset`.
fn floor_boundary(text: &str, offset: usize) -> usize {
    let mut cursor = offset.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

proptest! {
    #[test]
    fn sql_completion_never_panics(text in "[ -~]{0,80}", offset in 0usize..100, dialect in dialect()) {
        let cursor = floor_boundary(&text, offset);
        let result = complete_sql(&SqlCompletionRequest::new(text.clone(), cursor).with_dialect(dialect));
        prop_assert!(result.error.is_none());
        prop_assert!(result.insert_from <= cursor);
    }

    #[test]
    fn sql_context_is_deterministic(text in "[a-zA-Z0-9_ ,.()'=*;-]{0,60}", offset in 0usize..60) {
        let cursor = floor_boundary(&text, offset);
        prop_assert_eq!(
            sql_context(&text, cursor, Dialect::Postgres),
            sql_context(&text, cursor, Dialect::Postgres)
        );
    }

    #[test]
    fn sql_candidates_are_unique_and_capped(
        tables in prop::collection::vec("[a-z]{1,6}", 0..40),
        prefix in "[a-z]{0,3}",
    ) {
        let text = format!("SELECT * FROM {prefix}");
        let request = SqlCompletionRequest::new(text.clone(), text.len()).with_metadata(metadata(&tables));
        let result = complete_sql(&request);
        let limits = CompletionLimits::default();

        let mut seen = HashSet::new();
        for item in &result.candidates {
            prop_assert!(seen.insert((item.label.clone(), item.kind)), "duplicate {}", item.label);
        }
        prop_assert!(result.candidates.len() <= limits.max_filtered_results);
        if prefix.chars().count() < limits.show_all_threshold {
            prop_assert!(result.candidates.len() <= limits.max_results);
        }
        for pair in result.candidates.windows(2) {
            prop_assert!(pair[0].boost >= pair[1].boost);
        }
    }

    #[test]
    fn sql_comment_is_always_suppressed(comment in "[a-zA-Z ]{0,20}", dialect in dialect()) {
        let text = format!("SELECT 1 /* {comment}");
        let result = complete_sql(&SqlCompletionRequest::new(text.clone(), text.len()).with_dialect(dialect));
        prop_assert!(result.context.in_comment);
        prop_assert!(result.candidates.is_empty());
    }

    #[test]
    fn mongo_completion_never_panics(text in "[{}\\[\\]:,\"'$a-z0-9 ]{0,60}", offset in 0usize..60) {
        let cursor = floor_boundary(&text, offset);
        let result = complete_mongo(&MongoCompletionRequest::new(text.clone(), cursor));
        prop_assert!(result.error.is_none());
    }

    #[test]
    fn mongo_context_ignores_text_after_cursor(
        head in "[{}\\[\\]:,\"$a-z ]{0,40}",
        tail in "[{}\\[\\]:,\"$a-z ]{0,40}",
    ) {
        let text = format!("{head}{tail}");
        prop_assert_eq!(mongo_context(&text, head.len()), mongo_context(&head, head.len()));
    }

    #[test]
    fn sql_completion_is_repeatable(
        tables in prop::collection::vec(0usize..30, 1..4),
        prefix in "[a-z]{0,2}",
        dialect in dialect(),
    ) {
        let from: Vec<String> = tables.iter().map(|i| format!("t{i}")).collect();
        let head = format!("SELECT {prefix}");
        let text = format!("{head} FROM {}", from.join(", "));
        let request = SqlCompletionRequest::new(text, head.len())
            .with_dialect(dialect)
            .with_metadata(wide_sql_metadata());

        let first = complete_sql(&request);
        let second = complete_sql(&request);
        prop_assert_eq!(&first.context, &second.context);
        prop_assert_eq!(&first.candidates, &second.candidates);
        prop_assert_eq!(first.insert_from, second.insert_from);
        prop_assert_eq!(first.should_show, second.should_show);
    }

    #[test]
    fn sql_wide_schema_respects_bucket_caps(
        tables in prop::collection::vec(0usize..30, 1..4),
        prefix in "[a-z]{0,2}",
        in_from in any::<bool>(),
    ) {
        let from: Vec<String> = tables.iter().map(|i| format!("t{i}")).collect();
        let (text, cursor) = if in_from {
            let text = format!("SELECT * FROM {prefix}");
            let cursor = text.len();
            (text, cursor)
        } else {
            let head = format!("SELECT {prefix}");
            (format!("{head} FROM {}", from.join(", ")), head.len())
        };
        let request = SqlCompletionRequest::new(text, cursor).with_metadata(wide_sql_metadata());
        let result = complete_sql(&request);
        check_limits(&result.candidates, &result.context.current_word)?;
    }

    #[test]
    fn mongo_completion_is_repeatable(head in mongo_head(), prefix in "[$a-z0-9]{0,2}") {
        let text = format!("{head}{prefix}");
        let request = MongoCompletionRequest::new(text.clone(), text.len())
            .with_metadata(wide_mongo_metadata());

        let first = complete_mongo(&request);
        let second = complete_mongo(&request);
        prop_assert_eq!(&first.context, &second.context);
        prop_assert_eq!(&first.candidates, &second.candidates);
        prop_assert_eq!(first.insert_from, second.insert_from);
        prop_assert_eq!(first.should_show, second.should_show);
    }

    #[test]
    fn mongo_candidates_are_unique_and_capped(head in mongo_head(), prefix in "[$a-z0-9]{0,2}") {
        let text = format!("{head}{prefix}");
        let request = MongoCompletionRequest::new(text.clone(), text.len())
            .with_metadata(wide_mongo_metadata());
        let result = complete_mongo(&request);
        check_limits(&result.candidates, &result.context.current_word)?;
    }
}
