use insta::assert_json_snapshot;
use querysense_core::{
    complete_mongo, complete_sql, ColumnMeta, CompletionItem, ExpectedType, ForeignKeyEdge,
    MongoCompletionRequest, MongoCompletionResult, MongoContextKind, SqlClause,
    SqlCompletionRequest, SqlCompletionResult, SqlMetadata, TableMeta,
};
use serde::Serialize;

/// The parts of a SQL result worth pinning: the resolved position and the
/// head of the ranked list.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SqlView<'a> {
    clause: SqlClause,
    expected: ExpectedType,
    tables: Vec<String>,
    in_window: bool,
    in_case: bool,
    should_show: bool,
    insert_from: usize,
    top: &'a [CompletionItem],
}

impl<'a> SqlView<'a> {
    fn new(result: &'a SqlCompletionResult, top: usize) -> Self {
        let ctx = &result.context;
        SqlView {
            clause: ctx.clause,
            expected: ctx.expected,
            tables: ctx
                .tables_in_scope
                .iter()
                .map(|t| match &t.alias {
                    Some(alias) => format!("{} {alias}", t.table),
                    None => t.table.clone(),
                })
                .collect(),
            in_window: ctx.in_window,
            in_case: ctx.in_case,
            should_show: result.should_show,
            insert_from: result.insert_from,
            top: &result.candidates[..top.min(result.candidates.len())],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MongoView<'a> {
    kind: MongoContextKind,
    in_string: bool,
    should_show: bool,
    insert_from: usize,
    top: &'a [CompletionItem],
}

impl<'a> MongoView<'a> {
    fn new(result: &'a MongoCompletionResult, top: usize) -> Self {
        MongoView {
            kind: result.context.kind,
            in_string: result.context.in_string,
            should_show: result.should_show,
            insert_from: result.insert_from,
            top: &result.candidates[..top.min(result.candidates.len())],
        }
    }
}

/// Suppressed results only need the opaque flags.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MutedView {
    in_comment: bool,
    in_string: bool,
    should_show: bool,
    insert_from: usize,
    candidates: usize,
}

fn column(name: &str, data_type: &str) -> ColumnMeta {
    ColumnMeta {
        name: name.to_string(),
        data_type: Some(data_type.to_string()),
        nullable: true,
        ..ColumnMeta::default()
    }
}

fn shop_metadata() -> SqlMetadata {
    let mut metadata = SqlMetadata {
        schemas: vec!["public".to_string()],
        tables: vec![
            TableMeta {
                schema: None,
                name: "users".to_string(),
                row_count: None,
            },
            TableMeta {
                schema: None,
                name: "orders".to_string(),
                row_count: None,
            },
        ],
        foreign_keys: vec![ForeignKeyEdge {
            constraint_name: Some("orders_user_id_fkey".to_string()),
            source_schema: None,
            source_table: "orders".to_string(),
            source_column: "user_id".to_string(),
            target_schema: None,
            target_table: "users".to_string(),
            target_column: "id".to_string(),
        }],
        ..SqlMetadata::default()
    };
    metadata.columns.insert(
        "users".to_string(),
        vec![column("id", "integer"), column("email", "text")],
    );
    metadata.columns.insert(
        "orders".to_string(),
        vec![
            column("id", "integer"),
            column("user_id", "integer"),
            column("total", "numeric"),
        ],
    );
    metadata
}

fn sql_at_cursor(sql: &str) -> SqlCompletionResult {
    let cursor = sql.find('|').expect("sql must contain cursor marker '|'");
    let text = sql.replace('|', "");
    complete_sql(&SqlCompletionRequest::new(text, cursor).with_metadata(shop_metadata()))
}

fn mongo_at_end(text: &str) -> MongoCompletionResult {
    complete_mongo(&MongoCompletionRequest::new(text, text.len()))
}

#[test]
fn snap_join_condition_from_foreign_key() {
    let result = sql_at_cursor("SELECT id, FROM users u JOIN orders o ON |");
    assert_json_snapshot!(SqlView::new(&result, 2));
}

#[test]
fn snap_from_clause_tables() {
    let result = sql_at_cursor("SELECT * FROM |");
    assert_json_snapshot!(SqlView::new(&result, 10));
}

#[test]
fn snap_group_accumulators() {
    let result = mongo_at_end(r#"{"pipeline":[{"$group":{"_id":"$cat","total":{"#);
    assert_json_snapshot!(MongoView::new(&result, 12));
}

#[test]
fn snap_query_operator_prefix() {
    let result = mongo_at_end(r#"{"find":{"age":{"$g"#);
    assert_json_snapshot!(MongoView::new(&result, 10));
}

#[test]
fn snap_line_comment_is_muted() {
    let result = sql_at_cursor("SELECT 1 -- FR|");
    assert_json_snapshot!(MutedView {
        in_comment: result.context.in_comment,
        in_string: result.context.in_string,
        should_show: result.should_show,
        insert_from: result.insert_from,
        candidates: result.candidates.len(),
    });
}

#[test]
fn snap_window_specification() {
    let result = sql_at_cursor("SELECT ROW_NUMBER() OVER (PA|");
    assert_json_snapshot!(SqlView::new(&result, 5));
}

#[test]
fn snap_case_branch_keyword() {
    let result = sql_at_cursor("SELECT CASE WHEN id = 1 TH|");
    assert_json_snapshot!(SqlView::new(&result, 5));
}
