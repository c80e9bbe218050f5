use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Span;

/// Kind of a completion candidate. Drives ranking boosts and bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum CompletionItemKind {
    Keyword,
    Operator,
    Function,
    Snippet,
    Table,
    Column,
    Schema,
    Cte,
    Alias,
    JoinCondition,
    DataType,
    Stage,
    Accumulator,
    Expression,
    Field,
    FieldPath,
    Collection,
    Variable,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    /// Short annotation shown next to the label (type, signature, constraint).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Longer description or example.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    pub boost: i32,
    /// Text to insert when it differs from `label`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
}

impl CompletionItem {
    /// Creates an item with the base boost of its kind.
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            info: None,
            boost: crate::ranking::base_boost(kind),
            insert_text: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn with_insert_text(mut self, insert_text: impl Into<String>) -> Self {
        self.insert_text = Some(insert_text.into());
        self
    }

    /// Adds `bonus` on top of the current boost.
    pub fn boosted(mut self, bonus: i32) -> Self {
        self.boost += bonus;
        self
    }

    /// The text the editor should insert.
    pub fn text_to_insert(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.label)
    }
}

/// SQL clause enclosing the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum SqlClause {
    Select,
    From,
    Join,
    On,
    Where,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Insert,
    Values,
    Update,
    Set,
    Delete,
    With,
    Create,
    Alter,
    Returning,
    Unknown,
}

/// What kind of token the SQL grammar expects at the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ExpectedType {
    Column,
    TableOrSchema,
    JoinCondition,
    Value,
    Keyword,
    Function,
    DataType,
    ColumnOrExpression,
    Any,
}

/// A relation referenced by the statement under the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub span: Span,
}

impl TableRef {
    /// The name columns of this relation are qualified with.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// A common table expression declared in the statement's `WITH` prologue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CteRef {
    pub name: String,
    pub columns: Vec<String>,
    pub span: Span,
}

/// What a `qualifier.` before the cursor resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum QualifierTarget {
    Cte {
        name: String,
    },
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        table: String,
    },
    Schema {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SqlContext {
    pub clause: SqlClause,
    pub expected: ExpectedType,
    /// Parenthesis depth at the cursor within the current statement.
    pub depth: usize,
    pub current_word: String,
    pub in_string: bool,
    pub in_comment: bool,
    /// Cursor follows a comma, operator or open paren.
    pub after_delimiter: bool,
    pub tables_in_scope: Vec<TableRef>,
    pub ctes_in_scope: Vec<CteRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier_target: Option<QualifierTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_keyword: Option<String>,
    /// Identifier immediately before a trailing comparison operator or the cursor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_identifier: Option<String>,
    pub in_window: bool,
    pub in_case: bool,
    /// The query level at the cursor has a `GROUP BY`.
    pub has_group_by: bool,
    /// Span of the statement containing the cursor.
    pub statement_span: Span,
}

impl SqlContext {
    pub fn empty() -> Self {
        Self {
            clause: SqlClause::Unknown,
            expected: ExpectedType::Any,
            depth: 0,
            current_word: String::new(),
            in_string: false,
            in_comment: false,
            after_delimiter: false,
            tables_in_scope: Vec::new(),
            ctes_in_scope: Vec::new(),
            current_qualifier: None,
            qualifier_target: None,
            previous_token: None,
            previous_keyword: None,
            previous_identifier: None,
            in_window: false,
            in_case: false,
            has_group_by: false,
            statement_span: Span::new(0, 0),
        }
    }

    /// Cursor sits inside a string, quoted identifier or comment.
    pub fn is_opaque(&self) -> bool {
        self.in_string || self.in_comment
    }
}

/// Classification of a cursor position inside a MongoDB command document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MongoContextKind {
    Root,
    Pipeline,
    Stage,
    StageBody,
    Group,
    GroupAccumulator,
    ProjectExpr,
    Query,
    Update,
    Projection,
    Sort,
    Value,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MongoContext {
    pub kind: MongoContextKind,
    /// Object/array nesting depth at the cursor.
    pub depth: usize,
    pub current_word: String,
    pub in_string: bool,
    pub after_colon: bool,
    /// Keys of the enclosing objects, outermost first.
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_key: Option<String>,
    pub in_pipeline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<String>,
    /// Depth relative to the stage object (1 = directly inside the stage body).
    pub stage_depth: usize,
    pub in_array: bool,
    pub expects_field_path: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
}

impl MongoContext {
    pub fn empty() -> Self {
        Self {
            kind: MongoContextKind::Unknown,
            depth: 0,
            current_word: String::new(),
            in_string: false,
            after_colon: false,
            path: Vec::new(),
            current_key: None,
            in_pipeline: false,
            current_stage: None,
            stage_depth: 0,
            in_array: false,
            expects_field_path: false,
            collection: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SqlCompletionResult {
    /// Byte offset where the replaced range begins (cursor minus current word).
    pub insert_from: usize,
    pub should_show: bool,
    pub candidates: Vec<CompletionItem>,
    pub context: SqlContext,
    /// Error message if the request could not be processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SqlCompletionResult {
    pub fn empty(context: SqlContext, insert_from: usize) -> Self {
        Self {
            insert_from,
            should_show: false,
            candidates: Vec::new(),
            context,
            error: None,
        }
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            insert_from: 0,
            should_show: false,
            candidates: Vec::new(),
            context: SqlContext::empty(),
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MongoCompletionResult {
    pub insert_from: usize,
    pub should_show: bool,
    pub candidates: Vec<CompletionItem>,
    pub context: MongoContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MongoCompletionResult {
    pub fn empty(context: MongoContext, insert_from: usize) -> Self {
        Self {
            insert_from,
            should_show: false,
            candidates: Vec::new(),
            context,
            error: None,
        }
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            insert_from: 0,
            should_show: false,
            candidates: Vec::new(),
            context: MongoContext::empty(),
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_serializes_camel_case_and_skips_none() {
        let item = CompletionItem::new("users", CompletionItemKind::JoinCondition)
            .with_insert_text("users u");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["kind"], "joinCondition");
        assert_eq!(json["insertText"], "users u");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_mongo_kind_snake_case() {
        let json = serde_json::to_string(&MongoContextKind::GroupAccumulator).unwrap();
        assert_eq!(json, "\"group_accumulator\"");
    }

    #[test]
    fn test_qualifier_target_tagged() {
        let target = QualifierTarget::Table {
            schema: None,
            table: "users".to_string(),
        };
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["type"], "table");
        assert_eq!(json["table"], "users");
    }

    #[test]
    fn test_from_error_has_no_candidates() {
        let result = SqlCompletionResult::from_error("boom");
        assert!(!result.should_show);
        assert!(result.candidates.is_empty());
        assert_eq!(result.error.as_deref(), Some("boom"));
    }
}
