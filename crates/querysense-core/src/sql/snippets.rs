use crate::types::{DialectSet, SqlClause};

#[derive(Debug, Clone, Copy)]
pub(crate) struct SnippetSpec {
    pub label: &'static str,
    pub template: &'static str,
    pub description: &'static str,
    /// Clauses the snippet is offered in. `Unknown` means statement start.
    pub clauses: &'static [SqlClause],
    pub dialects: DialectSet,
}

const START: &[SqlClause] = &[SqlClause::Unknown];
const EXPRESSION: &[SqlClause] = &[SqlClause::Select, SqlClause::Where, SqlClause::OrderBy];
const RELATION: &[SqlClause] = &[SqlClause::From, SqlClause::Join, SqlClause::On, SqlClause::Where];

pub(crate) static SNIPPETS: &[SnippetSpec] = &[
    SnippetSpec {
        label: "select-from",
        template: "SELECT *\nFROM ",
        description: "SELECT * FROM table",
        clauses: START,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "select-where",
        template: "SELECT *\nFROM table_name\nWHERE ",
        description: "SELECT with a WHERE filter",
        clauses: START,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "insert-values",
        template: "INSERT INTO table_name (column1, column2)\nVALUES (value1, value2)",
        description: "INSERT INTO ... VALUES",
        clauses: START,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "update-set",
        template: "UPDATE table_name\nSET column1 = value1\nWHERE ",
        description: "UPDATE ... SET ... WHERE",
        clauses: START,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "with-cte",
        template: "WITH cte_name AS (\n  SELECT \n)\nSELECT * FROM cte_name",
        description: "Common table expression",
        clauses: START,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "create-table",
        template: "CREATE TABLE table_name (\n  id INTEGER PRIMARY KEY,\n  \n)",
        description: "CREATE TABLE definition",
        clauses: START,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "case-when",
        template: "CASE WHEN condition THEN result ELSE other END",
        description: "CASE expression",
        clauses: EXPRESSION,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "left-join-on",
        template: "LEFT JOIN table_name ON ",
        description: "LEFT JOIN with condition",
        clauses: RELATION,
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "exists-subquery",
        template: "EXISTS (SELECT 1 FROM table_name WHERE )",
        description: "Correlated EXISTS test",
        clauses: &[SqlClause::Where, SqlClause::Having],
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "row-number-over",
        template: "ROW_NUMBER() OVER (PARTITION BY column ORDER BY column)",
        description: "Numbered rows per partition",
        clauses: &[SqlClause::Select],
        dialects: DialectSet::ALL,
    },
    SnippetSpec {
        label: "upsert",
        template: "ON CONFLICT (column) DO UPDATE SET column = EXCLUDED.column",
        description: "Insert or update on conflict",
        clauses: &[SqlClause::Values],
        dialects: DialectSet::POSTGRES.union(DialectSet::SQLITE),
    },
];
