//! SQL candidate generators.
//!
//! Each generator reads the resolved [`SqlContext`] and the metadata
//! snapshot and appends prefix-matching items. Ranking and limiting happen
//! afterwards in [`crate::ranking::apply_smart_limits`].

use std::collections::HashSet;

use super::data_types::data_types_for;
use super::functions::{functions_for, functions_in_category, FunctionCategory};
use super::keywords::{
    is_reserved, keywords_after, CASE_KEYWORDS, LITERAL_KEYWORDS, WINDOW_KEYWORDS,
};
use super::operators::{operators_for, TypeCategory};
use super::snippets::SNIPPETS;
use crate::ranking::{matches_prefix, SCORE_CONTEXT_MATCH, SCORE_IN_SCOPE};
use crate::types::{
    ColumnMeta, CompletionItem, CompletionItemKind, Dialect, ExpectedType, ForeignKeyEdge,
    QualifierTarget, SqlClause, SqlContext, SqlMetadata, TableRef,
};

/// Runs the generators selected by the context's expected type.
pub(crate) fn generate(
    ctx: &SqlContext,
    metadata: &SqlMetadata,
    dialect: Dialect,
) -> Vec<CompletionItem> {
    let mut generator = Generator {
        ctx,
        metadata,
        dialect,
        prefix: &ctx.current_word,
        out: Vec::new(),
    };

    if let Some(target) = &ctx.qualifier_target {
        generator.qualified(target);
        return generator.out;
    }

    match ctx.expected {
        ExpectedType::Column => {
            generator.columns();
            generator.functions();
            generator.aliases();
        }
        ExpectedType::ColumnOrExpression => {
            generator.columns();
            generator.functions();
            generator.aliases();
            if ctx.clause == SqlClause::Select {
                generator.push(
                    CompletionItem::new("*", CompletionItemKind::Column)
                        .with_detail("all columns"),
                );
            }
            generator.keywords(ctx.clause);
            generator.snippets();
        }
        ExpectedType::TableOrSchema => {
            generator.tables();
            generator.schemas();
            generator.ctes();
        }
        ExpectedType::JoinCondition => {
            generator.join_conditions();
            generator.columns();
            generator.aliases();
        }
        ExpectedType::Value => {
            generator.enum_values();
            generator.literals();
            generator.columns();
            generator.functions();
        }
        ExpectedType::Keyword => {
            generator.keywords(ctx.clause);
            generator.operators();
            if ctx.in_case {
                generator.fixed_keywords(CASE_KEYWORDS);
            }
            if ctx.in_window {
                generator.fixed_keywords(WINDOW_KEYWORDS);
            }
            generator.snippets();
            if ctx.previous_token.as_deref() == Some("(")
                && ctx.previous_keyword.as_deref() == Some("IN")
            {
                generator.enum_values();
            }
        }
        ExpectedType::Function => generator.functions(),
        ExpectedType::DataType => generator.data_types(),
        ExpectedType::Any => {
            generator.keywords(SqlClause::Unknown);
            generator.snippets();
            if !generator.prefix.is_empty() {
                generator.tables();
                generator.columns();
                generator.functions();
            }
        }
    }

    generator.out
}

struct Generator<'a> {
    ctx: &'a SqlContext,
    metadata: &'a SqlMetadata,
    dialect: Dialect,
    prefix: &'a str,
    out: Vec<CompletionItem>,
}

impl<'a> Generator<'a> {
    fn push(&mut self, item: CompletionItem) {
        if matches_prefix(&item.label, self.prefix) {
            self.out.push(item);
        }
    }

    fn qualified(&mut self, target: &QualifierTarget) {
        match target {
            QualifierTarget::Cte { name } => {
                for item in self.cte_columns(name).into_iter().flatten() {
                    self.push(item.boosted(SCORE_IN_SCOPE));
                }
            }
            QualifierTarget::Table { schema, table } => {
                for item in self
                    .relation_columns(schema.as_deref(), table)
                    .into_iter()
                    .flatten()
                {
                    self.push(item.boosted(SCORE_IN_SCOPE));
                }
            }
            QualifierTarget::Schema { name } => {
                let tables: Vec<CompletionItem> = self
                    .metadata
                    .tables
                    .iter()
                    .filter(|table| {
                        table
                            .schema
                            .as_deref()
                            .is_some_and(|schema| schema.eq_ignore_ascii_case(name))
                    })
                    .map(|table| {
                        let item = CompletionItem::new(&table.name, CompletionItemKind::Table)
                            .with_detail(format!("{name}.{}", table.name));
                        match table.row_count {
                            Some(rows) => item.with_info(format!("~{rows} rows")),
                            None => item,
                        }
                    })
                    .collect();
                for item in tables {
                    self.push(item);
                }
            }
        }
    }

    fn columns(&mut self) {
        let ctx = self.ctx;
        let qualify = ctx.tables_in_scope.len() > 1;
        let mut resolved = false;

        for table in &ctx.tables_in_scope {
            let Some(items) = self.relation_columns(table.schema.as_deref(), &table.table) else {
                continue;
            };
            resolved = true;
            for item in items {
                if qualify {
                    let mut qualified = item.clone();
                    qualified.label = format!("{}.{}", table.reference_name(), item.label);
                    self.push(qualified);
                }
                self.push(item.boosted(SCORE_IN_SCOPE));
            }
        }

        if resolved {
            return;
        }

        // Nothing in scope resolves: offer every known column.
        let this = &*self;
        let all: Vec<CompletionItem> = this
            .metadata
            .columns
            .iter()
            .flat_map(|(key, columns)| {
                columns
                    .iter()
                    .map(move |column| this.column_item(column, key))
            })
            .chain(
                ctx.ctes_in_scope
                    .iter()
                    .flat_map(|cte| this.cte_columns(&cte.name).into_iter().flatten()),
            )
            .collect();
        for item in all {
            self.push(item);
        }
    }

    fn aliases(&mut self) {
        let aliases: Vec<CompletionItem> = self
            .ctx
            .tables_in_scope
            .iter()
            .filter_map(|table| {
                table.alias.as_ref().map(|alias| {
                    CompletionItem::new(alias, CompletionItemKind::Alias)
                        .with_detail(format!("alias for {}", table.table))
                })
            })
            .collect();
        for item in aliases {
            self.push(item);
        }
    }

    fn tables(&mut self) {
        let items: Vec<CompletionItem> = self
            .metadata
            .tables
            .iter()
            .map(|table| {
                let detail = match &table.schema {
                    Some(schema) => format!("{schema}.{}", table.name),
                    None => "table".to_string(),
                };
                let mut item =
                    CompletionItem::new(&table.name, CompletionItemKind::Table).with_detail(detail);
                if let Some(rows) = table.row_count {
                    item = item.with_info(format!("~{rows} rows"));
                }
                let in_scope = self
                    .ctx
                    .tables_in_scope
                    .iter()
                    .any(|scoped| same_relation(scoped, table.schema.as_deref(), &table.name));
                if in_scope {
                    item = item.boosted(SCORE_IN_SCOPE);
                }
                item
            })
            .collect();
        for item in items {
            self.push(item);
        }
    }

    fn schemas(&mut self) {
        let items: Vec<CompletionItem> = self
            .metadata
            .schemas
            .iter()
            .map(|schema| CompletionItem::new(schema, CompletionItemKind::Schema).with_detail("schema"))
            .collect();
        for item in items {
            self.push(item);
        }
    }

    fn ctes(&mut self) {
        let items: Vec<CompletionItem> = self
            .ctx
            .ctes_in_scope
            .iter()
            .map(|cte| {
                let item = CompletionItem::new(&cte.name, CompletionItemKind::Cte)
                    .with_detail("CTE")
                    .boosted(SCORE_IN_SCOPE);
                if cte.columns.is_empty() {
                    item
                } else {
                    item.with_info(cte.columns.join(", "))
                }
            })
            .collect();
        for item in items {
            self.push(item);
        }
    }

    /// `a.x = b.y` for every foreign key between two relations in scope.
    fn join_conditions(&mut self) {
        let tables = &self.ctx.tables_in_scope;
        if tables.len() < 2 {
            return;
        }
        let mut items = Vec::new();
        for edge in &self.metadata.foreign_keys {
            let sources = tables
                .iter()
                .enumerate()
                .filter(|(_, t)| same_relation(t, edge.source_schema.as_deref(), &edge.source_table));
            for (src_idx, source) in sources {
                let targets = tables.iter().enumerate().filter(|(idx, t)| {
                    *idx != src_idx
                        && same_relation(t, edge.target_schema.as_deref(), &edge.target_table)
                });
                for (_, target) in targets {
                    let left = format!("{}.{}", source.reference_name(), edge.source_column);
                    let right = format!("{}.{}", target.reference_name(), edge.target_column);
                    let detail = edge
                        .constraint_name
                        .clone()
                        .unwrap_or_else(|| "foreign key".to_string());
                    items.push(
                        CompletionItem::new(format!("{left} = {right}"), CompletionItemKind::JoinCondition)
                            .with_detail(detail.clone()),
                    );
                    items.push(
                        CompletionItem::new(format!("{right} = {left}"), CompletionItemKind::JoinCondition)
                            .with_detail(detail),
                    );
                }
            }
        }
        for item in items {
            self.push(item);
        }
    }

    fn enum_values(&mut self) {
        let Some(name) = self.ctx.previous_identifier.as_deref() else {
            return;
        };
        let Some(column) = self.find_column(name) else {
            return;
        };
        for value in &column.enum_values {
            if !matches_prefix(value, self.prefix) {
                continue;
            }
            let label = format!("'{}'", value.replace('\'', "''"));
            let mut item = CompletionItem::new(label, CompletionItemKind::Value)
                .with_detail(format!("{} value", column.name))
                .boosted(SCORE_CONTEXT_MATCH);
            if self.ctx.in_string {
                item = item.with_insert_text(value.clone());
            }
            // Matched on the raw value above.
            self.out.push(item);
        }
    }

    fn literals(&mut self) {
        for (name, description, dialects) in LITERAL_KEYWORDS {
            if dialects.contains(self.dialect) {
                self.push(
                    CompletionItem::new(*name, CompletionItemKind::Keyword).with_detail(*description),
                );
            }
        }
    }

    fn functions(&mut self) {
        let bonus = match self.ctx.clause {
            SqlClause::Having => SCORE_CONTEXT_MATCH,
            SqlClause::Select | SqlClause::OrderBy if self.ctx.has_group_by => SCORE_CONTEXT_MATCH,
            SqlClause::Where => -SCORE_CONTEXT_MATCH,
            _ => 0,
        };
        let aggregates: HashSet<String> = if bonus == 0 {
            HashSet::new()
        } else {
            functions_in_category(self.dialect, FunctionCategory::Aggregate)
                .iter()
                .map(|item| item.label.clone())
                .collect()
        };

        let functions = functions_for(self.dialect);
        for item in functions.iter() {
            if !matches_prefix(&item.label, self.prefix) {
                continue;
            }
            let item = item.clone();
            if aggregates.contains(&item.label) {
                self.out.push(item.boosted(bonus));
            } else {
                self.out.push(item);
            }
        }
    }

    fn keywords(&mut self, clause: SqlClause) {
        for rule in keywords_after(clause, self.dialect) {
            self.push(CompletionItem::new(rule.name, CompletionItemKind::Keyword).with_detail(rule.description));
        }
    }

    fn fixed_keywords(&mut self, keywords: &[(&str, &str)]) {
        for (name, description) in keywords {
            self.push(CompletionItem::new(*name, CompletionItemKind::Keyword).with_detail(*description));
        }
    }

    /// Operators after a complete operand, filtered by the operand's column type.
    fn operators(&mut self) {
        let operand_clause = matches!(
            self.ctx.clause,
            SqlClause::Select | SqlClause::Where | SqlClause::Having | SqlClause::On | SqlClause::Set
        );
        let Some(name) = self.ctx.previous_identifier.as_deref() else {
            return;
        };
        if !operand_clause
            || self.ctx.previous_token.as_deref() != Some(name)
            || is_reserved(name)
        {
            return;
        }
        let category = self
            .find_column(name)
            .and_then(|column| column.data_type.as_deref())
            .map(TypeCategory::of_data_type);
        for spec in operators_for(category, self.dialect) {
            self.push(CompletionItem::new(spec.symbol, CompletionItemKind::Operator).with_detail(spec.description));
        }
    }

    fn snippets(&mut self) {
        let clause = self.ctx.clause;
        for spec in SNIPPETS {
            if spec.dialects.contains(self.dialect) && spec.clauses.contains(&clause) {
                self.push(
                    CompletionItem::new(spec.label, CompletionItemKind::Snippet)
                        .with_detail(spec.description)
                        .with_insert_text(spec.template),
                );
            }
        }
    }

    fn data_types(&mut self) {
        for name in data_types_for(self.dialect) {
            self.push(CompletionItem::new(name, CompletionItemKind::DataType));
        }
    }

    /// Column items of a table or CTE, or `None` when the relation is unknown.
    fn relation_columns(&self, schema: Option<&str>, table: &str) -> Option<Vec<CompletionItem>> {
        if schema.is_none() {
            if let Some(items) = self.cte_columns(table) {
                return Some(items);
            }
        }
        let (key, columns) = find_columns(self.metadata, schema, table)?;
        Some(
            columns
                .iter()
                .map(|column| self.column_item(column, key))
                .collect(),
        )
    }

    fn cte_columns(&self, name: &str) -> Option<Vec<CompletionItem>> {
        let cte = self
            .ctx
            .ctes_in_scope
            .iter()
            .find(|cte| cte.name.eq_ignore_ascii_case(name))?;
        Some(
            cte.columns
                .iter()
                .map(|column| {
                    CompletionItem::new(column, CompletionItemKind::Column)
                        .with_detail(format!("{} (CTE)", cte.name))
                })
                .collect(),
        )
    }

    fn column_item(&self, column: &ColumnMeta, table_key: &str) -> CompletionItem {
        let detail = match &column.data_type {
            Some(data_type) => format!("{data_type} ({table_key})"),
            None => table_key.to_string(),
        };
        let item = CompletionItem::new(&column.name, CompletionItemKind::Column).with_detail(detail);
        let info = column_info(column, table_key, &self.metadata.foreign_keys);
        if info.is_empty() {
            item
        } else {
            item.with_info(info)
        }
    }

    /// Column metadata by name, preferring relations in scope.
    fn find_column(&self, name: &str) -> Option<&'a ColumnMeta> {
        let scoped = self.ctx.tables_in_scope.iter().find_map(|table| {
            find_columns(self.metadata, table.schema.as_deref(), &table.table)
                .and_then(|(_, columns)| columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
        });
        scoped.or_else(|| {
            self.metadata
                .columns
                .values()
                .flatten()
                .find(|c| c.name.eq_ignore_ascii_case(name))
        })
    }
}

/// Looks up the columns of `table`: `schema.table` first, then the bare
/// table key, then any `*.table` key when no schema was given.
fn find_columns<'m>(
    metadata: &'m SqlMetadata,
    schema: Option<&str>,
    table: &str,
) -> Option<(&'m str, &'m [ColumnMeta])> {
    let mut exact = None;
    let mut bare = None;
    let mut suffixed = None;
    for (key, columns) in &metadata.columns {
        let entry = (key.as_str(), columns.as_slice());
        match key.rsplit_once('.') {
            Some((key_schema, key_table)) if key_table.eq_ignore_ascii_case(table) => match schema {
                Some(schema) if schema.eq_ignore_ascii_case(key_schema) => {
                    exact.get_or_insert(entry);
                }
                Some(_) => {}
                None => {
                    suffixed.get_or_insert(entry);
                }
            },
            None if key.eq_ignore_ascii_case(table) => {
                bare.get_or_insert(entry);
            }
            _ => {}
        }
    }
    exact.or(bare).or(suffixed)
}

fn same_relation(table: &TableRef, schema: Option<&str>, name: &str) -> bool {
    if !table.table.eq_ignore_ascii_case(name) {
        return false;
    }
    match (table.schema.as_deref(), schema) {
        (Some(left), Some(right)) => left.eq_ignore_ascii_case(right),
        _ => true,
    }
}

/// `PK, NOT NULL, default now(), FK -> users.id`
fn column_info(column: &ColumnMeta, table_key: &str, foreign_keys: &[ForeignKeyEdge]) -> String {
    let mut parts = Vec::new();
    if column.is_primary_key {
        parts.push("PK".to_string());
    }
    if !column.nullable {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &column.default_value {
        parts.push(format!("default {default}"));
    }
    let table = table_key.rsplit('.').next().unwrap_or(table_key);
    let edge = foreign_keys.iter().find(|edge| {
        edge.source_table.eq_ignore_ascii_case(table)
            && edge.source_column.eq_ignore_ascii_case(&column.name)
    });
    if let Some(edge) = edge {
        parts.push(format!("FK -> {}.{}", edge.target_table, edge.target_column));
    } else if column.is_foreign_key {
        parts.push("FK".to_string());
    }
    parts.join(", ")
}
