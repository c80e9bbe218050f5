//! MongoDB candidate generators, dispatched on the context kind.

use super::catalog::{
    is_update_operator, stage_options, MongoSnippet, OperatorSpec, ACCUMULATORS, BOOLEAN_KEYS,
    COLLECTION_KEYS, EXPRESSIONS, PIPELINE_SNIPPETS, QUERY_OPERATORS, ROOT_PROPERTIES,
    ROOT_SNIPPETS, STAGES, SYSTEM_VARIABLES, UPDATE_OPERATORS,
};
use crate::ranking::{matches_prefix, SCORE_CONTEXT_MATCH};
use crate::types::{
    CompletionItem, CompletionItemKind, CompletionLimits, FieldInfo, MongoContext,
    MongoContextKind, MongoMetadata,
};

pub(crate) fn generate(
    ctx: &MongoContext,
    metadata: &MongoMetadata,
    limits: &CompletionLimits,
) -> Vec<CompletionItem> {
    let mut generator = Generator {
        ctx,
        metadata,
        limits,
        out: Vec::new(),
    };
    let value_position = ctx.after_colon || ctx.in_array;

    match ctx.kind {
        MongoContextKind::Root => {
            generator.keys(ROOT_PROPERTIES);
            generator.snippets(ROOT_SNIPPETS);
        }
        MongoContextKind::Pipeline => {
            generator.stages(true);
            generator.snippets(PIPELINE_SNIPPETS);
        }
        MongoContextKind::Stage => generator.stages(false),
        MongoContextKind::StageBody => {
            if value_position {
                generator.expression_values();
            } else {
                let stage = ctx.current_stage.as_deref().unwrap_or_default();
                let options: Vec<(&str, &str)> = stage_options(stage)
                    .iter()
                    .map(|option| (*option, "stage option"))
                    .collect();
                generator.keys(&options);
                generator.operators(EXPRESSIONS, CompletionItemKind::Expression);
            }
        }
        MongoContextKind::Group => {
            generator.push(
                CompletionItem::new("_id", CompletionItemKind::Field)
                    .with_detail("group key")
                    .boosted(SCORE_CONTEXT_MATCH),
            );
            generator.field_names();
        }
        MongoContextKind::GroupAccumulator => {
            if value_position {
                generator.expression_values();
            } else {
                generator.operators(ACCUMULATORS, CompletionItemKind::Accumulator);
            }
        }
        MongoContextKind::ProjectExpr => {
            if value_position {
                generator.expression_values();
                if ctx.current_stage.as_deref() == Some("$project") && ctx.stage_depth == 1 {
                    generator.values(&[("1", "include"), ("0", "exclude")]);
                }
            } else {
                if ctx.stage_depth == 1 {
                    generator.field_names();
                }
                generator.operators(EXPRESSIONS, CompletionItemKind::Expression);
            }
        }
        MongoContextKind::Query => {
            if value_position && ctx.expects_field_path {
                generator.expression_values();
            } else if value_position {
                generator.values(&[("true", "boolean"), ("false", "boolean"), ("null", "null")]);
            } else {
                generator.operators(QUERY_OPERATORS, CompletionItemKind::Operator);
                generator.field_names();
            }
        }
        MongoContextKind::Update => {
            let under_operator = ctx
                .path
                .last()
                .is_some_and(|segment| is_update_operator(segment));
            if value_position {
                generator.values(&[("1", "number"), ("true", "boolean"), ("null", "null")]);
            } else if under_operator {
                generator.field_names();
            } else {
                generator.operators(UPDATE_OPERATORS, CompletionItemKind::Operator);
            }
        }
        MongoContextKind::Sort => {
            if value_position {
                generator.values(&[("1", "ascending"), ("-1", "descending")]);
            } else {
                generator.field_names();
            }
        }
        MongoContextKind::Projection => {
            if value_position {
                generator.values(&[("1", "include"), ("0", "exclude")]);
            } else {
                generator.field_names();
            }
        }
        MongoContextKind::Value => {
            let key = ctx.current_key.as_deref().unwrap_or_default();
            if COLLECTION_KEYS.contains(&key) {
                generator.collections();
            } else if BOOLEAN_KEYS.contains(&key) {
                generator.values(&[("true", "boolean"), ("false", "boolean")]);
            }
        }
        MongoContextKind::Unknown => {}
    }

    generator.out
}

struct Generator<'a> {
    ctx: &'a MongoContext,
    metadata: &'a MongoMetadata,
    limits: &'a CompletionLimits,
    out: Vec<CompletionItem>,
}

impl<'a> Generator<'a> {
    /// Adds the item when it matches the prefix, quoting string tokens typed
    /// outside a string literal.
    fn push(&mut self, item: CompletionItem) {
        if !matches_prefix(&item.label, &self.ctx.current_word) {
            return;
        }
        self.out.push(self.quoted(item));
    }

    fn quoted(&self, item: CompletionItem) -> CompletionItem {
        if self.ctx.in_string || item.insert_text.is_some() {
            return item;
        }
        match item.kind {
            CompletionItemKind::Snippet | CompletionItemKind::Value => item,
            _ => {
                let text = format!("\"{}\"", item.label);
                item.with_insert_text(text)
            }
        }
    }

    fn keys(&mut self, keys: &[(&str, &str)]) {
        for (name, description) in keys {
            self.push(CompletionItem::new(*name, CompletionItemKind::Keyword).with_detail(*description));
        }
    }

    fn operators(&mut self, catalog: &[OperatorSpec], kind: CompletionItemKind) {
        for spec in catalog {
            let item = CompletionItem::new(spec.name, kind).with_detail(spec.description);
            if spec.common {
                self.push(item.boosted(SCORE_CONTEXT_MATCH));
            } else {
                self.push(item);
            }
        }
    }

    /// Stage names. In pipeline position the whole stage document is inserted.
    fn stages(&mut self, as_document: bool) {
        for stage in STAGES {
            let spec = stage.spec;
            let mut item = CompletionItem::new(spec.name, CompletionItemKind::Stage)
                .with_detail(spec.description);
            if as_document {
                item = item.with_insert_text(format!("{{\"{}\": {}}}", spec.name, stage.body));
            }
            if spec.common {
                item = item.boosted(SCORE_CONTEXT_MATCH);
            }
            self.push(item);
        }
    }

    fn snippets(&mut self, snippets: &[MongoSnippet]) {
        for snippet in snippets {
            self.push(
                CompletionItem::new(snippet.label, CompletionItemKind::Snippet)
                    .with_detail(snippet.description)
                    .with_insert_text(snippet.template),
            );
        }
    }

    fn values(&mut self, values: &[(&str, &str)]) {
        for (value, description) in values {
            self.push(CompletionItem::new(*value, CompletionItemKind::Value).with_detail(*description));
        }
    }

    fn collections(&mut self) {
        let metadata = self.metadata;
        for name in &metadata.collections {
            self.push(CompletionItem::new(name, CompletionItemKind::Collection).with_detail("collection"));
        }
    }

    /// Field paths, expressions and system variables for an expression value.
    fn expression_values(&mut self) {
        if self.ctx.expects_field_path {
            self.field_paths();
        }
        self.operators(EXPRESSIONS, CompletionItemKind::Expression);
        for (name, description) in SYSTEM_VARIABLES {
            self.push(CompletionItem::new(*name, CompletionItemKind::Variable).with_detail(*description));
        }
    }

    /// Top-level and dotted nested field names of the scoped collection.
    fn field_names(&mut self) {
        for item in self.expanded_fields("", CompletionItemKind::Field) {
            self.push(item);
        }
    }

    /// `$field.path` references.
    fn field_paths(&mut self) {
        for item in self.expanded_fields("$", CompletionItemKind::FieldPath) {
            self.push(item);
        }
    }

    /// Every field expanded through its nested fields, then prefix-filtered
    /// and capped at `max_field_paths`.
    fn expanded_fields(&self, sigil: &str, kind: CompletionItemKind) -> Vec<CompletionItem> {
        let mut paths = Vec::new();
        for field in self.fields() {
            collect_paths(field, "", &mut paths);
        }
        let prefix = self.ctx.current_word.as_str();
        paths
            .into_iter()
            .map(|(path, field)| {
                CompletionItem::new(format!("{sigil}{path}"), kind).with_detail(type_label(field))
            })
            .filter(|item| matches_prefix(&item.label, prefix))
            .take(self.limits.max_field_paths)
            .collect()
    }

    /// Fields of the inferred collection, or of every collection when none
    /// was named.
    fn fields(&self) -> Vec<&'a FieldInfo> {
        let metadata: &'a MongoMetadata = self.metadata;
        let fields = &metadata.fields;
        match self.ctx.collection.as_ref().and_then(|name| fields.get(name)) {
            Some(known) => known.iter().collect(),
            None => fields.values().flatten().collect(),
        }
    }
}

fn collect_paths<'f>(field: &'f FieldInfo, parent: &str, out: &mut Vec<(String, &'f FieldInfo)>) {
    let path = if parent.is_empty() {
        field.name.clone()
    } else {
        format!("{parent}.{}", field.name)
    };
    for nested in &field.nested_fields {
        collect_paths(nested, &path, out);
    }
    out.push((path, field));
}

fn type_label(field: &FieldInfo) -> String {
    let base = field.field_type.as_deref().unwrap_or("any");
    if field.is_array {
        format!("{base}[]")
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mongo::context::mongo_context;

    fn field(name: &str, field_type: &str) -> FieldInfo {
        FieldInfo {
            name: name.into(),
            field_type: Some(field_type.into()),
            ..FieldInfo::default()
        }
    }

    fn metadata() -> MongoMetadata {
        let mut metadata = MongoMetadata {
            collections: vec!["orders".into(), "users".into()],
            ..MongoMetadata::default()
        };
        let address = FieldInfo {
            name: "address".into(),
            field_type: Some("object".into()),
            nested_fields: vec![field("city", "string"), field("zip", "string")],
            ..FieldInfo::default()
        };
        metadata.fields.insert(
            "orders".into(),
            vec![field("total", "double"), field("status", "string"), address],
        );
        metadata
            .fields
            .insert("users".into(), vec![field("email", "string")]);
        metadata
    }

    fn generate_at_end(text: &str) -> Vec<CompletionItem> {
        let ctx = mongo_context(text, text.len());
        generate(&ctx, &metadata(), &CompletionLimits::default())
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn test_field_paths_expand_nested_fields() {
        let items = generate_at_end(r#"{"aggregate":"orders","pipeline":[{"$group":{"_id":"$"#);
        let labels = labels(&items);
        assert!(labels.contains(&"$address.city"));
        assert!(labels.contains(&"$total"));
        assert!(!labels.contains(&"$email"));
    }

    #[test]
    fn test_field_paths_are_capped() {
        let mut metadata = metadata();
        metadata.fields.insert(
            "wide".into(),
            (0..40).map(|idx| field(&format!("f{idx}"), "int")).collect(),
        );
        let text = r#"{"aggregate":"wide","pipeline":[{"$project":{"x":"$f"#;
        let ctx = mongo_context(text, text.len());
        let items = generate(&ctx, &metadata, &CompletionLimits::default());
        let paths = items
            .iter()
            .filter(|item| item.kind == CompletionItemKind::FieldPath)
            .count();
        assert_eq!(paths, 20);
    }

    #[test]
    fn test_field_names_are_capped() {
        let mut metadata = metadata();
        metadata.fields.insert(
            "wide".into(),
            (0..60)
                .map(|idx| FieldInfo {
                    name: format!("f{idx}"),
                    nested_fields: vec![field("_id", "objectId")],
                    ..FieldInfo::default()
                })
                .collect(),
        );
        let text = r#"{"aggregate":"wide","pipeline":[{"$group":{""#;
        let ctx = mongo_context(text, text.len());
        let items = generate(&ctx, &metadata, &CompletionLimits::default());
        let fields = items
            .iter()
            .filter(|item| item.kind == CompletionItemKind::Field && item.label != "_id")
            .count();
        assert_eq!(fields, 20);
        assert!(items.iter().any(|item| item.label == "_id"));

        let text = r#"{"aggregate":"wide","pipeline":[{"$group":{"f5"#;
        let ctx = mongo_context(text, text.len());
        let items = generate(&ctx, &metadata, &CompletionLimits::default());
        assert!(items.iter().all(|item| item.label.starts_with("f5")));
        assert!(items.iter().any(|item| item.label == "f5._id"));
    }

    #[test]
    fn test_collection_names_for_command_value() {
        let items = generate_at_end(r#"{"find": "us"#);
        assert_eq!(labels(&items), vec!["users"]);
        assert_eq!(items[0].insert_text, None);
    }

    #[test]
    fn test_bare_keys_get_quoted_insert_text() {
        let items = generate_at_end("{fil");
        let filter = items.iter().find(|item| item.label == "filter").expect("filter");
        assert_eq!(filter.insert_text.as_deref(), Some("\"filter\""));
    }

    #[test]
    fn test_sort_values() {
        let items = generate_at_end(r#"{"find":"orders","sort":{"total":"#);
        assert_eq!(labels(&items), vec!["1", "-1"]);
    }

    #[test]
    fn test_update_fields_under_operator() {
        let items = generate_at_end(r#"{"update":"users","updates":[{"q":{},"u":{"$set":{""#);
        assert_eq!(labels(&items), vec!["email"]);

        let items = generate_at_end(r#"{"update":"users","updates":[{"q":{},"u":{""#);
        assert!(labels(&items).contains(&"$inc"));
    }

    #[test]
    fn test_pipeline_position_inserts_stage_document() {
        let items = generate_at_end(r#"{"aggregate":"orders","pipeline":["#);
        let limit = items.iter().find(|item| item.label == "$limit").expect("$limit");
        assert_eq!(limit.insert_text.as_deref(), Some(r#"{"$limit": 10}"#));
        assert!(labels(&items).contains(&"group-count"));
    }

    #[test]
    fn test_lookup_options() {
        let items = generate_at_end(r#"[{"$lookup":{"loc"#);
        assert!(labels(&items).contains(&"localField"));
    }
}
