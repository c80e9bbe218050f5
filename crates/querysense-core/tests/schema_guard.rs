use querysense_core::{
    MongoCompletionRequest, MongoCompletionResult, SqlCompletionRequest, SqlCompletionResult,
};
use schemars::generate::SchemaSettings;
use serde_json::{json, Value};

fn generate_schema() -> Value {
    let settings = SchemaSettings::draft07();
    let generator = settings.into_generator();
    json!({
        "SqlCompletionRequest": generator.clone().into_root_schema_for::<SqlCompletionRequest>(),
        "SqlCompletionResult": generator.clone().into_root_schema_for::<SqlCompletionResult>(),
        "MongoCompletionRequest": generator.clone().into_root_schema_for::<MongoCompletionRequest>(),
        "MongoCompletionResult": generator.into_root_schema_for::<MongoCompletionResult>(),
    })
}

fn properties<'a>(schema: &'a Value, name: &str) -> &'a serde_json::Map<String, Value> {
    schema[name]["properties"]
        .as_object()
        .unwrap_or_else(|| panic!("{name} has no properties"))
}

#[test]
fn request_fields_are_camel_case() {
    let schema = generate_schema();
    for name in ["SqlCompletionRequest", "MongoCompletionRequest"] {
        let props = properties(&schema, name);
        assert!(props.contains_key("text"));
        assert!(props.contains_key("cursorOffset"), "{name}");
        assert!(props.contains_key("metadata"));
        assert!(props.contains_key("options"));
    }
    assert!(properties(&schema, "SqlCompletionRequest").contains_key("dialect"));
}

#[test]
fn result_fields_are_stable() {
    let schema = generate_schema();
    for name in ["SqlCompletionResult", "MongoCompletionResult"] {
        let props = properties(&schema, name);
        for field in ["insertFrom", "shouldShow", "candidates", "context", "error"] {
            assert!(props.contains_key(field), "{name} lacks {field}");
        }
        let required: Vec<&str> = schema[name]["required"]
            .as_array()
            .map(|values| values.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        assert!(!required.contains(&"error"), "{name} error must be optional");
    }
}

#[test]
fn schema_serializes() {
    let generated = generate_schema();
    let text = serde_json::to_string_pretty(&generated).expect("serialize schema");
    assert!(text.contains("joinCondition"));
    assert!(text.contains("group_accumulator"));
}

#[test]
#[ignore]
fn print_api_schema() {
    let generated = generate_schema();

    println!(
        "{}",
        serde_json::to_string_pretty(&generated).expect("serialize schema")
    );
}
