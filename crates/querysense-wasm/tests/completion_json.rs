use querysense_wasm::{complete_mongo_json, complete_sql_json};
use serde_json::Value;

fn labels(result: &Value) -> Vec<String> {
    result["candidates"]
        .as_array()
        .expect("candidates array")
        .iter()
        .filter_map(|item| item["label"].as_str().map(str::to_string))
        .collect()
}

#[test]
fn sql_qualifier_limits_to_alias_columns() {
    let request = serde_json::json!({
        "text": "SELECT t. FROM users t",
        "cursorOffset": 9,
        "dialect": "postgres",
        "metadata": {
            "tables": [{ "name": "users" }, { "name": "orders" }],
            "columns": {
                "users": [
                    { "name": "id", "dataType": "integer" },
                    { "name": "email", "dataType": "varchar" }
                ],
                "orders": [{ "name": "total", "dataType": "numeric" }]
            }
        }
    });

    let result: Value =
        serde_json::from_str(&complete_sql_json(&request.to_string())).expect("valid JSON");

    assert_eq!(result["context"]["qualifierTarget"]["type"], "table");
    assert_eq!(labels(&result), vec!["email", "id"]);
    assert!(result["candidates"]
        .as_array()
        .expect("candidates")
        .iter()
        .all(|item| item["kind"] == "column"));
}

#[test]
fn sql_utf16_offsets_are_converted_both_ways() {
    // 'é' is one UTF-16 code unit and two UTF-8 bytes
    let text = "SELECT 'é' AS x FROM us";
    let utf16_cursor = text.encode_utf16().count();
    let request = serde_json::json!({
        "text": text,
        "cursorOffset": utf16_cursor,
        "encoding": "utf16",
        "metadata": { "tables": [{ "name": "users" }] }
    });

    let result: Value =
        serde_json::from_str(&complete_sql_json(&request.to_string())).expect("valid JSON");

    assert!(result.get("error").is_none(), "{result}");
    assert_eq!(result["insertFrom"], utf16_cursor - 2);
    assert_eq!(result["context"]["statementSpan"]["end"], utf16_cursor);
    assert_eq!(labels(&result), vec!["users"]);
}

#[test]
fn sql_utf16_cursor_inside_surrogate_pair_is_an_error() {
    let request = serde_json::json!({
        "text": "SELECT '😀'",
        "cursorOffset": 9,
        "encoding": "utf16"
    });

    let result: Value =
        serde_json::from_str(&complete_sql_json(&request.to_string())).expect("valid JSON");

    assert!(result["error"].is_string());
    assert_eq!(result["shouldShow"], false);
}

#[test]
fn mongo_group_accumulators() {
    let text = r#"{"pipeline":[{"$group":{"_id":"$cat","total":{"#;
    let request = serde_json::json!({ "text": text, "cursorOffset": text.len() });

    let result: Value =
        serde_json::from_str(&complete_mongo_json(&request.to_string())).expect("valid JSON");

    assert_eq!(result["context"]["kind"], "group_accumulator");
    let labels = labels(&result);
    assert!(labels.iter().any(|label| label == "$sum"));
    assert!(!labels.iter().any(|label| label == "$match"));
}
