//! Answer files
//!
//! The questionnaire answers for a render come from a JSON or YAML file
//! holding one flat object of field name to value.

use std::fs;
use std::path::Path;

use eyre::{Context, Result, eyre};
use letterrender::FieldValues;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Load answers, choosing the parser from the file extension
///
/// `.yml`/`.yaml` are read as YAML, anything else as JSON.
pub fn load_answers(path: &Path) -> Result<FieldValues> {
    debug!(?path, "load_answers: called");
    let content = fs::read_to_string(path).context(format!("Failed to read answers {}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    );
    let value: JsonValue = if is_yaml {
        debug!("load_answers: parsing as YAML");
        serde_yaml::from_str(&content).context(format!("Failed to parse answers {}", path.display()))?
    } else {
        debug!("load_answers: parsing as JSON");
        serde_json::from_str(&content).context(format!("Failed to parse answers {}", path.display()))?
    };

    from_value(value).context(format!("Invalid answers in {}", path.display()))
}

/// Convert a parsed document into field values
pub fn from_value(value: JsonValue) -> Result<FieldValues> {
    match value {
        JsonValue::Object(map) => Ok(map.into_iter().collect()),
        JsonValue::Null => Ok(FieldValues::new()),
        other => Err(eyre!("expected an object of field values, found {}", kind_name(&other))),
    }
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "a list",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        fs::write(&path, r#"{"name": "Alex", "deposit": 1200}"#).unwrap();

        let values = load_answers(&path).unwrap();
        assert_eq!(values.get("deposit"), Some(&json!(1200)));
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.yml");
        fs::write(&path, "name: Alex\nstart_date: \"2023-06-01\"\ndeposit: 1200.50\n").unwrap();

        let values = load_answers(&path).unwrap();
        assert_eq!(values.get("name"), Some(&json!("Alex")));
        assert_eq!(values.get("start_date"), Some(&json!("2023-06-01")));
        assert_eq!(values.get("deposit"), Some(&json!(1200.5)));
    }

    #[test]
    fn test_rejects_non_object() {
        let err = from_value(json!(["a", "b"])).unwrap_err();
        assert!(err.to_string().contains("a list"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_answers(Path::new("/nonexistent/answers.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read answers"));
    }
}
