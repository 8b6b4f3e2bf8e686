//! Declarative shape of the model's structured reply.
//!
//! The same declaration is rendered into the request's `responseSchema` and
//! used to check the parsed reply locally.

use serde_json::{Map, Value, json};

use crate::types::PolicyStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String {
        description: Option<&'static str>,
        allowed: Option<Vec<&'static str>>,
    },
    Array(Box<Schema>),
    Object(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

impl Field {
    pub fn required(name: &'static str, schema: Schema) -> Self {
        Self {
            name,
            schema,
            required: true,
        }
    }
}

impl Schema {
    pub fn string() -> Self {
        Schema::String {
            description: None,
            allowed: None,
        }
    }

    pub fn described(description: &'static str) -> Self {
        Schema::String {
            description: Some(description),
            allowed: None,
        }
    }

    pub fn one_of(description: &'static str, allowed: Vec<&'static str>) -> Self {
        Schema::String {
            description: Some(description),
            allowed: Some(allowed),
        }
    }

    pub fn array_of(item: Schema) -> Self {
        Schema::Array(Box::new(item))
    }

    /// Render in the OpenAPI subset accepted by `generationConfig.responseSchema`.
    pub fn to_response_schema(&self) -> Value {
        match self {
            Schema::String {
                description,
                allowed,
            } => {
                let mut out = Map::new();
                out.insert("type".into(), json!("STRING"));
                if let Some(description) = description {
                    out.insert("description".into(), json!(description));
                }
                if let Some(allowed) = allowed {
                    out.insert("enum".into(), json!(allowed));
                }
                Value::Object(out)
            }
            Schema::Array(item) => json!({
                "type": "ARRAY",
                "items": item.to_response_schema(),
            }),
            Schema::Object(fields) => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|f| (f.name.to_string(), f.schema.to_response_schema()))
                    .collect();
                let required: Vec<&str> = fields
                    .iter()
                    .filter(|f| f.required)
                    .map(|f| f.name)
                    .collect();
                json!({
                    "type": "OBJECT",
                    "properties": properties,
                    "required": required,
                })
            }
        }
    }

    /// Check `value` against the declaration. The error names the JSON path of
    /// the first violation.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), String> {
        match self {
            Schema::String { allowed, .. } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("{path}: expected string, got {}", kind(value)))?;
                if let Some(allowed) = allowed
                    && !allowed.contains(&text)
                {
                    return Err(format!(
                        "{path}: '{text}' is not one of {}",
                        allowed.join(", ")
                    ));
                }
                Ok(())
            }
            Schema::Array(item) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| format!("{path}: expected array, got {}", kind(value)))?;
                items
                    .iter()
                    .enumerate()
                    .try_for_each(|(i, v)| item.validate_at(v, &format!("{path}[{i}]")))
            }
            Schema::Object(fields) => {
                let object = value
                    .as_object()
                    .ok_or_else(|| format!("{path}: expected object, got {}", kind(value)))?;
                for field in fields {
                    let field_path = format!("{path}.{}", field.name);
                    match object.get(field.name) {
                        Some(Value::Null) | None if field.required => {
                            return Err(format!("{field_path}: required field is missing"));
                        }
                        Some(Value::Null) | None => {}
                        Some(v) => field.schema.validate_at(v, &field_path)?,
                    }
                }
                Ok(())
            }
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Shape of [`crate::types::AnalysisResult`] on the wire.
pub fn analysis_schema() -> Schema {
    Schema::Object(vec![
        Field::required(
            "visualHook",
            Schema::described("The identified visual hook from first 3 seconds."),
        ),
        Field::required(
            "youtube",
            Schema::Object(vec![
                Field::required("title", Schema::string()),
                Field::required("description", Schema::string()),
                Field::required("tags", Schema::string()),
            ]),
        ),
        Field::required(
            "tiktok",
            Schema::Object(vec![
                Field::required("captions", Schema::array_of(Schema::string())),
                Field::required("hashtags", Schema::array_of(Schema::string())),
            ]),
        ),
        Field::required(
            "facebook",
            Schema::Object(vec![Field::required("caption", Schema::string())]),
        ),
        Field::required(
            "policyCheck",
            Schema::Object(vec![
                Field::required(
                    "status",
                    Schema::one_of(
                        "Safe, Warning, or Violation",
                        PolicyStatus::ALL.iter().map(|s| s.as_str()).collect(),
                    ),
                ),
                Field::required("notes", Schema::string()),
            ]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_reply() -> Value {
        json!({
            "visualHook": "A cat jumps into a box",
            "youtube": {"title": "t", "description": "d", "tags": "cats, boxes"},
            "tiktok": {"captions": ["a", "b", "c"], "hashtags": ["#cat"]},
            "facebook": {"caption": "f"},
            "policyCheck": {"status": "Safe", "notes": ""}
        })
    }

    #[test]
    fn test_response_schema_rendering() {
        let rendered = analysis_schema().to_response_schema();
        assert_eq!(rendered["type"], "OBJECT");
        assert_eq!(
            rendered["required"],
            json!(["visualHook", "youtube", "tiktok", "facebook", "policyCheck"])
        );
        assert_eq!(
            rendered["properties"]["tiktok"]["properties"]["captions"]["items"]["type"],
            "STRING"
        );
        assert_eq!(
            rendered["properties"]["policyCheck"]["properties"]["status"]["enum"],
            json!(["Safe", "Warning", "Violation"])
        );
    }

    #[test]
    fn test_valid_reply_passes() {
        assert!(analysis_schema().validate(&valid_reply()).is_ok());
    }

    #[test]
    fn test_missing_nested_field_is_reported_by_path() {
        let mut reply = valid_reply();
        reply["youtube"].as_object_mut().unwrap().remove("tags");
        let err = analysis_schema().validate(&reply).unwrap_err();
        assert_eq!(err, "$.youtube.tags: required field is missing");
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        let mut reply = valid_reply();
        reply["tiktok"]["captions"] = json!(["ok", 3]);
        let err = analysis_schema().validate(&reply).unwrap_err();
        assert!(err.starts_with("$.tiktok.captions[1]: expected string"));
    }

    #[test]
    fn test_unknown_policy_status_is_rejected() {
        let mut reply = valid_reply();
        reply["policyCheck"]["status"] = json!("Fine");
        let err = analysis_schema().validate(&reply).unwrap_err();
        assert!(err.contains("'Fine' is not one of Safe, Warning, Violation"));
    }
}
