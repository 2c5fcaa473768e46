//! Type-safe schema generation for OpenAI structured outputs.
//!
//! Uses the `schemars` crate to generate JSON schemas from Rust types,
//! then reshapes them for OpenAI's strict mode, which requires
//! `additionalProperties: false` on every object, every property listed
//! in `required`, and fully inlined schemas (no `$ref`).

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{JsonSchemaFormat, ResponseFormat};

/// Trait for types usable as OpenAI structured output.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned` type.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate an OpenAI strict-mode compatible JSON schema.
    fn openai_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        strictify(&mut value);

        let definitions = match &value {
            Value::Object(map) => map.get("definitions").cloned(),
            _ => None,
        };
        if let Some(definitions) = definitions {
            inline_refs(&mut value, &definitions);
        }

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }

        value
    }

    /// Ready-to-send `response_format` for this type.
    fn response_format() -> ResponseFormat {
        ResponseFormat {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: <Self as JsonSchema>::schema_name(),
                strict: true,
                schema: Self::openai_schema(),
            },
        }
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Apply strict-mode requirements to every object schema in the tree.
fn strictify(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(properties)) = map.get("properties") {
                    let all_keys: Vec<Value> = properties
                        .keys()
                        .map(|k| Value::String(k.clone()))
                        .collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }
            for (_, v) in map.iter_mut() {
                strictify(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                strictify(item);
            }
        }
        _ => {}
    }
}

/// Replace `$ref` nodes with their definitions, recursively.
fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(definition) = definitions.get(name) {
                        *value = definition.clone();
                        inline_refs(value, definitions);
                        return;
                    }
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, JsonSchema)]
    struct Inner {
        quantity: Option<f32>,
        label: String,
    }

    #[derive(Deserialize, JsonSchema)]
    struct Outer {
        items: Vec<Inner>,
        note: Option<String>,
    }

    #[test]
    fn test_refs_inlined_and_strict() {
        let schema = Outer::openai_schema();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"), "refs must be inlined: {text}");
        assert!(!schema.as_object().unwrap().contains_key("definitions"));
        assert!(text.contains("additionalProperties"));
    }

    #[test]
    fn test_optional_fields_still_required() {
        let schema = Outer::openai_schema();
        let required = schema["required"].as_array().unwrap();
        let names: Vec<&str> = required.iter().filter_map(|v| v.as_str()).collect();
        assert!(names.contains(&"items"));
        assert!(names.contains(&"note"), "Option fields listed too: {names:?}");
    }

    #[test]
    fn test_response_format_shape() {
        let format = Outer::response_format();
        assert_eq!(format.format_type, "json_schema");
        assert!(format.json_schema.strict);
        assert_eq!(format.json_schema.name, "Outer");
    }
}
