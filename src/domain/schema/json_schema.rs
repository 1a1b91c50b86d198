use serde_json::{Map, Value, json};

use super::field::{Constraint, FieldDescriptor, FieldType, Schema};

impl Schema {
    /// Render as a JSON Schema object, descriptions included
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in self.fields() {
            properties.insert(field.name().to_string(), field_json_schema(field));
            if field.is_required() {
                required.push(Value::String(field.name().to_string()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn field_json_schema(field: &FieldDescriptor) -> Value {
    let mut schema = type_json_schema(field.field_type());

    if let Value::Object(ref mut obj) = schema {
        if !field.description().is_empty() {
            obj.insert("description".to_string(), json!(field.description()));
        }

        for constraint in field.constraints() {
            match (constraint, field.field_type()) {
                (Constraint::Positive, FieldType::Number | FieldType::Integer) => {
                    obj.insert("exclusiveMinimum".to_string(), json!(0));
                }
                (Constraint::NonEmpty, FieldType::String) => {
                    obj.insert("minLength".to_string(), json!(1));
                }
                (Constraint::NonEmpty, FieldType::Array(_)) => {
                    obj.insert("minItems".to_string(), json!(1));
                }
                _ => {}
            }
        }
    }

    schema
}

fn type_json_schema(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::Array(item) => json!({
            "type": "array",
            "items": type_json_schema(item),
        }),
        FieldType::Object(schema) => schema.to_json_schema(),
        scalar => json!({ "type": scalar.name() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_fields() {
        let schema = Schema::new(vec![
            FieldDescriptor::required("suggestedPrice", FieldType::Number, "Suggested price")
                .positive(),
            FieldDescriptor::optional("reasoning", FieldType::String, ""),
        ]);

        assert_eq!(
            schema.to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "suggestedPrice": {
                        "type": "number",
                        "description": "Suggested price",
                        "exclusiveMinimum": 0
                    },
                    "reasoning": { "type": "string" }
                },
                "required": ["suggestedPrice"]
            })
        );
    }

    #[test]
    fn test_array_of_objects() {
        let item = Schema::new(vec![FieldDescriptor::required(
            "item",
            FieldType::String,
            "The suggested item.",
        )]);
        let schema = Schema::new(vec![FieldDescriptor::required(
            "suggestions",
            FieldType::array_of(FieldType::Object(item)),
            "Suggestions",
        )]);

        let rendered = schema.to_json_schema();
        let suggestions = &rendered["properties"]["suggestions"];

        assert_eq!(suggestions["type"], "array");
        assert_eq!(suggestions["description"], "Suggestions");
        assert_eq!(suggestions["items"]["type"], "object");
        assert_eq!(suggestions["items"]["required"], json!(["item"]));
        assert_eq!(
            suggestions["items"]["properties"]["item"]["description"],
            "The suggested item."
        );
    }
}
