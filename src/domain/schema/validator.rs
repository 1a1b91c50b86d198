//! Schema validation
//!
//! Validation is total: every violation in a value is collected, not just the first.
//! The validated value keeps only declared fields; `null` counts as absent.

use std::fmt;

use serde_json::{Map, Value};

use super::field::{Constraint, FieldDescriptor, FieldType, Schema};
use crate::domain::media::DataUri;

/// What is wrong with a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    WrongType {
        expected: String,
        found: &'static str,
    },
    NotPositive,
    Empty,
    InvalidDataUri,
}

/// A violation located by its path inside the validated value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Path such as `budget` or `products[2].price`; empty for the root value
    pub path: String,
    pub kind: ViolationKind,
}

impl FieldViolation {
    fn new(path: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() {
            "<root>"
        } else {
            self.path.as_str()
        };

        match &self.kind {
            ViolationKind::Missing => write!(f, "{}: is required", path),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "{}: expected {}, found {}", path, expected, found)
            }
            ViolationKind::NotPositive => write!(f, "{}: must be greater than 0", path),
            ViolationKind::Empty => write!(f, "{}: must not be empty", path),
            ViolationKind::InvalidDataUri => write!(
                f,
                "{}: must be a data URI of the form 'data:<mimetype>;base64,<encoded_data>'",
                path
            ),
        }
    }
}

/// Every violation found while validating a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    violations: Vec<FieldViolation>,
}

impl SchemaViolation {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether any violation is located at exactly `path`
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        f.write_str(&details.join("; "))
    }
}

impl std::error::Error for SchemaViolation {}

/// An object value known to conform to a schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedValue {
    fields: Map<String, Value>,
}

impl ValidatedValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Whether the field was supplied with a non-null value
    pub fn is_present(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Whether the field is present and carries content: non-blank strings, non-empty
    /// arrays and objects, any number or boolean
    pub fn has_content(&self, name: &str) -> bool {
        match self.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(Value::Number(_)) | Some(Value::Bool(_)) => true,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl Schema {
    /// Validate `value` against this schema
    pub fn validate(&self, value: &Value) -> Result<ValidatedValue, SchemaViolation> {
        let mut violations = Vec::new();

        let fields = match value {
            Value::Object(map) => validate_object(self, map, "", &mut violations),
            other => {
                violations.push(FieldViolation::new(
                    "",
                    ViolationKind::WrongType {
                        expected: "object".to_string(),
                        found: json_type_name(other),
                    },
                ));
                Map::new()
            }
        };

        if violations.is_empty() {
            Ok(ValidatedValue { fields })
        } else {
            Err(SchemaViolation { violations })
        }
    }
}

fn validate_object(
    schema: &Schema,
    map: &Map<String, Value>,
    prefix: &str,
    violations: &mut Vec<FieldViolation>,
) -> Map<String, Value> {
    let mut cleaned = Map::new();

    for field in schema.fields() {
        let path = join_path(prefix, field.name());

        match map.get(field.name()) {
            None | Some(Value::Null) => {
                if field.is_required() {
                    violations.push(FieldViolation::new(path, ViolationKind::Missing));
                }
            }
            Some(value) => {
                if let Some(checked) = validate_field(field, value, &path, violations) {
                    cleaned.insert(field.name().to_string(), checked);
                }
            }
        }
    }

    cleaned
}

fn validate_field(
    field: &FieldDescriptor,
    value: &Value,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let checked = validate_type(field.field_type(), value, path, violations)?;

    for constraint in field.constraints() {
        if let Some(kind) = check_constraint(*constraint, &checked) {
            violations.push(FieldViolation::new(path, kind));
        }
    }

    Some(checked)
}

fn validate_type(
    field_type: &FieldType,
    value: &Value,
    path: &str,
    violations: &mut Vec<FieldViolation>,
) -> Option<Value> {
    let matches = match (field_type, value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Number, Value::Number(_)) => true,
        (FieldType::Integer, Value::Number(n)) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        (FieldType::Boolean, Value::Bool(_)) => true,
        (FieldType::Array(item_type), Value::Array(items)) => {
            let before = violations.len();
            let checked: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let item_path = format!("{}[{}]", path, i);
                    if item.is_null() {
                        violations.push(FieldViolation::new(item_path, ViolationKind::Missing));
                        return None;
                    }
                    validate_type(item_type, item, &item_path, violations)
                })
                .collect();

            return (violations.len() == before).then_some(Value::Array(checked));
        }
        (FieldType::Object(schema), Value::Object(map)) => {
            let before = violations.len();
            let checked = validate_object(schema, map, path, violations);
            return (violations.len() == before).then_some(Value::Object(checked));
        }
        _ => false,
    };

    if matches {
        Some(value.clone())
    } else {
        violations.push(FieldViolation::new(
            path,
            ViolationKind::WrongType {
                expected: field_type.to_string(),
                found: json_type_name(value),
            },
        ));
        None
    }
}

fn check_constraint(constraint: Constraint, value: &Value) -> Option<ViolationKind> {
    match (constraint, value) {
        (Constraint::Positive, Value::Number(n)) => {
            (!n.as_f64().is_some_and(|f| f > 0.0)).then_some(ViolationKind::NotPositive)
        }
        (Constraint::NonEmpty, Value::String(s)) => {
            s.trim().is_empty().then_some(ViolationKind::Empty)
        }
        (Constraint::NonEmpty, Value::Array(items)) => {
            items.is_empty().then_some(ViolationKind::Empty)
        }
        (Constraint::DataUri, Value::String(s)) => (s.starts_with("data:")
            && DataUri::parse(s).is_none())
        .then_some(ViolationKind::InvalidDataUri),
        _ => None,
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
