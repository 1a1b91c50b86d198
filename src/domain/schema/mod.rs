//! Flow input/output contracts: field descriptors, validation and JSON Schema export

mod field;
mod json_schema;
mod validator;

pub use field::{Constraint, FieldDescriptor, FieldType, Schema};
pub use validator::{FieldViolation, SchemaViolation, ValidatedValue, ViolationKind};
