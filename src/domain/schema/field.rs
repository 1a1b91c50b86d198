use std::fmt;

/// Primitive or composite type of a schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<FieldType>),
    Object(Schema),
}

impl FieldType {
    pub fn array_of(item: FieldType) -> Self {
        Self::Array(Box::new(item))
    }

    /// JSON type name
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Whether values of this type can be interpolated into prompt text
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::Integer | Self::Boolean
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(item) => write!(f, "array<{}>", item),
            other => f.write_str(other.name()),
        }
    }
}

/// Value constraint checked in addition to the type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Number strictly greater than zero
    Positive,
    /// String with non-whitespace content, or non-empty array
    NonEmpty,
    /// `data:` URIs must be well formed base64 data URIs; other strings pass
    DataUri,
}

/// Description of one field in a schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: String,
    field_type: FieldType,
    required: bool,
    description: String,
    constraints: Vec<Constraint>,
}

impl FieldDescriptor {
    pub fn required(
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            description: description.into(),
            constraints: Vec::new(),
        }
    }

    pub fn optional(
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type, description)
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    pub fn positive(self) -> Self {
        self.with_constraint(Constraint::Positive)
    }

    pub fn non_empty(self) -> Self {
        self.with_constraint(Constraint::NonEmpty)
    }

    pub fn data_uri(self) -> Self {
        self.with_constraint(Constraint::DataUri)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Ordered set of field descriptors describing an object value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Build a schema; a later descriptor with an already used name replaces the earlier one
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        let mut schema = Self::default();
        for field in fields {
            schema = schema.field(field);
        }
        schema
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
