//! Prompt templates compiled against an input schema
//!
//! Templates are checked once, when a flow is defined: every field they reference must
//! exist in the input schema, and optional fields may only be interpolated inside a
//! `{{#if field}}` block guarded by that same field. Rendering a compiled template
//! against a validated input therefore cannot fail.

mod parser;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use parser::Node;

use crate::domain::media::MediaRef;
use crate::domain::schema::{FieldDescriptor, FieldType, Schema, ValidatedValue};

/// Template construction errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TemplateError {
    #[error("Template references unknown field: {field}")]
    UnknownField { field: String },

    #[error("Field '{field}' is not a scalar and cannot be interpolated")]
    NonScalarField { field: String },

    #[error("Optional field '{field}' must be referenced inside {{{{#if {field}}}}}")]
    UnguardedOptionalField { field: String },

    #[error("Media field '{field}' must be a string")]
    InvalidMediaField { field: String },

    #[error("Block '{inner}' is nested inside block '{outer}'")]
    NestedBlock { outer: String, inner: String },

    #[error("Unexpected {{{{/if}}}} without a matching {{{{#if}}}}")]
    UnbalancedBlock,

    #[error("Block '{field}' is never closed")]
    UnclosedBlock { field: String },

    #[error("Template parsing error: {message}")]
    ParseError { message: String },
}

impl TemplateError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// The unknown-field case is the one a flow author most often hits
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }
}

/// One block of the rendered prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptPart {
    Text { text: String },
    Media { media: MediaRef },
}

/// Prompt text and media, in template order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RenderedPrompt {
    parts: Vec<PromptPart>,
}

impl RenderedPrompt {
    pub fn parts(&self) -> &[PromptPart] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<PromptPart> {
        self.parts
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                PromptPart::Text { text } => Some(text.as_str()),
                PromptPart::Media { .. } => None,
            })
            .collect()
    }

    pub fn media(&self) -> impl Iterator<Item = &MediaRef> {
        self.parts.iter().filter_map(|p| match p {
            PromptPart::Media { media } => Some(media),
            PromptPart::Text { .. } => None,
        })
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        match self.parts.last_mut() {
            Some(PromptPart::Text { text: last }) => last.push_str(text),
            _ => self.parts.push(PromptPart::Text {
                text: text.to_string(),
            }),
        }
    }

    fn push_media(&mut self, media: MediaRef) {
        self.parts.push(PromptPart::Media { media });
    }
}

/// A template validated against an input schema
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
    nodes: Vec<Node>,
}

impl PromptTemplate {
    /// Parse `source` and check every reference against `schema`
    pub fn compile(source: impl Into<String>, schema: &Schema) -> Result<Self, TemplateError> {
        let source = source.into();
        let nodes = parser::parse(&source)?;

        for node in &nodes {
            check_node(node, schema, None)?;
        }

        Ok(Self { source, nodes })
    }

    /// Original template source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Names of all fields the template references, in order of first use
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_fields(&self.nodes, &mut names);
        names
    }

    /// Render against a value validated by the schema this template was compiled with
    pub fn render(&self, input: &ValidatedValue) -> RenderedPrompt {
        let mut prompt = RenderedPrompt::default();
        render_nodes(&self.nodes, input, &mut prompt);
        prompt
    }
}

fn check_node(node: &Node, schema: &Schema, guard: Option<&str>) -> Result<(), TemplateError> {
    match node {
        Node::Text(_) => Ok(()),
        Node::Field(name) => {
            let field = lookup(schema, name)?;
            if !field.field_type().is_scalar() {
                return Err(TemplateError::NonScalarField {
                    field: name.clone(),
                });
            }
            check_guard(name, field.is_required(), guard)
        }
        Node::Media(name) => {
            let field = lookup(schema, name)?;
            if field.field_type() != &FieldType::String {
                return Err(TemplateError::InvalidMediaField {
                    field: name.clone(),
                });
            }
            check_guard(name, field.is_required(), guard)
        }
        Node::Block { field, body } => {
            lookup(schema, field)?;
            body.iter()
                .try_for_each(|child| check_node(child, schema, Some(field.as_str())))
        }
    }
}

fn lookup<'a>(schema: &'a Schema, name: &str) -> Result<&'a FieldDescriptor, TemplateError> {
    schema.get(name).ok_or_else(|| TemplateError::UnknownField {
        field: name.to_string(),
    })
}

fn check_guard(name: &str, required: bool, guard: Option<&str>) -> Result<(), TemplateError> {
    if required || guard == Some(name) {
        Ok(())
    } else {
        Err(TemplateError::UnguardedOptionalField {
            field: name.to_string(),
        })
    }
}

fn collect_fields<'a>(nodes: &'a [Node], names: &mut Vec<&'a str>) {
    for node in nodes {
        let name = match node {
            Node::Text(_) => continue,
            Node::Field(name) | Node::Media(name) => name,
            Node::Block { field, body } => {
                if !names.contains(&field.as_str()) {
                    names.push(field);
                }
                collect_fields(body, names);
                continue;
            }
        };

        if !names.contains(&name.as_str()) {
            names.push(name);
        }
    }
}

fn render_nodes(nodes: &[Node], input: &ValidatedValue, prompt: &mut RenderedPrompt) {
    for node in nodes {
        match node {
            Node::Text(text) => prompt.push_text(text),
            Node::Field(name) => {
                if let Some(value) = input.get(name) {
                    prompt.push_text(&format_scalar(value));
                }
            }
            Node::Media(name) => {
                if let Some(url) = input.get_str(name) {
                    prompt.push_media(MediaRef::from_url(url));
                }
            }
            Node::Block { field, body } => {
                if input.has_content(field) {
                    render_nodes(body, input, prompt);
                }
            }
        }
    }
}

/// Locale-independent text form of a scalar value
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or_default();
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    format!("{}", f)
                }
            }
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
