//! Flow definition entity

use serde::Serialize;
use serde_json::Value;

use super::error::FlowError;
use crate::domain::safety::SafetyPolicy;
use crate::domain::schema::Schema;
use crate::domain::template::PromptTemplate;

/// A named, typed prompt: input schema, output schema, compiled template and safety policy
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    name: String,
    description: String,
    input_schema: Schema,
    output_schema: Schema,
    template: PromptTemplate,
    safety_policy: SafetyPolicy,
}

impl FlowDefinition {
    pub fn builder(name: impl Into<String>) -> FlowDefinitionBuilder {
        FlowDefinitionBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    pub fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn safety_policy(&self) -> &SafetyPolicy {
        &self.safety_policy
    }

    /// Catalog entry describing this flow
    pub fn summary(&self) -> FlowSummary {
        FlowSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.to_json_schema(),
            output_schema: self.output_schema.to_json_schema(),
        }
    }
}

/// Serializable catalog entry for a flow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

/// Builder for FlowDefinition
#[derive(Debug)]
pub struct FlowDefinitionBuilder {
    name: String,
    description: String,
    input_schema: Schema,
    output_schema: Schema,
    template: String,
    safety_policy: SafetyPolicy,
}

impl FlowDefinitionBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: Schema::default(),
            output_schema: Schema::default(),
            template: String::new(),
            safety_policy: SafetyPolicy::standard(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn input(mut self, schema: Schema) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn output(mut self, schema: Schema) -> Self {
        self.output_schema = schema;
        self
    }

    pub fn template(mut self, source: impl Into<String>) -> Self {
        self.template = source.into();
        self
    }

    pub fn safety_policy(mut self, policy: SafetyPolicy) -> Self {
        self.safety_policy = policy;
        self
    }

    /// Compile the template against the input schema
    pub fn build(self) -> Result<FlowDefinition, FlowError> {
        let template = PromptTemplate::compile(self.template, &self.input_schema)
            .map_err(|e| FlowError::template(&self.name, e))?;

        Ok(FlowDefinition {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            output_schema: self.output_schema,
            template,
            safety_policy: self.safety_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{FieldDescriptor, FieldType};
    use crate::domain::template::TemplateError;

    fn input() -> Schema {
        Schema::new(vec![
            FieldDescriptor::required("description", FieldType::String, "What to find"),
            FieldDescriptor::optional("budget", FieldType::Number, "Budget"),
        ])
    }

    #[test]
    fn test_build_flow() {
        let flow = FlowDefinition::builder("productDiscovery")
            .description("Suggest products")
            .input(input())
            .output(Schema::new(vec![FieldDescriptor::required(
                "summary",
                FieldType::String,
                "Summary",
            )]))
            .template("Description: {{{description}}}")
            .build()
            .unwrap();

        assert_eq!(flow.name(), "productDiscovery");
        assert_eq!(flow.safety_policy(), &SafetyPolicy::standard());
        assert_eq!(flow.template().referenced_fields(), vec!["description"]);
    }

    #[test]
    fn test_unknown_field_fails_at_build() {
        let err = FlowDefinition::builder("broken")
            .input(input())
            .template("Hello {{{customerName}}}")
            .build()
            .unwrap_err();

        assert_eq!(err.code(), "template_field_unknown");
        match err {
            FlowError::Template { flow, source } => {
                assert_eq!(flow, "broken");
                assert_eq!(
                    source,
                    TemplateError::UnknownField {
                        field: "customerName".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_summary_exposes_json_schemas() {
        let flow = FlowDefinition::builder("productDiscovery")
            .input(input())
            .template("{{description}}")
            .build()
            .unwrap();

        let summary = flow.summary();
        assert_eq!(summary.input_schema["required"][0], "description");
        assert!(summary.input_schema["properties"]["budget"].is_object());
    }
}
