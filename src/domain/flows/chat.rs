//! Buyer-facing chat assistant

use serde::{Deserialize, Serialize};

use crate::domain::flow::{FlowDefinition, FlowError};
use crate::domain::schema::{FieldDescriptor, FieldType, Schema};

pub const NAME: &str = "chat";

const TEMPLATE: &str = r#"You are ShopMate AI, a specialized assistant for an e-commerce platform. You help users with buying and selling online, with this platform's features (product discovery, cart optimization, listing generation and pricing assistance) and with general e-commerce questions. If the user asks what you can do, summarize these functions clearly.

IMPORTANT: If the user's query is NOT related to e-commerce, this platform, its features, the provided product details, or the ongoing conversation, politely decline to answer and say that you can only assist with relevant topics. For example: "I can only help with questions about e-commerce and ShopMate AI features. How can I assist you with that?"

Use the following information to generate your response:
{{#if productDetails}}
Product Details:
{{{productDetails}}}

{{/if}}
{{#if pastConvo}}
Conversation History (User and AI turns):
{{{pastConvo}}}

{{/if}}
Current Buyer Query: {{{query}}}

Response:"#;

/// Input of the chat flow
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_convo: Option<String>,
}

/// Output of the chat flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOutput {
    pub response: String,
}

pub fn input_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::required("query", FieldType::String, "The buyer query.").non_empty(),
        FieldDescriptor::optional(
            "productDetails",
            FieldType::String,
            "Details about the product the buyer is asking about.",
        ),
        FieldDescriptor::optional(
            "pastConvo",
            FieldType::String,
            "Past conversation history, one turn per line, each prefixed by \"User: \" or \"AI: \".",
        ),
    ])
}

pub fn output_schema() -> Schema {
    Schema::new(vec![FieldDescriptor::required(
        "response",
        FieldType::String,
        "The response to the buyer query.",
    )])
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(NAME)
        .description("Answers buyer questions about products, the platform and e-commerce")
        .input(input_schema())
        .output(output_schema())
        .template(TEMPLATE)
        .build()
}
