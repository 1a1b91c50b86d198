//! Smart cart optimizer

use serde::{Deserialize, Serialize};

use crate::domain::flow::{FlowDefinition, FlowError};
use crate::domain::schema::{FieldDescriptor, FieldType, Schema};

pub const NAME: &str = "cartOptimizer";

const TEMPLATE: &str = "You are a shopping assistant AI that helps users optimize their shopping carts.

You will receive a list of items in the cart and an optional budget.

Based on this information, suggest better bundles or similar items to help the user save money or find better deals.

Cart Items: {{{cartItems}}}
{{#if budget}}
Budget: {{{budget}}}
{{/if}}

Suggestions should include the item, the reason for the suggestion, and the price if available.

Output a summary of the cart optimization suggestions.
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartOptimizerInput {
    /// Comma separated list of items
    pub cart_items: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSuggestion {
    pub item: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartOptimizerOutput {
    pub suggestions: Vec<CartSuggestion>,
    pub summary: String,
}

pub fn input_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::required(
            "cartItems",
            FieldType::String,
            "The items currently in the shopping cart, as a comma separated list.",
        )
        .non_empty(),
        FieldDescriptor::optional(
            "budget",
            FieldType::Number,
            "The user specified budget for the cart.",
        )
        .positive(),
    ])
}

pub fn output_schema() -> Schema {
    let suggestion = Schema::new(vec![
        FieldDescriptor::required("item", FieldType::String, "The suggested item."),
        FieldDescriptor::required("reason", FieldType::String, "The reason for the suggestion."),
        FieldDescriptor::optional("price", FieldType::Number, "The price of the suggested item."),
    ]);

    Schema::new(vec![
        FieldDescriptor::required(
            "suggestions",
            FieldType::array_of(FieldType::Object(suggestion)),
            "A list of suggested items to optimize the cart.",
        ),
        FieldDescriptor::required(
            "summary",
            FieldType::String,
            "A summary of the cart optimization suggestions.",
        ),
    ])
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(NAME)
        .description(
            "Suggests bundles or alternatives for a shopping cart, optionally within a budget",
        )
        .input(input_schema())
        .output(output_schema())
        .template(TEMPLATE)
        .build()
}
