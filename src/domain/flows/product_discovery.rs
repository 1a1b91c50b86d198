//! Conversational product discovery

use serde::{Deserialize, Serialize};

use crate::domain::flow::{FlowDefinition, FlowError};
use crate::domain::schema::{FieldDescriptor, FieldType, Schema};

pub const NAME: &str = "productDiscovery";

const TEMPLATE: &str = "You are a helpful shopping assistant. A user will describe what they are looking for, and you should return a list of relevant products.

Description: {{{description}}}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDiscoveryInput {
    pub description: String,
}

/// A suggested product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDiscoveryOutput {
    pub products: Vec<Product>,
}

pub fn input_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::required(
            "description",
            FieldType::String,
            "The natural language description of the desired product.",
        )
        .non_empty(),
    ])
}

pub fn output_schema() -> Schema {
    let product = Schema::new(vec![
        FieldDescriptor::required("name", FieldType::String, "The name of the product."),
        FieldDescriptor::required(
            "description",
            FieldType::String,
            "A description of the product.",
        ),
        FieldDescriptor::required(
            "imageUrl",
            FieldType::String,
            "A URL to an image of the product.",
        ),
        FieldDescriptor::required("price", FieldType::Number, "The price of the product."),
    ]);

    Schema::new(vec![FieldDescriptor::required(
        "products",
        FieldType::array_of(FieldType::Object(product)),
        "A list of suggested products.",
    )])
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(NAME)
        .description("Suggests products matching a natural language description")
        .input(input_schema())
        .output(output_schema())
        .template(TEMPLATE)
        .build()
}
