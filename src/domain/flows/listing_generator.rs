//! Product listing generation from details and an optional photo

use serde::{Deserialize, Serialize};

use crate::domain::flow::{FlowDefinition, FlowError};
use crate::domain::schema::{FieldDescriptor, FieldType, Schema};

pub const NAME: &str = "listingGenerator";

const TEMPLATE: &str = "You are an expert in creating compelling product listings.

Based on the provided product details and photo (if available), generate a title, description, and tags for the product listing.

Product Details: {{{productDetails}}}
{{#if productPhoto}}
Product Photo: {{media url=productPhoto}}
{{/if}}
";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    pub product_details: String,
    /// Data URI or URL of a product photo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingOutput {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

pub fn input_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::required(
            "productDetails",
            FieldType::String,
            "The details of the product to generate a listing for.",
        )
        .non_empty(),
        FieldDescriptor::optional(
            "productPhoto",
            FieldType::String,
            "A photo of the product, as a data URI that must include a MIME type and use Base64 encoding ('data:<mimetype>;base64,<encoded_data>'), or an image URL.",
        )
        .data_uri(),
    ])
}

pub fn output_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::required(
            "title",
            FieldType::String,
            "The generated title for the product listing.",
        ),
        FieldDescriptor::required(
            "description",
            FieldType::String,
            "The generated description for the product listing.",
        ),
        FieldDescriptor::required(
            "tags",
            FieldType::array_of(FieldType::String),
            "The generated tags for the product listing.",
        ),
    ])
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(NAME)
        .description("Generates a title, description and tags for a product listing")
        .input(input_schema())
        .output(output_schema())
        .template(TEMPLATE)
        .build()
}
