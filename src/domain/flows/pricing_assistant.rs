//! Competitive pricing suggestions for sellers

use serde::{Deserialize, Serialize};

use crate::domain::flow::{FlowDefinition, FlowError};
use crate::domain::schema::{FieldDescriptor, FieldType, Schema};

pub const NAME: &str = "pricingAssistant";

const TEMPLATE: &str = r#"You are an AI assistant that suggests competitive prices for products to help sellers maximize sales.

Based on the following information, suggest a competitive price for the product and explain your reasoning.

Product Details: {{{productDetails}}}
Current Price: {{{currentPrice}}}
{{#if marketTrends}}
Market Trends: {{{marketTrends}}}
{{/if}}
{{#if competitorPrices}}
Competitor Prices: {{{competitorPrices}}}
{{/if}}

Consider all factors and provide a suggested price that is both competitive and maximizes profit for the seller.

Format your output as a JSON object with "suggestedPrice" and "reasoning" fields."#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInput {
    pub product_details: String,
    pub current_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_trends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_prices: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOutput {
    pub suggested_price: f64,
    pub reasoning: String,
}

pub fn input_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::required(
            "productDetails",
            FieldType::String,
            "Detailed description of the product, including features, brand, and specifications.",
        )
        .non_empty(),
        FieldDescriptor::required(
            "currentPrice",
            FieldType::Number,
            "The current selling price of the product.",
        )
        .positive(),
        FieldDescriptor::optional(
            "marketTrends",
            FieldType::String,
            "Information about current market trends for similar products.",
        ),
        FieldDescriptor::optional(
            "competitorPrices",
            FieldType::String,
            "Prices of the same or similar products from competitors.",
        ),
    ])
}

pub fn output_schema() -> Schema {
    Schema::new(vec![
        FieldDescriptor::required(
            "suggestedPrice",
            FieldType::Number,
            "The suggested competitive price for the product.",
        ),
        FieldDescriptor::required(
            "reasoning",
            FieldType::String,
            "The reasoning behind the suggested price, considering market trends and competitor prices.",
        ),
    ])
}

pub fn definition() -> Result<FlowDefinition, FlowError> {
    FlowDefinition::builder(NAME)
        .description("Suggests a competitive price for a product")
        .input(input_schema())
        .output(output_schema())
        .template(TEMPLATE)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_omits_missing_market_data() {
        let flow = definition().unwrap();
        let input = flow
            .input_schema()
            .validate(&json!({"productDetails": "Wireless mouse", "currentPrice": 49.99}))
            .unwrap();

        let prompt = flow.template().render(&input).text();
        assert!(
            prompt.contains("Product Details: Wireless mouse\nCurrent Price: 49.99\n\nConsider")
        );
        assert!(!prompt.contains("Market Trends"));
        assert!(!prompt.contains("Competitor Prices"));
    }

    #[test]
    fn test_reply_without_suggested_price_is_invalid() {
        let err = output_schema()
            .validate(&json!({"reasoning": "Competitors sell for less"}))
            .unwrap_err();
        assert!(err.has_violation_at("suggestedPrice"));
    }

    #[test]
    fn test_zero_price_is_rejected() {
        let err = input_schema()
            .validate(&json!({"productDetails": "Mouse", "currentPrice": 0}))
            .unwrap_err();
        assert!(err.has_violation_at("currentPrice"));
    }
}
