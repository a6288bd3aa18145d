//! JSON Schema declarations offered to the model for each tool.

use adscope_core::{Channel, EmbeddingField, Sentiment, ValueProp, VisualStyle};
use serde_json::{json, Map, Value};

use super::ToolName;
use crate::llm::ToolSchema;

fn list_property(description: &str, tokens: &[&'static str]) -> Value {
    json!({
        "type": "array",
        "description": description,
        "items": { "type": "string", "enum": tokens },
    })
}

fn filter_properties() -> Map<String, Value> {
    let mut props = Map::new();
    props.insert(
        "channel".into(),
        list_property("Channels to include.", &Channel::tokens()),
    );
    props.insert(
        "value_prop".into(),
        list_property(
            "Value propositions; a campaign matches if it has any of them.",
            &ValueProp::tokens(),
        ),
    );
    props.insert(
        "sentiment".into(),
        list_property("Imagery sentiments to include.", &Sentiment::tokens()),
    );
    props.insert(
        "visual_style".into(),
        list_property("Imagery visual styles to include.", &VisualStyle::tokens()),
    );
    props
}

fn object_schema(properties: Map<String, Value>, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn query_property(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// The catalogue of tool declarations, in a stable order.
#[must_use]
pub fn tool_schemas() -> Vec<ToolSchema> {
    let mut semantic = filter_properties();
    semantic.insert(
        "query".into(),
        query_property("Natural-language description of the concept to find."),
    );
    semantic.insert(
        "embedding_field".into(),
        json!({
            "type": "string",
            "enum": EmbeddingField::tokens(),
            "description": "Which facet to compare: value propositions and offer, \
                            ad copy, or visual imagery. Defaults to value_prop_embedding.",
        }),
    );

    let mut filter = filter_properties();
    filter.insert(
        "date_range".into(),
        json!({
            "type": "object",
            "description": "Inclusive capture-date bounds as YYYY-MM-DD; either side may be omitted.",
            "properties": {
                "start": { "type": "string", "format": "date" },
                "end": { "type": "string", "format": "date" },
            },
        }),
    );
    filter.insert(
        "has_offer".into(),
        json!({
            "type": "boolean",
            "description": "Only return campaigns that state a concrete offer.",
        }),
    );

    let mut offers = filter_properties();
    offers.insert(
        "query".into(),
        query_property("Text to look for inside the offer, e.g. \"0% APR\" or \"bonus\"."),
    );

    let mut full_text = Map::new();
    full_text.insert(
        "query".into(),
        query_property("Words or phrases to match in the campaign copy."),
    );
    full_text.insert(
        "channel".into(),
        list_property("Channels to include.", &Channel::tokens()),
    );

    vec![
        ToolSchema {
            name: ToolName::SemanticSearch.as_str(),
            description: "Find campaigns conceptually similar to a description using vector \
                          similarity over value propositions, ad copy, or visual imagery.",
            parameters: object_schema(semantic, &["query"]),
        },
        ToolSchema {
            name: ToolName::FilterCampaigns.as_str(),
            description: "List campaigns matching exact structured filters: channel, value \
                          proposition, sentiment, visual style, capture date, or having an offer.",
            parameters: object_schema(filter, &[]),
        },
        ToolSchema {
            name: ToolName::SearchOffers.as_str(),
            description: "Find campaigns whose offer text contains the given words, optionally \
                          narrowed by structured filters.",
            parameters: object_schema(offers, &["query"]),
        },
        ToolSchema {
            name: ToolName::FullTextSearch.as_str(),
            description: "Keyword search over the full campaign copy, ranked by relevance.",
            parameters: object_schema(full_text, &["query"]),
        },
    ]
}
