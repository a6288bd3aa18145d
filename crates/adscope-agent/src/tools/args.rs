//! Typed, validated tool arguments.
//!
//! Model-produced payloads are deserialized into loose raw shapes first, then
//! every enumerated value is checked against its vocabulary. Nothing outside a
//! vocabulary survives into an [`ActiveFilterSet`].

use std::str::FromStr;

use adscope_core::{
    ActiveFilterSet, Channel, CoreError, DateRange, EmbeddingField, Sentiment, ValueProp,
    VisualStyle,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::AgentError;

/// A list argument given either as a JSON array or as a single
/// (possibly comma-separated) string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_tokens(self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => s
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToString::to_string)
                .collect(),
            OneOrMany::Many(items) => items,
        }
    }

    /// A blank single string carries no information and is treated as absent;
    /// an explicit empty array is kept so it can clear a base constraint.
    fn is_blank_string(&self) -> bool {
        matches!(self, OneOrMany::One(s) if s.trim().is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilterArgs {
    channel: Option<OneOrMany>,
    value_prop: Option<OneOrMany>,
    sentiment: Option<OneOrMany>,
    visual_style: Option<OneOrMany>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDateRange {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSemanticSearch {
    query: Option<String>,
    embedding_field: Option<String>,
    #[serde(flatten)]
    filters: RawFilterArgs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilterCampaigns {
    #[serde(flatten)]
    filters: RawFilterArgs,
    date_range: Option<RawDateRange>,
    has_offer: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSearchOffers {
    query: Option<String>,
    #[serde(flatten)]
    filters: RawFilterArgs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFullTextSearch {
    query: Option<String>,
    channel: Option<OneOrMany>,
}

/// Validated categorical filter arguments shared by several tools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterArgs {
    pub channel: Option<Vec<Channel>>,
    pub value_prop: Option<Vec<ValueProp>>,
    pub sentiment: Option<Vec<Sentiment>>,
    pub visual_style: Option<Vec<VisualStyle>>,
}

impl FilterArgs {
    /// The arguments as a merge overlay; absent arguments stay absent.
    #[must_use]
    pub fn to_overlay(&self) -> ActiveFilterSet {
        ActiveFilterSet {
            channel: self.channel.clone(),
            value_prop: self.value_prop.clone(),
            sentiment: self.sentiment.clone(),
            visual_style: self.visual_style.clone(),
            date_range: None,
        }
    }

    fn from_raw(tool: &'static str, raw: RawFilterArgs) -> Result<Self, AgentError> {
        Ok(Self {
            channel: parse_list(tool, raw.channel)?,
            value_prop: parse_list(tool, raw.value_prop)?,
            sentiment: parse_list(tool, raw.sentiment)?,
            visual_style: parse_list(tool, raw.visual_style)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticSearchArgs {
    pub query: String,
    pub embedding_field: EmbeddingField,
    pub filters: FilterArgs,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCampaignsArgs {
    pub filters: FilterArgs,
    pub date_range: Option<DateRange>,
    pub has_offer: bool,
}

impl FilterCampaignsArgs {
    #[must_use]
    pub fn to_overlay(&self) -> ActiveFilterSet {
        ActiveFilterSet {
            date_range: self.date_range,
            ..self.filters.to_overlay()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOffersArgs {
    pub query: String,
    pub filters: FilterArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTextSearchArgs {
    pub query: String,
    /// Overrides the base channel constraint when present.
    pub channel: Option<Vec<Channel>>,
}

impl SemanticSearchArgs {
    pub(crate) fn parse(tool: &'static str, args: &Value) -> Result<Self, AgentError> {
        let raw: RawSemanticSearch = deserialize(tool, args)?;
        let embedding_field = match raw.embedding_field.as_deref().map(str::trim) {
            None | Some("") => EmbeddingField::default(),
            Some(field) => field
                .parse()
                .map_err(|e: CoreError| AgentError::invalid(tool, e.to_string()))?,
        };
        Ok(Self {
            query: require_query(tool, raw.query)?,
            embedding_field,
            filters: FilterArgs::from_raw(tool, raw.filters)?,
        })
    }
}

impl FilterCampaignsArgs {
    pub(crate) fn parse(tool: &'static str, args: &Value) -> Result<Self, AgentError> {
        let raw: RawFilterCampaigns = deserialize(tool, args)?;
        let date_range = raw
            .date_range
            .map(|r| DateRange::parse(r.start.as_deref(), r.end.as_deref()))
            .transpose()
            .map_err(|e| AgentError::invalid(tool, e.to_string()))?;
        Ok(Self {
            filters: FilterArgs::from_raw(tool, raw.filters)?,
            date_range,
            has_offer: raw.has_offer.unwrap_or(false),
        })
    }
}

impl SearchOffersArgs {
    pub(crate) fn parse(tool: &'static str, args: &Value) -> Result<Self, AgentError> {
        let raw: RawSearchOffers = deserialize(tool, args)?;
        Ok(Self {
            query: require_query(tool, raw.query)?,
            filters: FilterArgs::from_raw(tool, raw.filters)?,
        })
    }
}

impl FullTextSearchArgs {
    pub(crate) fn parse(tool: &'static str, args: &Value) -> Result<Self, AgentError> {
        let raw: RawFullTextSearch = deserialize(tool, args)?;
        Ok(Self {
            query: require_query(tool, raw.query)?,
            channel: parse_list(tool, raw.channel)?,
        })
    }
}

fn deserialize<T: DeserializeOwned + Default>(
    tool: &'static str,
    args: &Value,
) -> Result<T, AgentError> {
    if args.is_null() {
        return Ok(T::default());
    }
    T::deserialize(args).map_err(|e| AgentError::invalid(tool, e.to_string()))
}

fn require_query(tool: &'static str, query: Option<String>) -> Result<String, AgentError> {
    query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AgentError::invalid(tool, "'query' is required"))
}

fn parse_list<T>(tool: &'static str, raw: Option<OneOrMany>) -> Result<Option<Vec<T>>, AgentError>
where
    T: FromStr<Err = CoreError> + PartialEq,
{
    let Some(raw) = raw.filter(|r| !r.is_blank_string()) else {
        return Ok(None);
    };

    let mut values: Vec<T> = Vec::new();
    for token in raw.into_tokens() {
        let value = token
            .parse::<T>()
            .map_err(|e| AgentError::invalid(tool, e.to_string()))?;
        if !values.contains(&value) {
            values.push(value);
        }
    }
    Ok(Some(values))
}
