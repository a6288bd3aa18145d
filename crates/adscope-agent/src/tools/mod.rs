//! The four named search operations the model can invoke.
//!
//! Every tool merges its filter arguments onto the caller's base filters before
//! querying and returns a [`ToolResult`] built by [`build_tool_result`].

mod args;
mod schema;
mod summary;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use adscope_core::{apply_filters, merge, ActiveFilterSet, Campaign};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub use args::{
    FilterArgs, FilterCampaignsArgs, FullTextSearchArgs, SearchOffersArgs, SemanticSearchArgs,
};
pub use schema::tool_schemas;
pub use summary::{build_tool_result, MAX_SUMMARY_ENTRIES, NO_RESULTS_SUMMARY};

use crate::embedder::Embedder;
use crate::error::AgentError;
use crate::store::{
    CampaignStore, FILTER_LIMIT, OFFER_SEARCH_LIMIT, SIMILARITY_LIMIT, SIMILARITY_THRESHOLD,
    TEXT_SEARCH_LIMIT,
};

/// Uniform output of every tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    /// Size of the full result set, which may exceed what the summary narrates.
    pub count: usize,
    pub summary_for_llm: String,
    pub campaigns: Vec<Campaign>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SemanticSearch,
    FilterCampaigns,
    SearchOffers,
    FullTextSearch,
}

impl ToolName {
    pub const ALL: &'static [ToolName] = &[
        ToolName::SemanticSearch,
        ToolName::FilterCampaigns,
        ToolName::SearchOffers,
        ToolName::FullTextSearch,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::SemanticSearch => "semantic_search",
            ToolName::FilterCampaigns => "filter_campaigns",
            ToolName::SearchOffers => "search_offers",
            ToolName::FullTextSearch => "full_text_search",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AgentError::UnknownTool(s.to_string()))
    }
}

/// A resolved tool call with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    SemanticSearch(SemanticSearchArgs),
    FilterCampaigns(FilterCampaignsArgs),
    SearchOffers(SearchOffersArgs),
    FullTextSearch(FullTextSearchArgs),
}

impl ToolInvocation {
    /// Resolves `name` and validates `args` against that tool's schema.
    ///
    /// # Errors
    ///
    /// [`AgentError::UnknownTool`] for an unrecognized name,
    /// [`AgentError::InvalidArgument`] for a payload that fails validation.
    pub fn parse(name: &str, args: &Value) -> Result<Self, AgentError> {
        let tool: ToolName = name.parse()?;
        let label = tool.as_str();
        Ok(match tool {
            ToolName::SemanticSearch => Self::SemanticSearch(SemanticSearchArgs::parse(label, args)?),
            ToolName::FilterCampaigns => {
                Self::FilterCampaigns(FilterCampaignsArgs::parse(label, args)?)
            }
            ToolName::SearchOffers => Self::SearchOffers(SearchOffersArgs::parse(label, args)?),
            ToolName::FullTextSearch => {
                Self::FullTextSearch(FullTextSearchArgs::parse(label, args)?)
            }
        })
    }

    #[must_use]
    pub fn name(&self) -> ToolName {
        match self {
            Self::SemanticSearch(_) => ToolName::SemanticSearch,
            Self::FilterCampaigns(_) => ToolName::FilterCampaigns,
            Self::SearchOffers(_) => ToolName::SearchOffers,
            Self::FullTextSearch(_) => ToolName::FullTextSearch,
        }
    }

    /// Filter-shaped arguments worth echoing back to the UI. Only
    /// `filter_campaigns` and `search_offers` report any.
    #[must_use]
    pub fn detected_filters(&self) -> Option<ActiveFilterSet> {
        match self {
            Self::FilterCampaigns(args) => Some(args.to_overlay()),
            Self::SearchOffers(args) => Some(args.filters.to_overlay()),
            Self::SemanticSearch(_) | Self::FullTextSearch(_) => None,
        }
    }
}

/// The tool layer, holding its collaborators as injected trait objects.
#[derive(Clone)]
pub struct Toolbox {
    store: Arc<dyn CampaignStore>,
    embedder: Arc<dyn Embedder>,
    similarity_threshold: f32,
}

impl Toolbox {
    #[must_use]
    pub fn new(store: Arc<dyn CampaignStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            similarity_threshold: SIMILARITY_THRESHOLD,
        }
    }

    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Executes `invocation` against `base`.
    ///
    /// # Errors
    ///
    /// Propagates embedding failures and plain filter-query store failures.
    pub async fn run(
        &self,
        invocation: &ToolInvocation,
        base: &ActiveFilterSet,
    ) -> Result<ToolResult, AgentError> {
        let result = match invocation {
            ToolInvocation::SemanticSearch(args) => self.semantic_search(args, base).await,
            ToolInvocation::FilterCampaigns(args) => self.filter_campaigns(args, base).await,
            ToolInvocation::SearchOffers(args) => self.search_offers(args, base).await,
            ToolInvocation::FullTextSearch(args) => self.full_text_search(args, base).await,
        }?;
        debug!(tool = %invocation.name(), count = result.count, "tool completed");
        Ok(result)
    }

    /// Vector similarity over one embedding facet.
    ///
    /// Falls back to a plain filtered query if the similarity query fails.
    /// Sentiment, visual style and date constraints are re-applied in memory
    /// because the store only pushes down channel and value proposition.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails or if the fallback query fails.
    pub async fn semantic_search(
        &self,
        args: &SemanticSearchArgs,
        base: &ActiveFilterSet,
    ) -> Result<ToolResult, AgentError> {
        let filters = merge(base, &args.filters.to_overlay());
        let vector = self.embedder.embed(&args.query).await?;

        let campaigns = match self
            .store
            .similarity_search(
                args.embedding_field,
                &vector,
                &filters,
                self.similarity_threshold,
                SIMILARITY_LIMIT,
            )
            .await
        {
            Ok(campaigns) => campaigns,
            Err(error) => {
                warn!(
                    field = %args.embedding_field,
                    error = %error,
                    "similarity search failed, falling back to filtered query"
                );
                self.store.filter_campaigns(&filters, FILTER_LIMIT).await?
            }
        };

        Ok(build_tool_result(apply_filters(campaigns, &filters)))
    }

    /// # Errors
    ///
    /// Store failures propagate; there is nothing further to fall back to.
    pub async fn filter_campaigns(
        &self,
        args: &FilterCampaignsArgs,
        base: &ActiveFilterSet,
    ) -> Result<ToolResult, AgentError> {
        let filters = merge(base, &args.to_overlay());
        let mut campaigns = self.store.filter_campaigns(&filters, FILTER_LIMIT).await?;
        if args.has_offer {
            campaigns.retain(Campaign::has_offer);
        }
        Ok(build_tool_result(campaigns))
    }

    /// Offer substring search. A store failure yields an empty result.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches the other tools.
    pub async fn search_offers(
        &self,
        args: &SearchOffersArgs,
        base: &ActiveFilterSet,
    ) -> Result<ToolResult, AgentError> {
        let filters = merge(base, &args.filters.to_overlay());
        let campaigns = self
            .store
            .offer_search(&args.query, &filters, OFFER_SEARCH_LIMIT)
            .await
            .unwrap_or_else(|error| {
                warn!(error = %error, "offer search failed, returning no results");
                Vec::new()
            });
        Ok(build_tool_result(campaigns))
    }

    /// Full-text search. Only the channel dimension applies: the argument list
    /// replaces the base channel list when given. A store failure yields an
    /// empty result.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature matches the other tools.
    pub async fn full_text_search(
        &self,
        args: &FullTextSearchArgs,
        base: &ActiveFilterSet,
    ) -> Result<ToolResult, AgentError> {
        let channels = match &args.channel {
            Some(list) => (!list.is_empty()).then_some(list.as_slice()),
            None => base.channels(),
        };
        let campaigns = self
            .store
            .text_search(&args.query, channels, TEXT_SEARCH_LIMIT)
            .await
            .unwrap_or_else(|error| {
                warn!(error = %error, "full-text search failed, returning no results");
                Vec::new()
            });
        Ok(build_tool_result(campaigns))
    }
}
