//! Entity Store Adapter: typed search primitives over persisted campaigns.
//!
//! The trait isolates tools from the storage technology. Implementations
//! surface failures as [`StoreError`]; whether a failure falls back, degrades
//! to an empty result, or propagates is decided per operation by the caller.

use adscope_core::{ActiveFilterSet, Campaign, Channel, EmbeddingField};
use adscope_db::{CampaignRow, ScoredCampaignRow};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;

/// Default cap for structured filter queries.
pub const FILTER_LIMIT: usize = 50;
/// Default cap for similarity search.
pub const SIMILARITY_LIMIT: usize = 20;
/// Default minimum cosine similarity for a similarity-search hit.
pub const SIMILARITY_THRESHOLD: f32 = 0.7;
/// Default cap for full-text search.
pub const TEXT_SEARCH_LIMIT: usize = 50;
/// Default cap for offer substring search.
pub const OFFER_SEARCH_LIMIT: usize = 50;

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Campaigns matching every constrained field, newest first.
    async fn filter_campaigns(
        &self,
        filters: &ActiveFilterSet,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError>;

    /// Campaigns whose `field` embedding is present and more similar than
    /// `threshold` to `query_embedding`, most similar first.
    ///
    /// Implementations may enforce only some of `filters` server-side.
    async fn similarity_search(
        &self,
        field: EmbeddingField,
        query_embedding: &[f32],
        filters: &ActiveFilterSet,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError>;

    /// Full-text match over campaign body text, best rank first.
    async fn text_search(
        &self,
        query: &str,
        channels: Option<&[Channel]>,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError>;

    /// Campaigns whose offer contains `query`, ignoring case.
    async fn offer_search(
        &self,
        query: &str,
        filters: &ActiveFilterSet,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError>;

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError>;

    /// Liveness check backing the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// [`CampaignStore`] backed by Postgres with pgvector.
#[derive(Clone)]
pub struct PgCampaignStore {
    pool: PgPool,
}

impl PgCampaignStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn into_campaigns(rows: Vec<CampaignRow>) -> Result<Vec<Campaign>, StoreError> {
    rows.into_iter()
        .map(|row| row.into_campaign().map_err(StoreError::from))
        .collect()
}

fn scored_into_campaigns(rows: Vec<ScoredCampaignRow>) -> Result<Vec<Campaign>, StoreError> {
    rows.into_iter()
        .map(|row| row.campaign.into_campaign().map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl CampaignStore for PgCampaignStore {
    async fn filter_campaigns(
        &self,
        filters: &ActiveFilterSet,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        let rows = adscope_db::filter_campaigns(&self.pool, filters, sql_limit(limit)).await?;
        into_campaigns(rows)
    }

    async fn similarity_search(
        &self,
        field: EmbeddingField,
        query_embedding: &[f32],
        filters: &ActiveFilterSet,
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        let rows = adscope_db::similarity_search(
            &self.pool,
            field,
            query_embedding,
            filters,
            threshold,
            sql_limit(limit),
        )
        .await?;
        scored_into_campaigns(rows)
    }

    async fn text_search(
        &self,
        query: &str,
        channels: Option<&[Channel]>,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        let rows = adscope_db::text_search(&self.pool, query, channels, sql_limit(limit)).await?;
        scored_into_campaigns(rows)
    }

    async fn offer_search(
        &self,
        query: &str,
        filters: &ActiveFilterSet,
        limit: usize,
    ) -> Result<Vec<Campaign>, StoreError> {
        let rows = adscope_db::offer_search(&self.pool, query, filters, sql_limit(limit)).await?;
        into_campaigns(rows)
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        adscope_db::get_campaign(&self.pool, id)
            .await?
            .map(|row| row.into_campaign().map_err(StoreError::from))
            .transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        adscope_db::health_check(&self.pool).await?;
        Ok(())
    }
}
