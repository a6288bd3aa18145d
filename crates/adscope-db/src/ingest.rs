//! Write path for records produced by the ingestion collaborator.
//!
//! The chat and browse surfaces never call into this module.

use adscope_core::{
    CampaignEmbedding, Channel, EmbeddingField, Sentiment, ValueProp, VisualStyle,
    EMBEDDING_DIMENSIONS,
};
use chrono::NaiveDate;
use pgvector::Vector;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Campaign fields as emitted by image analysis, before an id is assigned.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCampaign {
    pub company: Option<String>,
    pub brand: Option<String>,
    pub channel: Option<Channel>,
    pub primary_product: Option<String>,
    pub offer: Option<String>,
    #[serde(default)]
    pub incentives: Vec<String>,
    #[serde(default)]
    pub key_value_props: Vec<ValueProp>,
    pub imagery_sentiment: Option<Sentiment>,
    pub imagery_visual_style: Option<VisualStyle>,
    pub imagery_primary_subject: Option<String>,
    #[serde(default)]
    pub imagery_demographics: Vec<String>,
    pub campaign_text: Option<String>,
    pub full_campaign_text: Option<String>,
    pub volume: Option<i64>,
    pub spend: Option<Decimal>,
    pub capture_date: Option<NaiveDate>,
    #[serde(default)]
    pub image_paths: Vec<String>,
}

/// One ingestion output record: a campaign plus its facet embeddings.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestedCampaign {
    pub campaign: NewCampaign,
    #[serde(default)]
    pub embeddings: CampaignEmbedding,
}

fn to_vector(field: EmbeddingField, values: Option<&[f32]>) -> Result<Option<Vector>, DbError> {
    match values {
        Some(v) if v.len() != EMBEDDING_DIMENSIONS => Err(DbError::DimensionMismatch {
            field: field.as_str(),
            actual: v.len(),
            expected: EMBEDDING_DIMENSIONS,
        }),
        Some(v) => Ok(Some(Vector::from(v.to_vec()))),
        None => Ok(None),
    }
}

/// Insert a campaign and its single embedding row in one transaction,
/// returning the new campaign id.
///
/// # Errors
///
/// Returns [`DbError::DimensionMismatch`] if any present vector is not
/// 1536-dimensional, or [`DbError::Sqlx`] if either insert fails.
pub async fn insert_campaign(pool: &PgPool, record: &IngestedCampaign) -> Result<Uuid, DbError> {
    let value_prop = to_vector(
        EmbeddingField::ValuePropEmbedding,
        record.embeddings.value_prop_embedding.as_deref(),
    )?;
    let copy = to_vector(
        EmbeddingField::CopyEmbedding,
        record.embeddings.copy_embedding.as_deref(),
    )?;
    let visual = to_vector(
        EmbeddingField::VisualEmbedding,
        record.embeddings.visual_embedding.as_deref(),
    )?;

    let c = &record.campaign;
    let value_props: Vec<String> = c.key_value_props.iter().map(ToString::to_string).collect();

    let mut tx = pool.begin().await?;

    let id: Uuid = sqlx::query_scalar(
        "INSERT INTO campaigns \
             (company, brand, channel, primary_product, offer, incentives, \
              key_value_props, imagery_sentiment, imagery_visual_style, \
              imagery_primary_subject, imagery_demographics, campaign_text, \
              full_campaign_text, volume, spend, capture_date, image_paths) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
         RETURNING id",
    )
    .bind(&c.company)
    .bind(&c.brand)
    .bind(c.channel.map(Channel::as_str))
    .bind(&c.primary_product)
    .bind(&c.offer)
    .bind(&c.incentives)
    .bind(&value_props)
    .bind(c.imagery_sentiment.map(Sentiment::as_str))
    .bind(c.imagery_visual_style.map(VisualStyle::as_str))
    .bind(&c.imagery_primary_subject)
    .bind(&c.imagery_demographics)
    .bind(&c.campaign_text)
    .bind(&c.full_campaign_text)
    .bind(c.volume)
    .bind(c.spend)
    .bind(c.capture_date)
    .bind(&c.image_paths)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO campaign_embeddings \
             (campaign_id, value_prop_embedding, copy_embedding, visual_embedding) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(id)
    .bind(value_prop)
    .bind(copy)
    .bind(visual)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::debug!(campaign_id = %id, "inserted campaign");
    Ok(id)
}
