//! Read queries over `campaigns` and `campaign_embeddings`.
//!
//! Every list query takes an [`ActiveFilterSet`] and applies it with the same
//! semantics as [`adscope_core::matches`]: OR within a field, AND across
//! fields, and a NULL column never satisfies a constrained field.

use adscope_core::{
    ActiveFilterSet, Campaign, Channel, EmbeddingField, Sentiment, ValueProp, VisualStyle,
};
use chrono::{DateTime, NaiveDate, Utc};
use pgvector::Vector;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const CAMPAIGN_COLUMNS: &str = "c.id, c.created_at, c.company, c.brand, c.channel, \
     c.primary_product, c.offer, c.incentives, c.key_value_props, \
     c.imagery_sentiment, c.imagery_visual_style, c.imagery_primary_subject, \
     c.imagery_demographics, c.campaign_text, c.full_campaign_text, \
     c.volume, c.spend, c.capture_date, c.image_paths";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `campaigns` table, with vocabulary columns still as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub company: Option<String>,
    pub brand: Option<String>,
    pub channel: Option<String>,
    pub primary_product: Option<String>,
    pub offer: Option<String>,
    pub incentives: Vec<String>,
    pub key_value_props: Vec<String>,
    pub imagery_sentiment: Option<String>,
    pub imagery_visual_style: Option<String>,
    pub imagery_primary_subject: Option<String>,
    pub imagery_demographics: Vec<String>,
    pub campaign_text: Option<String>,
    pub full_campaign_text: Option<String>,
    pub volume: Option<i64>,
    pub spend: Option<Decimal>,
    pub capture_date: Option<NaiveDate>,
    pub image_paths: Vec<String>,
}

/// A campaign row paired with its ranking score (cosine similarity or
/// full-text rank, depending on the query).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoredCampaignRow {
    #[sqlx(flatten)]
    pub campaign: CampaignRow,
    pub score: f64,
}

fn parse_column<T>(column: &'static str, value: Option<String>) -> Result<Option<T>, DbError>
where
    T: std::str::FromStr,
{
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| DbError::InvalidColumn { column, value: raw })
        })
        .transpose()
}

impl CampaignRow {
    /// Convert to the typed domain model.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidColumn`] if a vocabulary column holds a
    /// token outside its vocabulary.
    pub fn into_campaign(self) -> Result<Campaign, DbError> {
        let key_value_props = self
            .key_value_props
            .into_iter()
            .map(|raw| {
                raw.parse::<ValueProp>().map_err(|_| DbError::InvalidColumn {
                    column: "key_value_props",
                    value: raw,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Campaign {
            id: self.id,
            created_at: self.created_at,
            company: self.company,
            brand: self.brand,
            channel: parse_column::<Channel>("channel", self.channel)?,
            primary_product: self.primary_product,
            offer: self.offer,
            incentives: self.incentives,
            key_value_props,
            imagery_sentiment: parse_column::<Sentiment>(
                "imagery_sentiment",
                self.imagery_sentiment,
            )?,
            imagery_visual_style: parse_column::<VisualStyle>(
                "imagery_visual_style",
                self.imagery_visual_style,
            )?,
            imagery_primary_subject: self.imagery_primary_subject,
            imagery_demographics: self.imagery_demographics,
            campaign_text: self.campaign_text,
            full_campaign_text: self.full_campaign_text,
            volume: self.volume,
            spend: self.spend,
            capture_date: self.capture_date,
            image_paths: self.image_paths,
        })
    }
}

// ---------------------------------------------------------------------------
// Filter binding
// ---------------------------------------------------------------------------

/// Bind-ready form of an [`ActiveFilterSet`]: `None` means unconstrained.
#[derive(Debug, Default)]
struct FilterBinds {
    channels: Option<Vec<String>>,
    value_props: Option<Vec<String>>,
    sentiments: Option<Vec<String>>,
    visual_styles: Option<Vec<String>>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

fn tokens<T: ToString>(values: Option<&[T]>) -> Option<Vec<String>> {
    values.map(|v| v.iter().map(ToString::to_string).collect())
}

impl From<&ActiveFilterSet> for FilterBinds {
    fn from(filters: &ActiveFilterSet) -> Self {
        let dates = filters.dates();
        Self {
            channels: tokens(filters.channels()),
            value_props: tokens(filters.value_props()),
            sentiments: tokens(filters.sentiments()),
            visual_styles: tokens(filters.visual_styles()),
            start: dates.and_then(|r| r.start),
            end: dates.and_then(|r| r.end),
        }
    }
}

/// Escape `LIKE` metacharacters so user text matches literally.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// List campaigns matching every constrained filter field, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn filter_campaigns(
    pool: &PgPool,
    filters: &ActiveFilterSet,
    limit: i64,
) -> Result<Vec<CampaignRow>, DbError> {
    let binds = FilterBinds::from(filters);
    let sql = format!(
        "SELECT {CAMPAIGN_COLUMNS} \
         FROM campaigns c \
         WHERE ($1::TEXT[] IS NULL OR c.channel = ANY($1)) \
           AND ($2::TEXT[] IS NULL OR c.key_value_props && $2) \
           AND ($3::TEXT[] IS NULL OR c.imagery_sentiment = ANY($3)) \
           AND ($4::TEXT[] IS NULL OR c.imagery_visual_style = ANY($4)) \
           AND ($5::DATE IS NULL OR c.capture_date >= $5) \
           AND ($6::DATE IS NULL OR c.capture_date <= $6) \
         ORDER BY c.created_at DESC, c.id DESC \
         LIMIT $7"
    );

    let rows = sqlx::query_as::<_, CampaignRow>(&sql)
        .bind(binds.channels)
        .bind(binds.value_props)
        .bind(binds.sentiments)
        .bind(binds.visual_styles)
        .bind(binds.start)
        .bind(binds.end)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Cosine-similarity search over one embedding facet.
///
/// Only campaigns whose facet vector is non-null and whose similarity exceeds
/// `threshold` are returned, most similar first. Channel and value-prop
/// constraints are pushed down here; callers re-apply the remaining filter
/// fields to the returned rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails (for example when the
/// `vector` extension or the embeddings table is missing).
pub async fn similarity_search(
    pool: &PgPool,
    field: EmbeddingField,
    query_embedding: &[f32],
    filters: &ActiveFilterSet,
    threshold: f32,
    limit: i64,
) -> Result<Vec<ScoredCampaignRow>, DbError> {
    let binds = FilterBinds::from(filters);
    // `field.as_str()` is one of three fixed column names, never user text.
    let column = field.as_str();
    let sql = format!(
        "SELECT {CAMPAIGN_COLUMNS}, 1 - (e.{column} <=> $1::vector) AS score \
         FROM campaigns c \
         JOIN campaign_embeddings e ON e.campaign_id = c.id \
         WHERE e.{column} IS NOT NULL \
           AND 1 - (e.{column} <=> $1::vector) > $2 \
           AND ($3::TEXT[] IS NULL OR c.channel = ANY($3)) \
           AND ($4::TEXT[] IS NULL OR c.key_value_props && $4) \
         ORDER BY e.{column} <=> $1::vector \
         LIMIT $5"
    );

    let embedding = Vector::from(query_embedding.to_vec());
    let rows = sqlx::query_as::<_, ScoredCampaignRow>(&sql)
        .bind(&embedding)
        .bind(f64::from(threshold))
        .bind(binds.channels)
        .bind(binds.value_props)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    tracing::debug!(
        field = column,
        threshold,
        row_count = rows.len(),
        "similarity search returned"
    );

    Ok(rows)
}

/// Natural-language full-text search over campaign body text, best rank first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn text_search(
    pool: &PgPool,
    query: &str,
    channels: Option<&[Channel]>,
    limit: i64,
) -> Result<Vec<ScoredCampaignRow>, DbError> {
    let sql = format!(
        "SELECT {CAMPAIGN_COLUMNS}, ts_rank(c.search_document, q)::FLOAT8 AS score \
         FROM campaigns c, websearch_to_tsquery('english', $1) q \
         WHERE c.search_document @@ q \
           AND ($2::TEXT[] IS NULL OR c.channel = ANY($2)) \
         ORDER BY score DESC, c.created_at DESC \
         LIMIT $3"
    );

    let rows = sqlx::query_as::<_, ScoredCampaignRow>(&sql)
        .bind(query)
        .bind(tokens(channels.filter(|c| !c.is_empty())))
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Case-insensitive substring search over the offer field.
///
/// Campaigns with a NULL offer never match.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn offer_search(
    pool: &PgPool,
    query: &str,
    filters: &ActiveFilterSet,
    limit: i64,
) -> Result<Vec<CampaignRow>, DbError> {
    let binds = FilterBinds::from(filters);
    let sql = format!(
        "SELECT {CAMPAIGN_COLUMNS} \
         FROM campaigns c \
         WHERE c.offer IS NOT NULL \
           AND c.offer ILIKE '%' || $1 || '%' \
           AND ($2::TEXT[] IS NULL OR c.channel = ANY($2)) \
           AND ($3::TEXT[] IS NULL OR c.key_value_props && $3) \
           AND ($4::TEXT[] IS NULL OR c.imagery_sentiment = ANY($4)) \
           AND ($5::TEXT[] IS NULL OR c.imagery_visual_style = ANY($5)) \
           AND ($6::DATE IS NULL OR c.capture_date >= $6) \
           AND ($7::DATE IS NULL OR c.capture_date <= $7) \
         ORDER BY c.created_at DESC, c.id DESC \
         LIMIT $8"
    );

    let rows = sqlx::query_as::<_, CampaignRow>(&sql)
        .bind(escape_like(query))
        .bind(binds.channels)
        .bind(binds.value_props)
        .bind(binds.sentiments)
        .bind(binds.visual_styles)
        .bind(binds.start)
        .bind(binds.end)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Fetch a single campaign by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_campaign(pool: &PgPool, id: Uuid) -> Result<Option<CampaignRow>, DbError> {
    let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM campaigns c WHERE c.id = $1");
    let row = sqlx::query_as::<_, CampaignRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}
