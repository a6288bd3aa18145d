use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocab::{Channel, EmbeddingField, Sentiment, ValueProp, VisualStyle};

/// Dimension of every campaign embedding vector.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// One analyzed marketing asset.
///
/// Created once by ingestion and read-only from the chat and query surfaces.
/// Classification fields are typed by their vocabulary so an out-of-vocabulary
/// value cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
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
    /// Ordered object-storage locators for the campaign's images.
    #[serde(default)]
    pub image_paths: Vec<String>,
}

impl Campaign {
    /// `true` when the offer field carries non-whitespace text.
    #[must_use]
    pub fn has_offer(&self) -> bool {
        self.offer.as_deref().is_some_and(|o| !o.trim().is_empty())
    }

    /// The campaign's body text: the short copy if present, otherwise the
    /// full transcription.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        self.campaign_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                self.full_campaign_text
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
            })
    }
}

/// The three facet embeddings stored 1:1 with a [`Campaign`].
///
/// A facet is `None` when its source text was empty; such campaigns are
/// never returned by similarity search over that facet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignEmbedding {
    pub value_prop_embedding: Option<Vec<f32>>,
    pub copy_embedding: Option<Vec<f32>>,
    pub visual_embedding: Option<Vec<f32>>,
}

impl CampaignEmbedding {
    #[must_use]
    pub fn get(&self, field: EmbeddingField) -> Option<&[f32]> {
        match field {
            EmbeddingField::ValuePropEmbedding => self.value_prop_embedding.as_deref(),
            EmbeddingField::CopyEmbedding => self.copy_embedding.as_deref(),
            EmbeddingField::VisualEmbedding => self.visual_embedding.as_deref(),
        }
    }

    /// Returns the first facet whose length is not [`EMBEDDING_DIMENSIONS`].
    #[must_use]
    pub fn mismatched_dimension(&self) -> Option<(EmbeddingField, usize)> {
        EmbeddingField::ALL.iter().find_map(|field| {
            self.get(*field)
                .filter(|v| v.len() != EMBEDDING_DIMENSIONS)
                .map(|v| (*field, v.len()))
        })
    }
}
