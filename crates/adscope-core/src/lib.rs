//! Shared domain model for adscope: campaign records, the controlled
//! vocabularies used to classify them, the filter model shared by the UI and
//! every search tool, and environment-driven application configuration.

mod app_config;
mod campaign;
mod config;
mod filters;
mod vocab;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use campaign::{Campaign, CampaignEmbedding, EMBEDDING_DIMENSIONS};
pub use config::{load_app_config, load_app_config_from_env};
pub use filters::{apply_filters, matches, merge, ActiveFilterSet, DateRange};
pub use vocab::{Channel, EmbeddingField, Sentiment, ValueProp, VisualStyle};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown {vocabulary} value: '{value}'")]
    UnknownVariant {
        vocabulary: &'static str,
        value: String,
    },

    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
