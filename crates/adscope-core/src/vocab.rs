//! Controlled vocabularies for campaign classification.
//!
//! Every enumeration parses leniently (case-insensitive, spaces and hyphens
//! read as underscores) but never accepts a token outside its vocabulary, so
//! out-of-vocabulary values are stopped before they reach the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Lowercases and folds separators so `"Direct Mail"` and `"direct-mail"`
/// both become `"direct_mail"`.
fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $token:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every member of the vocabulary, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The canonical wire token.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }

            /// Canonical tokens for every member, for prompts and tool schemas.
            #[must_use]
            pub fn tokens() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let token = normalize_token(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == token)
                    .ok_or_else(|| CoreError::UnknownVariant {
                        vocabulary: $label,
                        value: s.to_string(),
                    })
            }
        }
    };
}

vocabulary! {
    /// Distribution channel a campaign ran on.
    Channel, "channel" {
        Facebook => "facebook",
        Instagram => "instagram",
        Twitter => "twitter",
        Email => "email",
        DirectMail => "direct_mail",
    }
}

vocabulary! {
    /// Key value proposition advertised by a credit-card campaign.
    ValueProp, "value_prop" {
        Cashback => "cashback",
        TravelRewards => "travel_rewards",
        LowApr => "low_apr",
        NoAnnualFee => "no_annual_fee",
        SignUpBonus => "sign_up_bonus",
        CreditBuilding => "credit_building",
    }
}

vocabulary! {
    /// Emotional register of a campaign's imagery.
    Sentiment, "sentiment" {
        Aspirational => "aspirational",
        Joyful => "joyful",
        Confident => "confident",
        Calm => "calm",
        Urgent => "urgent",
    }
}

vocabulary! {
    VisualStyle, "visual_style" {
        Photography => "photography",
        Illustration => "illustration",
        Minimalist => "minimalist",
        BoldGraphic => "bold_graphic",
        Lifestyle => "lifestyle",
        ProductFocused => "product_focused",
    }
}

/// Which of the three per-campaign embeddings a similarity search runs over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingField {
    #[default]
    ValuePropEmbedding,
    CopyEmbedding,
    VisualEmbedding,
}

impl EmbeddingField {
    pub const ALL: &'static [EmbeddingField] = &[
        EmbeddingField::ValuePropEmbedding,
        EmbeddingField::CopyEmbedding,
        EmbeddingField::VisualEmbedding,
    ];

    /// The canonical wire token, which is also the storage column name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingField::ValuePropEmbedding => "value_prop_embedding",
            EmbeddingField::CopyEmbedding => "copy_embedding",
            EmbeddingField::VisualEmbedding => "visual_embedding",
        }
    }

    #[must_use]
    pub fn tokens() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.as_str()).collect()
    }
}

impl fmt::Display for EmbeddingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "value_prop_embedding" | "value_prop" | "value_props" => {
                Ok(EmbeddingField::ValuePropEmbedding)
            }
            "copy_embedding" | "copy" => Ok(EmbeddingField::CopyEmbedding),
            "visual_embedding" | "visual" => Ok(EmbeddingField::VisualEmbedding),
            _ => Err(CoreError::UnknownVariant {
                vocabulary: "embedding_field",
                value: s.to_string(),
            }),
        }
    }
}
