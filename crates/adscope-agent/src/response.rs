//! Response assembly and follow-up suggestions.

use crate::chat::ChatResponse;
use crate::orchestrator::LoopOutcome;

const SUGGESTIONS_PER_RESPONSE: usize = 3;

/// Offered when the last tool found campaigns.
pub const RESULT_SUGGESTIONS: &[&str] = &[
    "Which of these campaigns have the strongest offers?",
    "Show me similar campaigns on other channels",
    "What visual styles are most common here?",
    "Compare the value propositions across these brands",
];

/// Offered when nothing matched.
pub const NO_RESULT_SUGGESTIONS: &[&str] = &[
    "Show me all campaigns with a sign-up bonus",
    "What cashback offers are running on Instagram?",
    "Find campaigns with an aspirational tone",
    "List recent direct mail campaigns",
];

/// The first three suggestions of the pool selected by `total`.
#[must_use]
pub fn suggestions(total: usize) -> Vec<String> {
    let pool = if total > 0 {
        RESULT_SUGGESTIONS
    } else {
        NO_RESULT_SUGGESTIONS
    };
    pool.iter()
        .take(SUGGESTIONS_PER_RESPONSE)
        .map(|s| (*s).to_string())
        .collect()
}

#[must_use]
pub fn assemble_response(outcome: LoopOutcome) -> ChatResponse {
    ChatResponse {
        suggestions: suggestions(outcome.total),
        response: outcome.answer,
        campaigns: outcome.campaigns,
        total: outcome.total,
        detected_filters: outcome.detected_filters.filter(|f| !f.is_empty()),
    }
}
