//! The single summarization routine every tool's output goes through.

use adscope_core::Campaign;

use super::ToolResult;

pub const NO_RESULTS_SUMMARY: &str = "No campaigns found.";
/// Entries narrated to the model; the campaign list itself is not capped here.
pub const MAX_SUMMARY_ENTRIES: usize = 20;
const SNIPPET_CHARS: usize = 200;
const FIELD_DELIMITER: &str = " | ";

/// Wraps `campaigns` in a [`ToolResult`] whose summary narrates at most
/// [`MAX_SUMMARY_ENTRIES`] of them, in order.
#[must_use]
pub fn build_tool_result(campaigns: Vec<Campaign>) -> ToolResult {
    ToolResult {
        count: campaigns.len(),
        summary_for_llm: summarize(&campaigns),
        campaigns,
    }
}

fn summarize(campaigns: &[Campaign]) -> String {
    if campaigns.is_empty() {
        return NO_RESULTS_SUMMARY.to_string();
    }

    let total = campaigns.len();
    let mut lines = Vec::with_capacity(MAX_SUMMARY_ENTRIES.min(total) + 2);
    lines.push(format!("Found {total} {}:", plural(total)));
    lines.extend(
        campaigns
            .iter()
            .take(MAX_SUMMARY_ENTRIES)
            .enumerate()
            .map(|(i, c)| summary_line(i + 1, c)),
    );
    if total > MAX_SUMMARY_ENTRIES {
        let omitted = total - MAX_SUMMARY_ENTRIES;
        lines.push(format!("...and {omitted} more {} not shown.", plural(omitted)));
    }
    lines.join("\n")
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "campaign"
    } else {
        "campaigns"
    }
}

fn summary_line(index: usize, campaign: &Campaign) -> String {
    let mut parts = vec![format!("#{index}")];

    let company = non_blank(campaign.company.as_deref());
    let brand = non_blank(campaign.brand.as_deref());
    match (company, brand) {
        (Some(company), Some(brand)) => parts.push(format!("{company} ({brand})")),
        (Some(name), None) | (None, Some(name)) => parts.push(name),
        (None, None) => {}
    }

    if let Some(offer) = non_blank(campaign.offer.as_deref()) {
        parts.push(format!("Offer: {offer}"));
    }
    if !campaign.key_value_props.is_empty() {
        let props: Vec<&str> = campaign
            .key_value_props
            .iter()
            .map(|p| p.as_str())
            .collect();
        parts.push(format!("Value props: {}", props.join(", ")));
    }
    if let Some(sentiment) = campaign.imagery_sentiment {
        parts.push(format!("Sentiment: {sentiment}"));
    }
    if let Some(style) = campaign.imagery_visual_style {
        parts.push(format!("Style: {style}"));
    }
    if let Some(date) = campaign.capture_date {
        parts.push(format!("Date: {date}"));
    }
    if let Some(text) = non_blank(campaign.body_text()) {
        parts.push(format!("Text: {}", snippet(&text)));
    }

    parts.join(FIELD_DELIMITER)
}

/// Collapses internal whitespace (including newlines) so every entry stays on
/// one line; `None` for missing or blank input.
fn non_blank(value: Option<&str>) -> Option<String> {
    let collapsed = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= SNIPPET_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", truncated.trim_end())
}
