//! `import` command: load ingestion output into the campaign store.

use std::path::Path;

use adscope_db::IngestedCampaign;
use anyhow::Context;
use sqlx::PgPool;

/// Parse a JSON array of `{campaign, embeddings}` records.
pub(crate) fn parse_records(raw: &str) -> anyhow::Result<Vec<IngestedCampaign>> {
    serde_json::from_str(raw).context("expected a JSON array of {campaign, embeddings} records")
}

pub(crate) fn read_records(path: &Path) -> anyhow::Result<Vec<IngestedCampaign>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_records(&raw)
}

/// Insert every record, stopping at the first failure.
///
/// Each record is its own transaction, so rows before the failing one stay
/// committed.
///
/// # Errors
///
/// Returns the failing record's index alongside the database error.
pub(crate) async fn run_import(pool: &PgPool, records: &[IngestedCampaign]) -> anyhow::Result<usize> {
    for (index, record) in records.iter().enumerate() {
        let id = adscope_db::insert_campaign(pool, record)
            .await
            .with_context(|| format!("record {index} failed to import"))?;
        tracing::debug!(%id, index, "campaign imported");
    }
    Ok(records.len())
}
