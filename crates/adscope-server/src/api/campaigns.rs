use std::str::FromStr;

use adscope_core::{ActiveFilterSet, Campaign, CoreError, DateRange};
use axum::{
    extract::{rejection::PathRejection, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_store_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// Query-string filters. List fields are comma-separated vocabulary tokens.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CampaignQuery {
    pub channel: Option<String>,
    pub value_prop: Option<String>,
    pub sentiment: Option<String>,
    pub visual_style: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<i64>,
}

impl CampaignQuery {
    fn to_filters(&self) -> Result<ActiveFilterSet, CoreError> {
        let dates = DateRange::parse(self.start_date.as_deref(), self.end_date.as_deref())?;
        Ok(ActiveFilterSet {
            channel: parse_csv(self.channel.as_deref())?,
            value_prop: parse_csv(self.value_prop.as_deref())?,
            sentiment: parse_csv(self.sentiment.as_deref())?,
            visual_style: parse_csv(self.visual_style.as_deref())?,
            date_range: (!dates.is_unbounded()).then_some(dates),
        })
    }
}

fn parse_csv<T: FromStr<Err = CoreError>>(raw: Option<&str>) -> Result<Option<Vec<T>>, CoreError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<T>)
        .collect::<Result<Vec<T>, _>>()
        .map(Some)
}

pub(super) async fn list_campaigns(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CampaignQuery>,
) -> Result<Json<ApiResponse<Vec<Campaign>>>, ApiError> {
    let filters = query
        .to_filters()
        .map_err(|e| ApiError::new("validation_error", e.to_string()))?;
    let limit = usize::try_from(normalize_limit(query.limit)).unwrap_or(1);

    let data = state
        .store
        .filter_campaigns(&filters, limit)
        .await
        .map_err(|e| map_store_error(&req_id.0, &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_campaign(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ApiResponse<Campaign>>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::new("bad_request", "campaign id must be a UUID"))?;

    let campaign = state
        .store
        .get_campaign(id)
        .await
        .map_err(|e| map_store_error(&req_id.0, &e))?
        .ok_or_else(|| ApiError::new("not_found", format!("campaign {id} not found")))?;

    Ok(Json(ApiResponse {
        data: campaign,
        meta: ResponseMeta::new(req_id.0),
    }))
}
