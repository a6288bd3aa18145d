//! The multi-valued filter model shared by UI state and every search tool.
//!
//! Within a field values are OR'd; across fields constraints are AND'd. A field
//! that is `None` places no constraint on results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::campaign::Campaign;
use crate::vocab::{Channel, Sentiment, ValueProp, VisualStyle};
use crate::CoreError;

/// Inclusive capture-date bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Builds a range from optional `YYYY-MM-DD` strings. Blank strings are
    /// treated as open bounds.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDate`] if a bound does not parse or if
    /// `start` falls after `end`.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, CoreError> {
        let range = Self {
            start: parse_bound(start)?,
            end: parse_bound(end)?,
        };
        if let (Some(start), Some(end)) = (range.start, range.end) {
            if start > end {
                return Err(CoreError::InvalidDate {
                    value: format!("{start}..{end}"),
                });
            }
        }
        Ok(range)
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDate>, CoreError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| CoreError::InvalidDate {
                value: s.to_string(),
            }),
    }
}

/// Caller-held filter state for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveFilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Vec<Channel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_prop: Option<Vec<ValueProp>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Vec<Sentiment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_style: Option<Vec<VisualStyle>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl ActiveFilterSet {
    /// `true` when no field constrains results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        active(self.channel.as_deref()).is_none()
            && active(self.value_prop.as_deref()).is_none()
            && active(self.sentiment.as_deref()).is_none()
            && active(self.visual_style.as_deref()).is_none()
            && self.date_range.is_none_or(|r| r.is_unbounded())
    }

    /// Active channel constraint, treating an empty list as no constraint.
    #[must_use]
    pub fn channels(&self) -> Option<&[Channel]> {
        active(self.channel.as_deref())
    }

    #[must_use]
    pub fn value_props(&self) -> Option<&[ValueProp]> {
        active(self.value_prop.as_deref())
    }

    #[must_use]
    pub fn sentiments(&self) -> Option<&[Sentiment]> {
        active(self.sentiment.as_deref())
    }

    #[must_use]
    pub fn visual_styles(&self) -> Option<&[VisualStyle]> {
        active(self.visual_style.as_deref())
    }

    #[must_use]
    pub fn dates(&self) -> Option<DateRange> {
        self.date_range.filter(|r| !r.is_unbounded())
    }
}

fn active<T>(values: Option<&[T]>) -> Option<&[T]> {
    values.filter(|v| !v.is_empty())
}

fn overlay_list<T: Clone>(base: Option<&Vec<T>>, overlay: Option<&Vec<T>>) -> Option<Vec<T>> {
    match overlay {
        Some(values) if values.is_empty() => None,
        Some(values) => Some(values.clone()),
        None => base.cloned(),
    }
}

/// Lays `overlay` on top of `base`.
///
/// A field present in `overlay` replaces the same field in `base`; a present
/// but empty list (or an unbounded date range) clears it. Fields absent from
/// `overlay` carry over from `base` unchanged.
#[must_use]
pub fn merge(base: &ActiveFilterSet, overlay: &ActiveFilterSet) -> ActiveFilterSet {
    ActiveFilterSet {
        channel: overlay_list(base.channel.as_ref(), overlay.channel.as_ref()),
        value_prop: overlay_list(base.value_prop.as_ref(), overlay.value_prop.as_ref()),
        sentiment: overlay_list(base.sentiment.as_ref(), overlay.sentiment.as_ref()),
        visual_style: overlay_list(base.visual_style.as_ref(), overlay.visual_style.as_ref()),
        date_range: match overlay.date_range {
            Some(range) if range.is_unbounded() => None,
            Some(range) => Some(range),
            None => base.date_range,
        },
    }
}

/// Whether `campaign` satisfies every constraint in `filters`.
///
/// A campaign whose value for a constrained dimension is missing fails that
/// constraint.
#[must_use]
pub fn matches(campaign: &Campaign, filters: &ActiveFilterSet) -> bool {
    if let Some(channels) = filters.channels() {
        if !campaign.channel.is_some_and(|c| channels.contains(&c)) {
            return false;
        }
    }

    if let Some(props) = filters.value_props() {
        if !campaign.key_value_props.iter().any(|p| props.contains(p)) {
            return false;
        }
    }

    if let Some(sentiments) = filters.sentiments() {
        if !campaign
            .imagery_sentiment
            .is_some_and(|s| sentiments.contains(&s))
        {
            return false;
        }
    }

    if let Some(styles) = filters.visual_styles() {
        if !campaign
            .imagery_visual_style
            .is_some_and(|s| styles.contains(&s))
        {
            return false;
        }
    }

    if let Some(range) = filters.dates() {
        if !campaign.capture_date.is_some_and(|d| range.contains(d)) {
            return false;
        }
    }

    true
}

/// Order-preserving in-memory narrowing of an already-fetched list.
#[must_use]
pub fn apply_filters(campaigns: Vec<Campaign>, filters: &ActiveFilterSet) -> Vec<Campaign> {
    if filters.is_empty() {
        return campaigns;
    }
    campaigns
        .into_iter()
        .filter(|c| matches(c, filters))
        .collect()
}

#[cfg(test)]
#[path = "filters_test.rs"]
mod tests;

#[cfg(test)]
#[path = "filters_proptest.rs"]
mod proptests;
