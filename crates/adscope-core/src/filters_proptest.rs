use chrono::{DateTime, Duration, NaiveDate, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use super::*;

// -- Strategy helpers --

fn arb_token<T: Clone + std::fmt::Debug + 'static>(all: &'static [T]) -> impl Strategy<Value = T> {
    prop::sample::select(all)
}

/// `None`, an empty list, or one to three tokens.
fn arb_list<T: Clone + std::fmt::Debug + 'static>(
    all: &'static [T],
) -> impl Strategy<Value = Option<Vec<T>>> {
    prop::option::of(prop::collection::vec(arb_token(all), 0..=3))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..730).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default() + Duration::days(offset)
    })
}

fn arb_date_range() -> impl Strategy<Value = DateRange> {
    (prop::option::of(arb_date()), prop::option::of(arb_date()))
        .prop_map(|(start, end)| DateRange { start, end })
}

fn arb_filters() -> impl Strategy<Value = ActiveFilterSet> {
    (
        arb_list(Channel::ALL),
        arb_list(ValueProp::ALL),
        arb_list(Sentiment::ALL),
        arb_list(VisualStyle::ALL),
        prop::option::of(arb_date_range()),
    )
        .prop_map(
            |(channel, value_prop, sentiment, visual_style, date_range)| ActiveFilterSet {
                channel,
                value_prop,
                sentiment,
                visual_style,
                date_range,
            },
        )
}

fn arb_campaign() -> impl Strategy<Value = Campaign> {
    (
        prop::option::of(arb_token(Channel::ALL)),
        prop::collection::vec(arb_token(ValueProp::ALL), 0..=3),
        prop::option::of(arb_token(Sentiment::ALL)),
        prop::option::of(arb_token(VisualStyle::ALL)),
        prop::option::of(arb_date()),
    )
        .prop_map(
            |(channel, key_value_props, imagery_sentiment, imagery_visual_style, capture_date)| {
                Campaign {
                    id: Uuid::nil(),
                    created_at: DateTime::<Utc>::UNIX_EPOCH,
                    company: None,
                    brand: None,
                    channel,
                    primary_product: None,
                    offer: None,
                    incentives: vec![],
                    key_value_props,
                    imagery_sentiment,
                    imagery_visual_style,
                    imagery_primary_subject: None,
                    imagery_demographics: vec![],
                    campaign_text: None,
                    full_campaign_text: None,
                    volume: None,
                    spend: None,
                    capture_date,
                    image_paths: vec![],
                }
            },
        )
}

// -- Reference predicates, one per field --

fn single_ok<T: PartialEq>(wanted: Option<&Vec<T>>, value: Option<&T>) -> bool {
    match wanted {
        None => true,
        Some(list) if list.is_empty() => true,
        Some(list) => value.is_some_and(|v| list.contains(v)),
    }
}

fn value_props_ok(wanted: Option<&Vec<ValueProp>>, props: &[ValueProp]) -> bool {
    match wanted {
        None => true,
        Some(list) if list.is_empty() => true,
        Some(list) => props.iter().any(|p| list.contains(p)),
    }
}

fn date_ok(range: Option<DateRange>, date: Option<NaiveDate>) -> bool {
    match range {
        None => true,
        Some(DateRange {
            start: None,
            end: None,
        }) => true,
        Some(DateRange { start, end }) => date.is_some_and(|d| {
            start.is_none_or(|s| d >= s) && end.is_none_or(|e| d <= e)
        }),
    }
}

fn reference_matches(c: &Campaign, f: &ActiveFilterSet) -> bool {
    single_ok(f.channel.as_ref(), c.channel.as_ref())
        && value_props_ok(f.value_prop.as_ref(), &c.key_value_props)
        && single_ok(f.sentiment.as_ref(), c.imagery_sentiment.as_ref())
        && single_ok(f.visual_style.as_ref(), c.imagery_visual_style.as_ref())
        && date_ok(f.date_range, c.capture_date)
}

/// A filter populated from the campaign's own values on every field it has.
fn filters_from(c: &Campaign) -> ActiveFilterSet {
    ActiveFilterSet {
        channel: c.channel.map(|v| vec![v]),
        value_prop: (!c.key_value_props.is_empty()).then(|| c.key_value_props.clone()),
        sentiment: c.imagery_sentiment.map(|v| vec![v]),
        visual_style: c.imagery_visual_style.map(|v| vec![v]),
        date_range: c.capture_date.map(|d| DateRange {
            start: Some(d),
            end: Some(d),
        }),
    }
}

proptest! {
    #[test]
    fn merge_with_default_overlay_is_identity(base in arb_filters()) {
        prop_assert_eq!(merge(&base, &ActiveFilterSet::default()), base);
    }

    #[test]
    fn merge_takes_each_present_overlay_field(base in arb_filters(), overlay in arb_filters()) {
        let merged = merge(&base, &overlay);

        let expect_list = |b: Option<Vec<Channel>>, o: Option<Vec<Channel>>| match o {
            Some(v) if v.is_empty() => None,
            Some(v) => Some(v),
            None => b,
        };
        prop_assert_eq!(merged.channel.clone(), expect_list(base.channel.clone(), overlay.channel.clone()));

        match &overlay.sentiment {
            Some(v) if !v.is_empty() => prop_assert_eq!(merged.sentiment.as_ref(), Some(v)),
            Some(_) => prop_assert!(merged.sentiment.is_none()),
            None => prop_assert_eq!(&merged.sentiment, &base.sentiment),
        }

        match overlay.date_range {
            Some(r) if r.is_unbounded() => prop_assert!(merged.date_range.is_none()),
            Some(r) => prop_assert_eq!(merged.date_range, Some(r)),
            None => prop_assert_eq!(merged.date_range, base.date_range),
        }
    }

    #[test]
    fn merge_is_idempotent_for_the_same_overlay(base in arb_filters(), overlay in arb_filters()) {
        let once = merge(&base, &overlay);
        prop_assert_eq!(merge(&once, &overlay), once.clone());
    }

    #[test]
    fn matches_agrees_with_per_field_reference(c in arb_campaign(), f in arb_filters()) {
        prop_assert_eq!(matches(&c, &f), reference_matches(&c, &f));
    }

    #[test]
    fn campaign_matches_filters_built_from_itself(c in arb_campaign()) {
        prop_assert!(matches(&c, &filters_from(&c)));
    }

    #[test]
    fn empty_filters_match_every_campaign(c in arb_campaign()) {
        prop_assert!(matches(&c, &ActiveFilterSet::default()));
    }

    #[test]
    fn apply_filters_is_an_order_preserving_subsequence(
        campaigns in prop::collection::vec(arb_campaign(), 0..12),
        f in arb_filters(),
    ) {
        let tagged: Vec<Campaign> = campaigns
            .into_iter()
            .enumerate()
            .map(|(i, mut c)| {
                c.volume = Some(i64::try_from(i).unwrap_or_default());
                c
            })
            .collect();
        let expected: Vec<Option<i64>> = tagged
            .iter()
            .filter(|c| reference_matches(c, &f))
            .map(|c| c.volume)
            .collect();

        let kept: Vec<Option<i64>> = apply_filters(tagged, &f).iter().map(|c| c.volume).collect();
        prop_assert_eq!(kept, expected);
    }
}
