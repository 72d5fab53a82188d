//! Expansion of weekly recurring calendar events into concrete occurrences.
//!
//! Events flagged as recurring carry a serialized [`RecurrencePattern`]; for
//! display, the pattern is materialized into dated occurrences inside a
//! viewing window. Everything here is pure computation over UTC timestamps.

use chrono::{DateTime, Datelike, Months, NaiveDate, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use hearth_core::types::ViewMode;

/// Default series length when `endType` is `after` but the count is
/// missing or non-positive.
const DEFAULT_OCCURRENCE_COUNT: i64 = 10;

/// How far below `rangeStart` occurrences are still emitted. Catches
/// occurrences that start before the window but span into it.
const SEARCH_FLOOR_DAYS: i64 = 7;

/// A calendar event as seen by the expansion engine.
///
/// Serialization is the camelCase wire shape of the REST API. Fields the
/// engine does not know about are preserved verbatim through `extra`, so an
/// event fetched with joined creator data survives expansion untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
    /// Set on generated occurrences so clients can handle edits differently.
    #[serde(
        rename = "_isRecurrenceInstance",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_recurrence_instance: bool,
    /// Back-reference from a generated occurrence to its base event.
    #[serde(
        rename = "_baseEventId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub base_event_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl EventRecord {
    /// Builds the occurrence of this event starting at `start`. The id is
    /// derived from the base id plus the concrete start instant, so it is
    /// deterministic and unique within the series.
    fn occurrence(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: format!(
                "{}-occurrence-{}",
                self.id,
                start.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            start_date: start,
            end_date: end,
            is_recurrence_instance: true,
            base_event_id: Some(self.id.clone()),
            ..self.clone()
        }
    }
}

/// Termination policy of a weekly recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndType {
    Never,
    On,
    After,
}

/// The weekly repeat rule attached to a recurring event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    /// Weekday indices on which occurrences recur, 0=Sunday..6=Saturday.
    pub days_of_week: Vec<u32>,
    pub end_type: EndType,
    /// Inclusive last calendar day; meaningful only when `end_type` is `On`.
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub end_date: Option<NaiveDate>,
    /// Series length; meaningful only when `end_type` is `After`.
    #[serde(default)]
    pub end_after_occurrences: Option<i64>,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp, keeping the calendar
/// date. Anything else is a decode failure for the whole pattern.
fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_calendar_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid end date: {s}"))),
    }
}

fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Some(date)
    } else {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    }
}

/// ## Summary
/// Expands recurring events into individual occurrences.
///
/// Non-recurring events (and events without a pattern payload) pass through
/// unchanged. A pattern that fails to decode is logged and the original event
/// is kept; the rest of the batch is unaffected. Output order mirrors input
/// order, with each recurring event replaced in place by its occurrences.
#[must_use]
pub fn expand_recurring_events(
    events: Vec<EventRecord>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<EventRecord> {
    let mut expanded = Vec::with_capacity(events.len());

    for event in events {
        if !event.is_recurring || event.recurrence_pattern.is_none() {
            expanded.push(event);
            continue;
        }

        let raw = event.recurrence_pattern.as_deref().unwrap_or_default();
        match serde_json::from_str::<RecurrencePattern>(raw) {
            Ok(pattern) => {
                tracing::trace!(
                    event_id = %event.id,
                    days_of_week = ?pattern.days_of_week,
                    "Expanding recurring event"
                );
                expanded.extend(generate_occurrences(&event, &pattern, range_start, range_end));
            }
            Err(err) => {
                tracing::error!(
                    event_id = %event.id,
                    error = %err,
                    "Failed to parse recurrence pattern for event"
                );
                // If parsing fails, keep the original event
                expanded.push(event);
            }
        }
    }

    expanded
}

/// ## Summary
/// Generates the individual occurrences of a recurring event that fall near
/// the display window.
///
/// Scans day by day from the base event's start up to a termination instant:
/// the pattern's end date (end of day) for `on`, otherwise `range_end` plus
/// one year, always clamped to that one-year horizon. Under `after`, every
/// weekday-matching date on or after the base start consumes the count,
/// whether or not the occurrence is emitted; the count bounds the logical
/// series, not the visible window. Occurrences are emitted only when they end
/// on or after `range_start` minus seven days.
#[must_use]
pub fn generate_occurrences(
    base_event: &EventRecord,
    pattern: &RecurrencePattern,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<EventRecord> {
    let event_start = base_event.start_date;
    let duration = base_event.end_date - base_event.start_date;

    // Scan horizon: bounds iteration for never-ending patterns and caps
    // pathological end dates.
    let horizon = range_end
        .checked_add_months(Months::new(12))
        .unwrap_or(range_end);

    let termination = match (pattern.end_type, pattern.end_date) {
        (EndType::On, Some(date)) => end_of_day(date).min(horizon),
        _ => horizon,
    };

    let count_limit = match pattern.end_type {
        EndType::After => pattern
            .end_after_occurrences
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_OCCURRENCE_COUNT),
        EndType::Never | EndType::On => i64::MAX,
    };

    let search_floor = range_start - TimeDelta::days(SEARCH_FLOOR_DAYS);

    let mut occurrences = Vec::new();
    let mut current = event_start;
    let mut occurrence_count: i64 = 0;

    while current <= termination && occurrence_count < count_limit {
        let day_of_week = current.weekday().num_days_from_sunday();

        if pattern.days_of_week.contains(&day_of_week) && current >= event_start {
            occurrence_count += 1;

            let occurrence_start = current;
            let occurrence_end = occurrence_start + duration;

            if occurrence_end >= search_floor && occurrence_start <= horizon {
                occurrences.push(base_event.occurrence(occurrence_start, occurrence_end));
            }

            if occurrence_count >= count_limit {
                break;
            }
        }

        current += TimeDelta::days(1);
    }

    occurrences
}

/// ## Summary
/// Derives a padded display window from a pivot date and a view granularity.
///
/// Day view spans -7/+14 days, week view -14/+28 days, month view -2/+3
/// months, normalized to start of day / end of day.
#[must_use]
pub fn get_calendar_range(
    current_date: DateTime<Utc>,
    view_mode: ViewMode,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let (start, end) = match view_mode {
        ViewMode::Day => (
            current_date - TimeDelta::days(7),
            current_date + TimeDelta::days(14),
        ),
        ViewMode::Week => (
            current_date - TimeDelta::days(14),
            current_date + TimeDelta::days(28),
        ),
        ViewMode::Month => (
            current_date
                .checked_sub_months(Months::new(2))
                .unwrap_or(current_date),
            current_date
                .checked_add_months(Months::new(3))
                .unwrap_or(current_date),
        ),
    };

    (start_of_day(start), end_of_day(end.date_naive()))
}

fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_milli_opt(0, 0, 0, 0)
        .map_or(instant, |naive| naive.and_utc())
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .map_or_else(|| date.and_time(chrono::NaiveTime::MIN).and_utc(), |naive| {
            naive.and_utc()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single().expect("valid timestamp")
    }

    fn base_event(start: DateTime<Utc>, end: DateTime<Utc>, pattern: Option<&str>) -> EventRecord {
        EventRecord {
            id: "evt-1".to_string(),
            title: "Standup".to_string(),
            description: None,
            start_date: start,
            end_date: end,
            location: None,
            all_day: false,
            is_recurring: pattern.is_some(),
            recurrence_pattern: pattern.map(String::from),
            is_recurrence_instance: false,
            base_event_id: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test_log::test]
    fn test_non_recurring_event_passes_through_unchanged() {
        let json = serde_json::json!({
            "id": "evt-9",
            "title": "Dentist",
            "description": null,
            "startDate": "2024-03-04T10:00:00Z",
            "endDate": "2024-03-04T11:00:00Z",
            "location": "Downtown",
            "allDay": false,
            "isRecurring": false,
            "recurrencePattern": null,
            "createdBy": "user-1",
            "creator": {"id": "user-1", "name": "Jane", "email": "jane@family-hub.test"}
        });
        let event: EventRecord = serde_json::from_value(json.clone()).expect("decodes");

        let expanded = expand_recurring_events(
            vec![event.clone()],
            utc(2024, 3, 1, 0, 0, 0),
            utc(2024, 3, 31, 0, 0, 0),
        );

        assert_eq!(expanded, vec![event]);
        // Unknown fields survive the round trip verbatim
        let out = serde_json::to_value(&expanded[0]).expect("encodes");
        assert_eq!(out["creator"], json["creator"]);
        assert_eq!(out["createdBy"], json["createdBy"]);
    }

    #[test_log::test]
    fn test_unparseable_pattern_keeps_original_event() {
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some("not valid json"),
        );

        let expanded = expand_recurring_events(
            vec![event.clone()],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        assert_eq!(expanded, vec![event]);
    }

    #[test_log::test]
    fn test_decode_failure_does_not_abort_batch() {
        let broken = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some("{"),
        );
        let mut weekly = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[1],"endType":"after","endAfterOccurrences":2}"#),
        );
        weekly.id = "evt-2".to_string();

        let expanded = expand_recurring_events(
            vec![broken.clone(), weekly],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        // Broken event first, then the second event's two occurrences
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[0], broken);
        assert!(expanded[1].is_recurrence_instance);
        assert_eq!(expanded[1].base_event_id.as_deref(), Some("evt-2"));
    }

    #[test_log::test]
    fn test_duration_is_preserved_exactly() {
        let event = base_event(
            utc(2024, 1, 1, 9, 30, 0),
            utc(2024, 1, 1, 11, 45, 0),
            Some(r#"{"daysOfWeek":[1,3,5],"endType":"never"}"#),
        );
        let duration = event.end_date - event.start_date;

        let expanded = expand_recurring_events(
            vec![event],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        assert!(!expanded.is_empty());
        for occurrence in &expanded {
            assert_eq!(occurrence.end_date - occurrence.start_date, duration);
        }
    }

    #[test_log::test]
    fn test_weekday_filter() {
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[1,3,5],"endType":"never"}"#),
        );

        let expanded = expand_recurring_events(
            vec![event],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        for occurrence in &expanded {
            let dow = occurrence.start_date.weekday().num_days_from_sunday();
            assert!([1, 3, 5].contains(&dow), "unexpected weekday {dow}");
        }
    }

    #[test_log::test]
    fn test_count_limit_bounds_the_logical_series() {
        // Mondays from 2024-01-01, three occurrences total: Jan 1, 8, 15.
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[1],"endType":"after","endAfterOccurrences":3}"#),
        );

        let expanded = expand_recurring_events(
            vec![event.clone()],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 12, 31, 0, 0, 0),
        );
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[0].start_date, utc(2024, 1, 1, 9, 0, 0));
        assert_eq!(expanded[1].start_date, utc(2024, 1, 8, 9, 0, 0));
        assert_eq!(expanded[2].start_date, utc(2024, 1, 15, 9, 0, 0));

        // The same series viewed months later: the three occurrences fall
        // before the search floor, consume the count, and nothing is emitted.
        let expanded = expand_recurring_events(
            vec![event],
            utc(2024, 6, 1, 0, 0, 0),
            utc(2024, 6, 30, 0, 0, 0),
        );
        assert!(expanded.is_empty());
    }

    #[test_log::test]
    fn test_non_positive_count_falls_back_to_ten() {
        for raw in [
            r#"{"daysOfWeek":[0,1,2,3,4,5,6],"endType":"after","endAfterOccurrences":0}"#,
            r#"{"daysOfWeek":[0,1,2,3,4,5,6],"endType":"after","endAfterOccurrences":-4}"#,
            r#"{"daysOfWeek":[0,1,2,3,4,5,6],"endType":"after"}"#,
        ] {
            let event = base_event(
                utc(2024, 1, 1, 9, 0, 0),
                utc(2024, 1, 1, 10, 0, 0),
                Some(raw),
            );
            let expanded = expand_recurring_events(
                vec![event],
                utc(2024, 1, 1, 0, 0, 0),
                utc(2024, 1, 31, 0, 0, 0),
            );
            assert_eq!(expanded.len(), 10, "pattern: {raw}");
        }
    }

    #[test_log::test]
    fn test_never_ending_series_is_clamped_to_one_year_past_range_end() {
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[0,1,2,3,4,5,6],"endType":"never"}"#),
        );
        let range_end = utc(2024, 1, 31, 0, 0, 0);

        let expanded = expand_recurring_events(vec![event], utc(2024, 1, 1, 0, 0, 0), range_end);

        let horizon = range_end
            .checked_add_months(Months::new(12))
            .expect("valid horizon");
        assert!(!expanded.is_empty());
        for occurrence in &expanded {
            assert!(occurrence.start_date <= horizon);
        }
    }

    #[test_log::test]
    fn test_empty_weekday_set_produces_no_occurrences() {
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[],"endType":"never"}"#),
        );

        let expanded = expand_recurring_events(
            vec![event],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        assert!(expanded.is_empty());
    }

    #[test_log::test]
    fn test_end_date_is_inclusive_end_of_day() {
        // Mondays until 2024-01-15: the Jan 15 occurrence at 09:00 is within
        // the end date's own day and must be included.
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[1],"endType":"on","endDate":"2024-01-15"}"#),
        );

        let expanded = expand_recurring_events(
            vec![event],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 3, 31, 0, 0, 0),
        );

        assert_eq!(expanded.len(), 3);
        assert_eq!(
            expanded.last().map(|o| o.start_date),
            Some(utc(2024, 1, 15, 9, 0, 0))
        );
    }

    #[test_log::test]
    fn test_unparseable_end_date_is_a_decode_failure() {
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[1],"endType":"on","endDate":"soon"}"#),
        );

        let expanded = expand_recurring_events(
            vec![event.clone()],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        assert_eq!(expanded, vec![event]);
    }

    #[test_log::test]
    fn test_no_occurrence_before_base_start() {
        // Base event starts mid-window on a Wednesday; Mondays and Wednesdays
        // earlier in the window must not appear.
        let event = base_event(
            utc(2024, 1, 10, 14, 0, 0),
            utc(2024, 1, 10, 15, 0, 0),
            Some(r#"{"daysOfWeek":[1,3],"endType":"never"}"#),
        );

        let expanded = expand_recurring_events(
            vec![event.clone()],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        assert!(!expanded.is_empty());
        for occurrence in &expanded {
            assert!(occurrence.start_date >= event.start_date);
        }
    }

    #[test_log::test]
    fn test_zero_duration_event_is_legal() {
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 9, 0, 0),
            Some(r#"{"daysOfWeek":[1],"endType":"after","endAfterOccurrences":2}"#),
        );

        let expanded = expand_recurring_events(
            vec![event],
            utc(2024, 1, 1, 0, 0, 0),
            utc(2024, 1, 31, 0, 0, 0),
        );

        assert_eq!(expanded.len(), 2);
        for occurrence in &expanded {
            assert_eq!(occurrence.start_date, occurrence.end_date);
        }
    }

    #[test_log::test]
    fn test_weekly_monday_scenario() {
        // Monday 2024-01-01 09:00-10:00, repeating every Monday forever.
        let event = base_event(
            utc(2024, 1, 1, 9, 0, 0),
            utc(2024, 1, 1, 10, 0, 0),
            Some(r#"{"daysOfWeek":[1],"endType":"never"}"#),
        );
        let range_start = utc(2024, 1, 1, 0, 0, 0);
        let range_end = utc(2024, 1, 22, 23, 59, 59);

        let expanded = expand_recurring_events(vec![event], range_start, range_end);

        let visible: Vec<&EventRecord> = expanded
            .iter()
            .filter(|o| o.start_date >= range_start && o.start_date <= range_end)
            .collect();

        assert_eq!(visible.len(), 4);
        for (occurrence, day) in visible.iter().zip([1u32, 8, 15, 22]) {
            assert_eq!(occurrence.start_date, utc(2024, 1, day, 9, 0, 0));
            assert_eq!(occurrence.end_date, utc(2024, 1, day, 10, 0, 0));
            assert!(occurrence.is_recurrence_instance);
            assert_eq!(occurrence.base_event_id.as_deref(), Some("evt-1"));
        }

        // Ids are distinct and derived from the base id plus the start instant
        let ids: std::collections::HashSet<&str> =
            visible.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert!(
            visible
                .iter()
                .all(|o| o.id.starts_with("evt-1-occurrence-2024-01-"))
        );
    }

    #[test_log::test]
    fn test_get_calendar_range_week() {
        let (start, end) = get_calendar_range(utc(2024, 6, 15, 12, 34, 56), ViewMode::Week);

        assert_eq!(start, utc(2024, 6, 1, 0, 0, 0));
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2024, 7, 13, 23, 59, 59)
                .single()
                .expect("valid timestamp")
                + TimeDelta::milliseconds(999)
        );
    }

    #[test_log::test]
    fn test_get_calendar_range_day() {
        let (start, end) = get_calendar_range(utc(2024, 6, 15, 12, 0, 0), ViewMode::Day);

        assert_eq!(start, utc(2024, 6, 8, 0, 0, 0));
        assert_eq!(end.date_naive(), utc(2024, 6, 29, 0, 0, 0).date_naive());
    }

    #[test_log::test]
    fn test_get_calendar_range_month() {
        let (start, end) = get_calendar_range(utc(2024, 6, 15, 12, 0, 0), ViewMode::Month);

        assert_eq!(start, utc(2024, 4, 15, 0, 0, 0));
        assert_eq!(end.date_naive(), utc(2024, 9, 15, 0, 0, 0).date_naive());
    }

    #[test_log::test]
    fn test_pattern_decodes_from_wire_shape() {
        let pattern: RecurrencePattern = serde_json::from_str(
            r#"{"daysOfWeek":[0,6],"endType":"on","endDate":"2024-12-31T15:00:00Z"}"#,
        )
        .expect("decodes");

        assert_eq!(pattern.days_of_week, vec![0, 6]);
        assert_eq!(pattern.end_type, EndType::On);
        assert_eq!(
            pattern.end_date,
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        assert_eq!(pattern.end_after_occurrences, None);
    }
}
