// Local-day membership and day grouping

use crate::record::TaskRecord;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

/// Heading for one day group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayLabel {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl DayLabel {
    /// Label for `day` as seen from the local date `today`
    pub fn for_day(day: NaiveDate, today: NaiveDate) -> Self {
        if day == today {
            DayLabel::Today
        } else if today.pred_opt() == Some(day) {
            DayLabel::Yesterday
        } else {
            DayLabel::Date(day)
        }
    }
}

impl std::fmt::Display for DayLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayLabel::Today => write!(f, "Today"),
            DayLabel::Yesterday => write!(f, "Yesterday"),
            DayLabel::Date(day) => write!(f, "{}", day.format("%A, %B %-d, %Y")),
        }
    }
}

/// Records sharing one local calendar day, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub label: DayLabel,
    pub tasks: Vec<TaskRecord>,
}

impl DayGroup {
    /// Ids of every record in the group, for `TaskStore::delete_group`
    pub fn ids(&self) -> HashSet<Uuid> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    /// Most recent timestamp in the group
    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.tasks.iter().map(|t| t.timestamp).max()
    }
}

/// Parse `today`, `yesterday` or `YYYY-MM-DD` relative to `today`
pub fn parse_day(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    match input.trim().to_ascii_lowercase().as_str() {
        "today" => Some(today),
        "yesterday" => today.pred_opt(),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d").ok(),
    }
}

/// Local calendar date of `ts` in the time zone of `now`
pub fn local_day<Tz: TimeZone>(ts: &DateTime<Utc>, now: &DateTime<Tz>) -> NaiveDate {
    ts.with_timezone(&now.timezone()).date_naive()
}

/// True iff `ts` lies in [start of `now`'s local day, start of the next local day)
pub fn is_same_local_day<Tz: TimeZone>(ts: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    local_day(ts, now) == now.date_naive()
}

/// Records on `now`'s local day, preserving input order
pub fn filter_today<'a, Tz: TimeZone>(
    records: impl IntoIterator<Item = &'a TaskRecord>,
    now: &DateTime<Tz>,
) -> Vec<TaskRecord> {
    records
        .into_iter()
        .filter(|r| is_same_local_day(&r.timestamp, now))
        .cloned()
        .collect()
}

/// Partition records by local calendar day.
///
/// Within a group records are sorted newest-first by timestamp. Groups are
/// ordered by their most recent timestamp, descending.
pub fn group_by_day<'a, Tz: TimeZone>(
    records: impl IntoIterator<Item = &'a TaskRecord>,
    now: &DateTime<Tz>,
) -> Vec<DayGroup> {
    let today = now.date_naive();

    let mut by_day: BTreeMap<NaiveDate, Vec<TaskRecord>> = BTreeMap::new();
    for record in records {
        by_day
            .entry(local_day(&record.timestamp, now))
            .or_default()
            .push(record.clone());
    }

    let mut groups: Vec<DayGroup> = by_day
        .into_iter()
        .map(|(day, mut tasks)| {
            tasks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            DayGroup {
                day,
                label: DayLabel::for_day(day, today),
                tasks,
            }
        })
        .collect();

    groups.sort_by(|a, b| b.latest().cmp(&a.latest()));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        tz().with_ymd_and_hms(y, m, d, h, min, 0).unwrap().with_timezone(&Utc)
    }

    fn now() -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2026, 10, 16, 16, 0, 0).unwrap()
    }

    #[test]
    fn test_day_label_display() {
        assert_eq!(DayLabel::Today.to_string(), "Today");
        assert_eq!(DayLabel::Yesterday.to_string(), "Yesterday");
        let day = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        assert_eq!(DayLabel::Date(day).to_string(), "Wednesday, October 14, 2026");
    }

    #[test]
    fn test_parse_day() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        assert_eq!(parse_day("today", today), Some(today));
        assert_eq!(parse_day("Yesterday", today), NaiveDate::from_ymd_opt(2026, 10, 15));
        assert_eq!(parse_day("2026-10-14", today), NaiveDate::from_ymd_opt(2026, 10, 14));

        // Yesterday crosses month and year boundaries
        let new_year = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(parse_day("yesterday", new_year), NaiveDate::from_ymd_opt(2026, 12, 31));

        assert_eq!(parse_day("tomorrow", today), None);
        assert_eq!(parse_day("2026-13-01", today), None);
        assert_eq!(parse_day("16.10.2026", today), None);
        assert_eq!(parse_day("", today), None);
    }

    #[test]
    fn test_same_local_day_boundaries() {
        let now = now();
        assert!(is_same_local_day(&at(2026, 10, 16, 0, 0), &now));
        assert!(is_same_local_day(&at(2026, 10, 16, 23, 59), &now));
        assert!(!is_same_local_day(&at(2026, 10, 15, 23, 59), &now));
        assert!(!is_same_local_day(&at(2026, 10, 17, 0, 0), &now));
    }

    #[test]
    fn test_local_day_uses_offset_not_utc() {
        // 01:00 local on the 16th is still the 15th in UTC
        let ts = at(2026, 10, 16, 1, 0);
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 15).unwrap());
        assert!(is_same_local_day(&ts, &now()));
    }

    #[test]
    fn test_filter_today_keeps_order() {
        let records = vec![
            TaskRecord::new("late", at(2026, 10, 16, 14, 0)),
            TaskRecord::new("old", at(2026, 10, 15, 9, 0)),
            TaskRecord::new("early", at(2026, 10, 16, 10, 0)),
        ];

        let today = filter_today(&records, &now());
        let texts: Vec<&str> = today.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["late", "early"]);
    }

    #[test]
    fn test_group_by_day() {
        // Deliberately out of order
        let records = vec![
            TaskRecord::new("today 10", at(2026, 10, 16, 10, 0)),
            TaskRecord::new("two days ago", at(2026, 10, 14, 9, 0)),
            TaskRecord::new("today 14", at(2026, 10, 16, 14, 0)),
            TaskRecord::new("yesterday", at(2026, 10, 15, 9, 0)),
        ];

        let groups = group_by_day(&records, &now());
        assert_eq!(groups.len(), 3);

        assert_eq!(groups[0].label, DayLabel::Today);
        let texts: Vec<&str> = groups[0].tasks.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["today 14", "today 10"]);

        assert_eq!(groups[1].label, DayLabel::Yesterday);
        assert_eq!(groups[1].tasks.len(), 1);
        assert_eq!(groups[1].tasks[0].text, "yesterday");

        assert_eq!(groups[2].label.to_string(), "Wednesday, October 14, 2026");
        assert_eq!(groups[2].tasks[0].text, "two days ago");
    }

    #[test]
    fn test_group_ids_and_latest() {
        let records = vec![
            TaskRecord::new("a", at(2026, 10, 16, 10, 0)),
            TaskRecord::new("b", at(2026, 10, 16, 11, 0)),
        ];

        let groups = group_by_day(&records, &now());
        assert_eq!(groups.len(), 1);
        let expected: HashSet<Uuid> = records.iter().map(|r| r.id).collect();
        assert_eq!(groups[0].ids(), expected);
        assert_eq!(groups[0].latest(), Some(at(2026, 10, 16, 11, 0)));
    }

    #[test]
    fn test_group_by_day_empty() {
        let records: Vec<TaskRecord> = Vec::new();
        assert!(group_by_day(&records, &now()).is_empty());
    }
}
