use tracing::debug;

use crate::models::{
    country_name, record_date_text, record_value, record_value_text, record_year, HistoryEntry,
    HistoryValue, RawRecord, SelectedRecord,
};

/// Years at or below this never qualify.
const NO_YEAR: i32 = -1;

/// Find the record with the latest year whose value parses as a finite number.
///
/// Records are scanned in input order. Malformed entries (non-objects,
/// missing/null `value`, missing or empty `date`, unparseable fields) are
/// skipped without aborting the scan, as are negative years. On equal years
/// the first record wins.
pub fn select_latest(records: &[RawRecord]) -> Option<SelectedRecord> {
    let mut best: Option<SelectedRecord> = None;

    for record in records {
        if !record.is_object() {
            continue;
        }
        let Some(date) = record_date_text(record) else {
            continue;
        };
        let (Some(value), Some(year)) = (record_value(record), record_year(record)) else {
            debug!(date = %date, "skipping record with unparseable value or date");
            continue;
        };

        if year > best.as_ref().map_or(NO_YEAR, |b| b.year) {
            best = Some(SelectedRecord {
                date,
                year,
                value,
                country_name: country_name(record),
            });
        }
    }

    best
}

/// Records with a non-null value and a non-empty date, sorted by date text.
pub fn build_history(records: &[RawRecord]) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = records
        .iter()
        .filter(|r| r.is_object())
        .filter_map(|r| {
            let date = record_date_text(r)?;
            let raw = record_value_text(r)?;
            let value = match record_value(r) {
                Some(v) => HistoryValue::Parsed(v),
                None => HistoryValue::Invalid(raw),
            };
            Some(HistoryEntry { date, value })
        })
        .collect();

    // Stable, so equal dates keep their input order
    entries.sort_by(|a, b| a.date.cmp(&b.date));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selects_latest_valid_year() {
        let records = vec![
            json!({ "date": "2015", "value": "40.1" }),
            json!({ "date": "2018", "value": "38.2" }),
            json!({ "date": "2017", "value": null }),
        ];
        let best = select_latest(&records).unwrap();
        assert_eq!(best.year, 2018);
        assert_eq!(best.date, "2018");
        assert_eq!(best.value, 38.2);
    }

    #[test]
    fn test_skips_unparseable_without_aborting() {
        let records = vec![
            json!({ "date": "abc", "value": "1" }),
            json!({ "date": "2012", "value": "33.0" }),
        ];
        let best = select_latest(&records).unwrap();
        assert_eq!(best.year, 2012);
        assert_eq!(best.value, 33.0);
    }

    #[test]
    fn test_empty_input_is_absent() {
        assert!(select_latest(&[]).is_none());
    }

    #[test]
    fn test_nothing_qualifies() {
        let records = vec![
            json!("not a record"),
            json!(null),
            json!({ "date": "", "value": "12.0" }),
            json!({ "date": "2016", "value": "x" }),
            json!({ "date": "2019" }),
        ];
        assert!(select_latest(&records).is_none());
    }

    #[test]
    fn test_negative_years_never_qualify() {
        let records = vec![
            json!({ "date": "-5", "value": "30.0" }),
            json!({ "date": "-1", "value": "31.0" }),
        ];
        assert!(select_latest(&records).is_none());

        let records = vec![
            json!({ "date": "-3", "value": "30.0" }),
            json!({ "date": "0", "value": "31.0" }),
        ];
        assert_eq!(select_latest(&records).unwrap().year, 0);
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let records = vec![
            json!({ "date": "2016", "value": 41.0, "country": { "value": "First" } }),
            json!({ "date": "2016", "value": 42.0, "country": { "value": "Second" } }),
        ];
        let best = select_latest(&records).unwrap();
        assert_eq!(best.value, 41.0);
        assert_eq!(best.country_name, "First");
    }

    #[test]
    fn test_attaches_country_name() {
        let records = vec![
            json!({ "date": "2014", "value": 41.7, "country": { "id": "AR", "value": "Argentina" } }),
            json!({ "date": "2013", "value": 41.0 }),
        ];
        let best = select_latest(&records).unwrap();
        assert_eq!(best.country_name, "Argentina");

        let records = vec![json!({ "date": "2013", "value": 41.0 })];
        assert_eq!(select_latest(&records).unwrap().country_name, "N/A");
    }

    #[test]
    fn test_history_sorted_and_marks_invalid() {
        let records = vec![
            json!({ "date": "2018", "value": 38.2 }),
            json!({ "date": "2015", "value": "40.1" }),
            json!({ "date": "2017", "value": null }),
            json!({ "date": "2016", "value": "pending" }),
            json!({ "value": 10.0 }),
            json!(42),
        ];
        let history = build_history(&records);
        let dates: Vec<&str> = history.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2015", "2016", "2018"]);
        assert_eq!(history[0].value, HistoryValue::Parsed(40.1));
        assert_eq!(history[1].value, HistoryValue::Invalid("pending".into()));
        assert_eq!(history[2].value, HistoryValue::Parsed(38.2));
    }
}
