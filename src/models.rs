use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One element of the World Bank `data` array, kept as raw JSON.
///
/// The API is loose about types (`value` arrives as a number or a string,
/// sometimes `null`) and entries are not guaranteed to be objects, so
/// records are validated field by field when they are consumed.
pub type RawRecord = Value;

/// Fallback used when a record carries no `country.value`.
pub const UNKNOWN_COUNTRY: &str = "N/A";

/// The most recent record with a usable GINI value.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SelectedRecord {
    /// `date` exactly as the API sent it.
    pub date: String,
    pub year: i32,
    pub value: f64,
    /// Derived from `country.value`, for display only.
    pub country_name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum HistoryValue {
    Parsed(f64),
    /// Present but not numeric; shown as-is.
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub date: String,
    pub value: HistoryValue,
}

/// Read `value` as a finite number. Accepts JSON numbers and numeric strings.
pub fn record_value(record: &Value) -> Option<f64> {
    let parsed = match record.get("value")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Read `date` as an integer year. Accepts `"2018"` and `2018`.
pub fn record_year(record: &Value) -> Option<i32> {
    match record.get("date")? {
        Value::String(s) => s.trim().parse::<i32>().ok(),
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        _ => None,
    }
}

/// `date` rendered as text, if present and non-empty.
pub fn record_date_text(record: &Value) -> Option<String> {
    match record.get("date")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `value` rendered as text, if present and not null.
pub fn record_value_text(record: &Value) -> Option<String> {
    match record.get("value")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub fn country_name(record: &Value) -> String {
    record
        .get("country")
        .and_then(|c| c.get("value"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_COUNTRY)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_number_and_string() {
        assert_eq!(record_value(&json!({ "value": 40.1 })), Some(40.1));
        assert_eq!(record_value(&json!({ "value": " 38.2 " })), Some(38.2));
        assert_eq!(record_value(&json!({ "value": null })), None);
        assert_eq!(record_value(&json!({ "value": "n/a" })), None);
        assert_eq!(record_value(&json!({ "value": "NaN" })), None);
        assert_eq!(record_value(&json!({ "value": "inf" })), None);
        assert_eq!(record_value(&json!({})), None);
    }

    #[test]
    fn test_year_parsing() {
        assert_eq!(record_year(&json!({ "date": "2018" })), Some(2018));
        assert_eq!(record_year(&json!({ "date": 2019 })), Some(2019));
        assert_eq!(record_year(&json!({ "date": "2018Q1" })), None);
        assert_eq!(record_year(&json!({ "date": "" })), None);
    }

    #[test]
    fn test_country_name_fallback() {
        let rec = json!({ "country": { "id": "AR", "value": "Argentina" } });
        assert_eq!(country_name(&rec), "Argentina");
        assert_eq!(country_name(&json!({ "date": "2018" })), UNKNOWN_COUNTRY);
    }

    #[test]
    fn test_history_value_serializes_tagged() {
        let entry = HistoryEntry {
            date: "2015".into(),
            value: HistoryValue::Parsed(40.1),
        };
        let s = serde_json::to_string(&entry).unwrap();
        assert_eq!(s, r#"{"date":"2015","value":{"kind":"parsed","value":40.1}}"#);
    }
}
