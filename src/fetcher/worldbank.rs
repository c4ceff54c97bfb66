use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{info, warn};

use super::DataSource;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::models::RawRecord;

const NO_DATA_MARKERS: [&str; 2] = ["no data available", "no matches"];
const BODY_PREVIEW_CHARS: usize = 200;

pub struct WorldBankFetcher {
    client: Client,
    config: FetchConfig,
}

impl WorldBankFetcher {
    pub fn new(config: FetchConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("GiniFetcher/0.1"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "falling back to default HTTP client");
                Client::new()
            });

        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn indicator_url(&self, country_code: &str) -> String {
        format!(
            "{}/{}/indicator/{}",
            self.config.base_url, country_code, self.config.indicator
        )
    }

    /// Classify a raw HTTP answer. Content type is checked before status,
    /// so an HTML error page is reported as non-JSON even on a 4xx.
    fn classify_response(
        country_code: &str,
        status: StatusCode,
        content_type: &str,
        body: &str,
        strict_shapes: bool,
    ) -> Result<Vec<RawRecord>, FetchError> {
        if !content_type.contains("application/json") {
            let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
            warn!(content_type, body = %preview, "World Bank API did not return JSON");
            return Err(FetchError::NonJson {
                hint: non_json_hint(country_code, content_type, body),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let json: Value = serde_json::from_str(body).map_err(|e| {
            warn!(error = %e, "failed to decode World Bank API response");
            FetchError::InvalidJson
        })?;

        Self::parse_observations(&json, strict_shapes)
    }

    /// Interpret the decoded body. The usual shape is `[pagination, [records...]]`,
    /// but the API also answers `[pagination]`, `[pagination, null]` and
    /// `[{"message": [...]}]` depending on the query.
    fn parse_observations(json: &Value, strict_shapes: bool) -> Result<Vec<RawRecord>, FetchError> {
        let items = match json.as_array() {
            Some(items) if !items.is_empty() => items,
            _ => {
                return Err(FetchError::UnexpectedShape(
                    "response is not a non-empty list".to_string(),
                ))
            }
        };

        if let Some(message) = items[0].get("message") {
            let texts = message_texts(message);
            let joined = texts.join("\n");
            let no_data = texts.iter().any(|t| {
                let lower = t.to_lowercase();
                NO_DATA_MARKERS.iter().any(|m| lower.contains(m))
            });
            if no_data {
                info!(message = %joined, "World Bank API reports no data");
                return Ok(Vec::new());
            }
            warn!(message = %joined, "World Bank API returned an error message");
            return Err(FetchError::Api(joined));
        }

        match items.len() {
            2 => match &items[1] {
                Value::Null => Ok(Vec::new()),
                Value::Array(records) => Ok(records.clone()),
                other => Err(FetchError::UnexpectedShape(format!(
                    "data element is {}, expected a list",
                    json_type_name(other)
                ))),
            },
            1 if items[0].get("total").and_then(Value::as_f64) == Some(0.0) => Ok(Vec::new()),
            n if strict_shapes => Err(FetchError::UnknownShape(n)),
            n => {
                warn!(elements = n, "unrecognised response shape, assuming no data");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl DataSource for WorldBankFetcher {
    fn name(&self) -> &str {
        "worldbank"
    }

    async fn fetch_data(&self, country_code: &str) -> Result<Vec<RawRecord>, FetchError> {
        // Example: https://api.worldbank.org/v2/en/country/ARG/indicator/SI.POV.GINI?format=json&date=2011:2020&per_page=100
        let url = self.indicator_url(country_code);
        let per_page = self.config.per_page.to_string();
        info!(url = %url, date = %self.config.date_range, "fetching GINI data");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("format", "json"),
                ("date", self.config.date_range.as_str()),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        info!(status = status.as_u16(), "World Bank API answered");
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = resp.text().await?;

        Self::classify_response(
            country_code,
            status,
            &content_type,
            &body,
            self.config.strict_shapes,
        )
    }
}

fn message_texts(message: &Value) -> Vec<String> {
    let text_of = |m: &Value| {
        m.get("value")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string()
    };
    match message {
        Value::Array(list) => list.iter().map(text_of).collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![text_of(other)],
    }
}

fn non_json_hint(country_code: &str, content_type: &str, body: &str) -> String {
    if body.contains("Invalid format") {
        "invalid format or resource not found".to_string()
    } else if body.contains("Invalid value") {
        format!("invalid country code '{}'?", country_code)
    } else {
        format!("server sent Content-Type '{}'", content_type)
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON: &str = "application/json;charset=utf-8";

    #[test]
    fn test_parse_wb_response() {
        let json_data = json!([
            { "page": 1, "pages": 1, "per_page": 100, "total": 2 },
            [
                { "indicator": { "id": "SI.POV.GINI", "value": "Gini index" }, "country": { "id": "AR", "value": "Argentina" }, "countryiso3code": "ARG", "date": "2020", "value": 42.3, "unit": "", "obs_status": "", "decimal": 1 },
                { "indicator": { "id": "SI.POV.GINI", "value": "Gini index" }, "country": { "id": "AR", "value": "Argentina" }, "countryiso3code": "ARG", "date": "2019", "value": null, "unit": "", "obs_status": "", "decimal": 1 }
            ]
        ]);

        let records = WorldBankFetcher::parse_observations(&json_data, false).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["date"], "2020");
    }

    #[test]
    fn test_null_data_is_no_data() {
        let json_data = json!([{ "page": 1, "total": 0 }, null]);
        let records = WorldBankFetcher::parse_observations(&json_data, false).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_zero_total_is_no_data() {
        let json_data = json!([{ "page": 1, "total": 0 }]);
        let records = WorldBankFetcher::parse_observations(&json_data, true).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_non_list_data_is_error() {
        let json_data = json!([{ "page": 1 }, { "oops": true }]);
        let err = WorldBankFetcher::parse_observations(&json_data, false).unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedShape(_)));
    }

    #[test]
    fn test_no_data_message_is_not_error() {
        let json_data = json!([{ "message": [{ "id": "120", "key": "Invalid value", "value": "No data available" }] }]);
        let records = WorldBankFetcher::parse_observations(&json_data, false).unwrap();
        assert!(records.is_empty());

        let json_data = json!([{ "message": [{ "value": "No matches for the query" }] }]);
        assert!(WorldBankFetcher::parse_observations(&json_data, false).unwrap().is_empty());
    }

    #[test]
    fn test_other_message_is_api_error() {
        let json_data = json!([{ "message": [
            { "id": "120", "value": "The provided parameter value is not valid" },
            { "id": "121" }
        ] }]);
        let err = WorldBankFetcher::parse_observations(&json_data, false).unwrap_err();
        match err {
            FetchError::Api(text) => {
                assert_eq!(text, "The provided parameter value is not valid\nUnknown error");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_shape_permissive_and_strict() {
        let json_data = json!([{ "page": 1 }, [], []]);
        assert!(WorldBankFetcher::parse_observations(&json_data, false).unwrap().is_empty());
        let err = WorldBankFetcher::parse_observations(&json_data, true).unwrap_err();
        assert!(matches!(err, FetchError::UnknownShape(3)));

        // A single element without total == 0 is also unrecognised
        let json_data = json!([{ "page": 1, "total": 5 }]);
        assert!(WorldBankFetcher::parse_observations(&json_data, false).unwrap().is_empty());
    }

    #[test]
    fn test_top_level_not_list_is_error() {
        for body in [json!({ "page": 1 }), json!([])] {
            let err = WorldBankFetcher::parse_observations(&body, false).unwrap_err();
            assert!(matches!(err, FetchError::UnexpectedShape(_)));
        }
    }

    #[test]
    fn test_classify_non_json_hints() {
        let err = WorldBankFetcher::classify_response(
            "XYZ",
            StatusCode::OK,
            "text/xml",
            "<wb:error><wb:message key=\"Invalid value\">x</wb:message></wb:error>",
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "non-JSON response: invalid country code 'XYZ'?");

        let err = WorldBankFetcher::classify_response(
            "ARG",
            StatusCode::BAD_REQUEST,
            "text/html",
            "Invalid format",
            false,
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::NonJson { .. }));
        assert!(err.to_string().contains("invalid format"));
    }

    #[test]
    fn test_classify_http_error_and_bad_json() {
        let err = WorldBankFetcher::classify_response(
            "ARG",
            StatusCode::SERVICE_UNAVAILABLE,
            JSON,
            "[]",
            false,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");

        let err =
            WorldBankFetcher::classify_response("ARG", StatusCode::OK, JSON, "[{", false).unwrap_err();
        assert!(matches!(err, FetchError::InvalidJson));
    }

    #[test]
    fn test_indicator_url() {
        let fetcher = WorldBankFetcher::new(FetchConfig::default());
        assert_eq!(
            fetcher.indicator_url("ARG"),
            "https://api.worldbank.org/v2/en/country/ARG/indicator/SI.POV.GINI"
        );
    }
}
