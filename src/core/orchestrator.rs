use serde::Serialize;
use tracing::{info, warn};

use crate::bridge::{GiniBridge, Launcher};
use crate::fetcher::DataSource;
use crate::models::{HistoryEntry, SelectedRecord};
use crate::selector::{build_history, select_latest};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Processing {
    Done { result: i32 },
    Unavailable,
}

/// Everything the front-end shows for one country lookup.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    pub country_code: String,
    pub date_range: String,
    /// Set when the fetch failed; the rest is then empty.
    pub error: Option<String>,
    pub record_count: usize,
    pub latest: Option<SelectedRecord>,
    pub history: Vec<HistoryEntry>,
    pub processing: Option<Processing>,
}

impl LookupReport {
    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.record_count == 0
    }
}

/// Fetch, select the latest valid record and build the history.
pub async fn lookup<D>(source: &D, country_code: &str, date_range: &str) -> LookupReport
where
    D: DataSource + ?Sized,
{
    let mut report = LookupReport {
        country_code: country_code.to_string(),
        date_range: date_range.to_string(),
        error: None,
        record_count: 0,
        latest: None,
        history: Vec::new(),
        processing: None,
    };

    match source.fetch_data(country_code).await {
        Ok(records) => {
            report.record_count = records.len();
            report.latest = select_latest(&records);
            report.history = build_history(&records);
            match &report.latest {
                Some(latest) => info!(
                    source = source.name(),
                    country = %latest.country_name,
                    year = latest.year,
                    value = latest.value,
                    "latest valid GINI found"
                ),
                None => info!(source = source.name(), records = records.len(), "no valid GINI record"),
            }
        }
        Err(e) => {
            warn!(source = source.name(), country_code, error = %e, "fetch failed");
            report.error = Some(e.to_string());
        }
    }

    report
}

/// Forward the selected value to the native routine.
pub async fn process_latest<L: Launcher>(
    bridge: &mut GiniBridge<L>,
    latest: &SelectedRecord,
) -> Processing {
    match bridge.process_gini_float(latest.value as f32).await {
        Some(result) => Processing::Done { result },
        None => Processing::Unavailable,
    }
}
