use std::fmt::{self, Write};

use crate::core::orchestrator::{LookupReport, Processing};
use crate::models::HistoryValue;

/// Human-readable rendering of a lookup, as the console front-end prints it.
pub fn render_text(report: &LookupReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &LookupReport) -> fmt::Result {
    let code = &report.country_code;

    if let Some(error) = &report.error {
        writeln!(out, "Failed to fetch data for {}: {}", code, error)?;
        writeln!(out)?;
        return writeln!(out, "(could not load the data history)");
    }

    if report.is_empty() {
        return writeln!(
            out,
            "No GINI data available for {} in {}.",
            code, report.date_range
        );
    }

    match &report.latest {
        Some(latest) => {
            writeln!(out, "Country:     {}", latest.country_name)?;
            writeln!(out, "Latest year: {}", latest.date)?;
            writeln!(out, "Latest GINI: {:.2}", latest.value)?;
        }
        None => writeln!(out, "No valid GINI data point found for {}.", code)?,
    }

    writeln!(out)?;
    writeln!(out, "History (valid, by year)")?;
    if report.history.is_empty() {
        writeln!(out, "  (no valid historical data points found)")?;
    }
    for entry in &report.history {
        match &entry.value {
            HistoryValue::Parsed(v) => writeln!(out, "  Year: {}, GINI: {:>6.2}", entry.date, v)?,
            HistoryValue::Invalid(raw) => {
                writeln!(out, "  Year: {}, GINI: {} (invalid?)", entry.date, raw)?
            }
        }
    }

    if let Some(processing) = &report.processing {
        writeln!(out)?;
        match processing {
            Processing::Done { result } => writeln!(out, "Processed GINI (native): {}", result)?,
            Processing::Unavailable => writeln!(out, "Processed GINI (native): unavailable")?,
        }
    }

    Ok(())
}

pub fn render_json(report: &LookupReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}
