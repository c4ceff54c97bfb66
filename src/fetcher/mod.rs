use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::RawRecord;

pub mod worldbank;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;
    /// `Ok(vec![])` means the query was valid but there is no data.
    async fn fetch_data(&self, country_code: &str) -> Result<Vec<RawRecord>, FetchError>;
}

/// Trim and upper-case a user-entered ISO-3 code. `None` unless it is exactly
/// three ASCII letters.
pub fn normalize_country_code(input: &str) -> Option<String> {
    let code = input.trim().to_ascii_uppercase();
    (code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())).then_some(code)
}
