use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2/en/country";
pub const DEFAULT_INDICATOR: &str = "SI.POV.GINI";
pub const DEFAULT_DATE_RANGE: &str = "2011:2020";
pub const DEFAULT_PER_PAGE: u32 = 100;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_BRIDGE_STARTUP_SECS: u64 = 10;
pub const SERVER32_BIN_NAME: &str = "gini-server32";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub indicator: String,
    pub date_range: String,
    pub per_page: u32,
    pub timeout: Duration,
    /// Report unrecognised response shapes as errors instead of "no data".
    pub strict_shapes: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            indicator: DEFAULT_INDICATOR.to_string(),
            date_range: DEFAULT_DATE_RANGE.to_string(),
            per_page: DEFAULT_PER_PAGE,
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            strict_shapes: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub server_path: PathBuf,
    pub native_library: Option<PathBuf>,
    pub startup_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub bridge: BridgeConfig,
}

impl AppConfig {
    /// Build the configuration from `GINI_*` environment variables.
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = FetchConfig {
            base_url: lookup("GINI_API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            indicator: lookup("GINI_INDICATOR").unwrap_or_else(|| DEFAULT_INDICATOR.to_string()),
            date_range: lookup("GINI_DATE_RANGE").unwrap_or_else(|| DEFAULT_DATE_RANGE.to_string()),
            per_page: parse_var(&lookup, "GINI_PER_PAGE", DEFAULT_PER_PAGE)?,
            timeout: Duration::from_secs(parse_var(
                &lookup,
                "GINI_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            strict_shapes: parse_flag(&lookup, "GINI_STRICT_SHAPES")?,
        };

        let server_path = match lookup("GINI_SERVER32_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_server_path()?,
        };

        let bridge = BridgeConfig {
            server_path,
            native_library: lookup("GINI_NATIVE_LIB").map(PathBuf::from),
            startup_timeout: Duration::from_secs(parse_var(
                &lookup,
                "GINI_BRIDGE_STARTUP_SECS",
                DEFAULT_BRIDGE_STARTUP_SECS,
            )?),
        };

        Ok(Self { fetch, bridge })
    }
}

/// `gini-server32` in the same directory as the running executable.
pub fn default_server_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(PathBuf::from).unwrap_or_default();
    Ok(dir.join(format!("{}{}", SERVER32_BIN_NAME, std::env::consts::EXE_SUFFIX)))
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => Err(ConfigError::Invalid { var, value: other.to_string() }),
    }
}
