use std::path::PathBuf;
use thiserror::Error;

/// Why a GINI fetch failed. The `Display` text is what the front-end shows.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("non-JSON response: {hint}")]
    NonJson { hint: String },

    #[error("HTTP {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("connection error: could not reach the World Bank API")]
    Connection,

    #[error("timeout: the World Bank API took too long to answer")]
    Timeout,

    #[error("invalid JSON in API response")]
    InvalidJson,

    #[error("unexpected data shape: {0}")]
    UnexpectedShape(String),

    #[error("unknown response shape ({0} top-level elements)")]
    UnknownShape(usize),

    #[error("World Bank API error:\n{0}")]
    Api(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Map a transport failure by its flags. A connect-phase timeout counts
    /// as a connection error, not a plain timeout.
    fn from_transport(is_connect: bool, is_timeout: bool, is_decode: bool, detail: String) -> Self {
        if is_connect {
            FetchError::Connection
        } else if is_timeout {
            FetchError::Timeout
        } else if is_decode {
            FetchError::InvalidJson
        } else {
            FetchError::Request(detail)
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::from_transport(e.is_connect(), e.is_timeout(), e.is_decode(), e.to_string())
    }
}

/// Failure kinds reported by the callee inside an error frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    UnknownMethod,
    BadArguments,
    Invocation,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("could not establish the 32-bit server: {0}")]
    Launch(String),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("remote error ({kind:?}): {message}")]
    Remote {
        kind: RemoteErrorKind,
        message: String,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("bridge unavailable")]
    Unavailable,
}

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::Protocol(e.to_string())
    }
}

/// Fatal startup errors of the callee.
#[derive(Debug, Error)]
pub enum NativeError {
    #[error("native library not found: {0}")]
    LibraryNotFound(PathBuf),

    #[error("failed to load native library {path}: {source}")]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol '{symbol}' not found in native library: {source}")]
    SymbolNotFound {
        symbol: String,
        #[source]
        source: libloading::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },

    #[error("cannot locate the current executable: {0}")]
    CurrentExe(#[from] std::io::Error),
}
