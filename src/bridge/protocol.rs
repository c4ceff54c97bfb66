use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{BridgeError, RemoteErrorKind};

/// Name of the only remote call the callee serves.
pub const PROCESS_GINI_FLOAT: &str = "process_gini_float";

/// First token of the line the callee prints on stdout once it is serving.
pub const READY_PREFIX: &str = "GINI_SERVER32_READY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

impl Request {
    pub fn process_gini_float(value: f32) -> Self {
        Self {
            method: PROCESS_GINI_FLOAT.to_string(),
            args: vec![Value::from(value)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Ok { result: i32 },
    Error { kind: RemoteErrorKind, message: String },
}

impl Response {
    pub fn error(kind: RemoteErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

pub fn ready_line(port: u16) -> String {
    format!("{} {}", READY_PREFIX, port)
}

pub fn parse_ready_line(line: &str) -> Option<u16> {
    let mut parts = line.split_whitespace();
    if parts.next()? != READY_PREFIX {
        return None;
    }
    parts.next()?.parse().ok()
}

/// Write one newline-terminated JSON frame.
pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> Result<(), BridgeError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut bytes = serde_json::to_vec(frame)?;
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame. `Ok(None)` means the peer closed the connection.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, BridgeError>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line.trim_end())?))
}
