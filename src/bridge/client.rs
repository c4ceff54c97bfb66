use std::net::{Ipv4Addr, SocketAddr};
use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{error, info, warn};

use super::protocol::{self, read_frame, write_frame, Request, Response};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// An open connection to the callee.
pub struct Client32 {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    // Killed on drop, so the callee goes away with us.
    _child: Option<Child>,
}

impl Client32 {
    pub async fn connect(addr: SocketAddr, child: Option<Child>) -> Result<Self, BridgeError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer,
            _child: child,
        })
    }

    /// Send one named call and wait for its answer. No timeout.
    pub async fn request32(&mut self, method: &str, args: Vec<Value>) -> Result<i32, BridgeError> {
        let request = Request {
            method: method.to_string(),
            args,
        };
        write_frame(&mut self.writer, &request).await?;

        match read_frame::<_, Response>(&mut self.reader).await? {
            Some(Response::Ok { result }) => Ok(result),
            Some(Response::Error { kind, message }) => Err(BridgeError::Remote { kind, message }),
            None => Err(BridgeError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "32-bit server closed the connection",
            ))),
        }
    }

    pub async fn process_gini_float(&mut self, value: f32) -> Result<i32, BridgeError> {
        info!(value, "sending process_gini_float request");
        let request = Request::process_gini_float(value);
        self.request32(&request.method, request.args).await
    }
}

/// Establishes the callee and returns a connected client.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self) -> Result<Client32, BridgeError>;
}

/// Spawns `gini-server32` and connects to the port it announces.
pub struct ProcessLauncher {
    config: BridgeConfig,
}

impl ProcessLauncher {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self) -> Result<Client32, BridgeError> {
        let path = &self.config.server_path;
        info!(
            server = %path.display(),
            arch_bits = usize::BITS,
            "starting 32-bit server"
        );

        let mut cmd = Command::new(path);
        cmd.arg("--port").arg("0");
        if let Some(library) = &self.config.native_library {
            cmd.arg("--library").arg(library);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| BridgeError::Launch(format!("failed to spawn {}: {}", path.display(), e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::Launch("server stdout was not captured".to_string()))?;

        let port = tokio::time::timeout(self.config.startup_timeout, wait_until_ready(stdout))
            .await
            .map_err(|_| {
                BridgeError::Launch(format!(
                    "server did not become ready within {:?}",
                    self.config.startup_timeout
                ))
            })??;

        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        let client = Client32::connect(addr, Some(child))
            .await
            .map_err(|e| BridgeError::Launch(format!("failed to connect to {}: {}", addr, e)))?;
        info!(addr = %addr, "connected to 32-bit server");
        Ok(client)
    }
}

async fn wait_until_ready(stdout: ChildStdout) -> Result<u16, BridgeError> {
    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(port) = protocol::parse_ready_line(&line) {
            return Ok(port);
        }
    }
    Err(BridgeError::Launch(
        "server exited before becoming ready".to_string(),
    ))
}

/// Attaches to a callee that is already listening.
pub struct AddressLauncher {
    addr: SocketAddr,
}

impl AddressLauncher {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl Launcher for AddressLauncher {
    async fn launch(&self) -> Result<Client32, BridgeError> {
        Client32::connect(self.addr, None)
            .await
            .map_err(|e| BridgeError::Launch(format!("failed to connect to {}: {}", self.addr, e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Uninitialized,
    Starting,
    Ready,
    Failed,
}

enum BridgeState {
    Uninitialized,
    Starting,
    Ready(Client32),
    Failed(String),
}

/// Lazily started bridge handle, owned by whoever composes the application.
///
/// The callee is launched on the first call. A failed launch is terminal:
/// later calls return `None` straight away and nothing is retried.
pub struct GiniBridge<L> {
    launcher: L,
    state: BridgeState,
}

impl<L: Launcher> GiniBridge<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            state: BridgeState::Uninitialized,
        }
    }

    pub fn status(&self) -> BridgeStatus {
        match self.state {
            BridgeState::Uninitialized => BridgeStatus::Uninitialized,
            BridgeState::Starting => BridgeStatus::Starting,
            BridgeState::Ready(_) => BridgeStatus::Ready,
            BridgeState::Failed(_) => BridgeStatus::Failed,
        }
    }

    /// Why the launch failed, once it has.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            BridgeState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Process a GINI value through the native routine.
    ///
    /// Every failure (callee never started, transport error, remote error)
    /// is logged and collapses to `None`.
    pub async fn process_gini_float(&mut self, value: f32) -> Option<i32> {
        let client = match self.ensure_started().await {
            Ok(client) => client,
            Err(BridgeError::Unavailable) => {
                warn!("cannot process: the 32-bit bridge is unavailable");
                return None;
            }
            Err(e) => {
                error!(error = %e, "cannot process: failed to establish the 32-bit bridge");
                return None;
            }
        };

        match client.process_gini_float(value).await {
            Ok(result) => {
                info!(result, "result received from 32-bit server");
                Some(result)
            }
            Err(BridgeError::Remote { kind, message }) => {
                error!(?kind, message = %message, "error reported by 32-bit server");
                None
            }
            Err(e) => {
                error!(error = %e, "communication with 32-bit server failed");
                None
            }
        }
    }

    async fn ensure_started(&mut self) -> Result<&mut Client32, BridgeError> {
        if matches!(self.state, BridgeState::Uninitialized) {
            self.state = BridgeState::Starting;
            match self.launcher.launch().await {
                Ok(client) => self.state = BridgeState::Ready(client),
                Err(e) => {
                    self.state = BridgeState::Failed(e.to_string());
                    return Err(e);
                }
            }
        }

        match &mut self.state {
            BridgeState::Ready(client) => Ok(client),
            _ => Err(BridgeError::Unavailable),
        }
    }
}
