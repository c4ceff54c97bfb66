use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use super::protocol::{read_frame, write_frame, Request, Response, PROCESS_GINI_FLOAT};
use crate::error::{BridgeError, RemoteErrorKind};

/// Something that can compute the rounded GINI integer.
pub trait GiniRoutine: Send + Sync {
    fn process_gini_float(&self, value: f32) -> i32;
}

impl<F> GiniRoutine for F
where
    F: Fn(f32) -> i32 + Send + Sync,
{
    fn process_gini_float(&self, value: f32) -> i32 {
        self(value)
    }
}

/// Callee side of the bridge: serves `process_gini_float` requests.
pub struct Server32<R> {
    routine: R,
}

impl<R: GiniRoutine> Server32<R> {
    pub fn new(routine: R) -> Self {
        Self { routine }
    }

    /// Answer a single request.
    pub fn handle(&self, request: &Request) -> Response {
        if request.method != PROCESS_GINI_FLOAT {
            return Response::error(
                RemoteErrorKind::UnknownMethod,
                format!("unknown method '{}'", request.method),
            );
        }

        let value = match request.args.as_slice() {
            [arg] => match arg.as_f64() {
                Some(v) => v as f32,
                None => {
                    return Response::error(
                        RemoteErrorKind::BadArguments,
                        format!("expected a number, got {}", arg),
                    )
                }
            },
            args => {
                return Response::error(
                    RemoteErrorKind::BadArguments,
                    format!("expected 1 argument, got {}", args.len()),
                )
            }
        };

        info!(value, "received request: process_gini_float");
        if !value.is_finite() {
            return Response::error(
                RemoteErrorKind::Invocation,
                format!("cannot process non-finite value {}", value),
            );
        }

        match catch_unwind(AssertUnwindSafe(|| self.routine.process_gini_float(value))) {
            Ok(result) => {
                info!(result, "native routine returned");
                Response::Ok { result }
            }
            Err(_) => {
                error!(value, "native routine panicked");
                Response::error(RemoteErrorKind::Invocation, "native routine panicked")
            }
        }
    }

    /// Accept connections one at a time and serve each until it closes.
    pub async fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            info!(peer = %peer, "client connected");
            match self.serve_connection(stream).await {
                Ok(()) => info!(peer = %peer, "client disconnected"),
                Err(e) => warn!(peer = %peer, error = %e, "connection ended with error"),
            }
        }
    }

    pub async fn serve_connection(&self, stream: TcpStream) -> Result<(), BridgeError> {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        while let Some(request) = read_frame::<_, Request>(&mut reader).await? {
            let response = self.handle(&request);
            write_frame(&mut write_half, &response).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> Server32<fn(f32) -> i32> {
        let routine: fn(f32) -> i32 = |v| v.round_ties_even() as i32;
        Server32::new(routine)
    }

    fn request(method: &str, args: Vec<serde_json::Value>) -> Request {
        Request {
            method: method.to_string(),
            args,
        }
    }

    #[test]
    fn test_handle_process() {
        let resp = server().handle(&Request::process_gini_float(42.7));
        assert_eq!(resp, Response::Ok { result: 43 });
    }

    #[test]
    fn test_unknown_method() {
        let resp = server().handle(&request("format_disk", vec![]));
        assert!(matches!(
            resp,
            Response::Error { kind: RemoteErrorKind::UnknownMethod, .. }
        ));
    }

    #[test]
    fn test_bad_arguments() {
        for args in [vec![], vec![json!("42.7")], vec![json!(1.0), json!(2.0)]] {
            let resp = server().handle(&request(PROCESS_GINI_FLOAT, args));
            assert!(matches!(
                resp,
                Response::Error { kind: RemoteErrorKind::BadArguments, .. }
            ));
        }
    }

    #[test]
    fn test_non_finite_is_invocation_error() {
        // 1e300 overflows f32 to infinity
        let resp = server().handle(&request(PROCESS_GINI_FLOAT, vec![json!(1e300)]));
        assert!(matches!(
            resp,
            Response::Error { kind: RemoteErrorKind::Invocation, .. }
        ));
    }

    #[test]
    fn test_panicking_routine_is_invocation_error() {
        let server = Server32::new(|_: f32| -> i32 { panic!("boom") });
        let resp = server.handle(&Request::process_gini_float(1.0));
        assert_eq!(
            resp,
            Response::error(RemoteErrorKind::Invocation, "native routine panicked")
        );
    }
}
