//! Cross-architecture bridge to the native GINI routine.
//!
//! The native library is built for a 32-bit target, so it cannot be loaded
//! into the (64-bit) application. A small callee process (`gini-server32`)
//! loads it instead and serves `process_gini_float` over a loopback TCP
//! connection. The caller owns that process and talks to it through
//! [`client::GiniBridge`].

pub mod client;
pub mod native;
pub mod protocol;
pub mod server;

pub use client::{BridgeStatus, Client32, GiniBridge, Launcher, ProcessLauncher};
pub use server::{GiniRoutine, Server32};
