use std::io::Write;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gini_fetcher_lib::bridge::native::{default_library_path, NativeGiniLibrary};
use gini_fetcher_lib::bridge::protocol::ready_line;
use gini_fetcher_lib::bridge::Server32;
use gini_fetcher_lib::logging;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Callee process of the GINI bridge. Build it for a 32-bit target so it can
/// load the 32-bit native library.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Loopback port to listen on; 0 picks a free one
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Path to the native library (defaults to the one next to this executable)
    #[arg(long)]
    library: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init("info");
    let args = Args::parse();
    info!(arch_bits = usize::BITS, "starting GINI server");

    let path = match args.library {
        Some(path) => path,
        None => default_library_path().context("cannot locate the native library")?,
    };

    let library = NativeGiniLibrary::load(&path).map_err(|e| {
        error!(error = %e, "fatal: native routine unavailable");
        e
    })?;

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, args.port))
        .await
        .with_context(|| format!("cannot listen on 127.0.0.1:{}", args.port))?;
    let port = listener.local_addr()?.port();
    info!(port, library = %library.path().display(), "serving process_gini_float");

    // stdout carries only this line; the caller waits for it
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", ready_line(port))?;
    stdout.flush()?;

    Server32::new(library).serve(listener).await?;
    Ok(())
}
