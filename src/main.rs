//! arena-exec daemon
//!
//! Serves the code execution pipeline over MCP (stdio), or runs a single
//! JSON request and prints the JSON result.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arena_exec::backend::{ExecutionBackend, ExecutionRequest, HostBackend};
use arena_exec::config::Config;
use arena_exec::mcp;

#[derive(Parser, Debug)]
#[command(name = "arena-exec")]
#[command(about = "Build and run submitted programs against host toolchains")]
struct Args {
    /// Run in stdio mode (for MCP clients)
    #[arg(long, conflicts_with = "request")]
    stdio: bool,

    /// Execute one JSON request from a file ("-" for stdin) and print the result
    #[arg(long, value_name = "PATH")]
    request: Option<PathBuf>,

    /// JSON configuration file (overrides ARENA_EXEC_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr so stdout is free for protocol output)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    info!(
        temp_root = %config.temp_root.display(),
        build_timeout = config.build_timeout_seconds,
        run_timeout = config.run_timeout_seconds,
        output_limit = config.output_limit_bytes,
        "Loaded configuration"
    );
    for program in config.toolchains.missing_programs() {
        warn!(program, "Toolchain program not found; requests needing it will fail");
    }

    let config = Arc::new(config);
    let backend = HostBackend::new(Arc::clone(&config));

    if args.stdio {
        mcp::serve_stdio(config, backend).await?;
    } else if let Some(path) = args.request {
        run_once(&backend, &path).await?;
    } else {
        anyhow::bail!("Specify either --stdio or --request <PATH>");
    }

    Ok(())
}

/// Execute a single request and print the result as JSON on stdout.
async fn run_once(backend: &HostBackend, path: &std::path::Path) -> Result<()> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?
    };

    let request: ExecutionRequest =
        serde_json::from_str(&raw).context("Failed to parse execution request")?;
    let result = backend.execute(request).await;

    println!(
        "{}",
        serde_json::to_string(&result).context("Failed to encode result")?
    );
    Ok(())
}
