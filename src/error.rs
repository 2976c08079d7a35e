//! Failure taxonomy for the execution pipeline.
//!
//! Every variant renders (via `Display`) to the human-readable string that
//! ends up in the `error` field of an [`ExecutionResult`](crate::backend::ExecutionResult).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a request did not produce a successful run.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The requested language is not one of the supported toolchains.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The compiler exited non-zero.
    #[error("Compilation failed:\n{diagnostics}")]
    CompileFailure { diagnostics: String },

    /// The compiler did not finish within the build deadline.
    #[error("Compilation timed out (limit: {limit_secs}s)")]
    CompileTimeout { limit_secs: u64 },

    /// The program exited non-zero (or was killed by a signal).
    ///
    /// `message` is the merged stdout/stderr, or a synthesized exit
    /// description when the program printed nothing.
    #[error("{message}")]
    RuntimeFailure { message: String },

    /// The program did not finish within the run deadline.
    #[error("Execution timed out (limit: {limit_secs}s)")]
    RuntimeTimeout { limit_secs: u64 },

    /// A required host binary could not be found or started.
    #[error("Toolchain not available: {program} ({source})")]
    MissingToolchain {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Workspace creation, population or process plumbing failed.
    #[error("I/O failure: {context} ({}): {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Anything else, including a panicked worker.
    #[error("Unexpected failure: {0}")]
    Unknown(String),
}

impl ExecError {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    /// Short, stable label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedLanguage(_) => "unsupported_language",
            Self::CompileFailure { .. } => "compile_failure",
            Self::CompileTimeout { .. } => "compile_timeout",
            Self::RuntimeFailure { .. } => "runtime_failure",
            Self::RuntimeTimeout { .. } => "runtime_timeout",
            Self::MissingToolchain { .. } => "missing_toolchain",
            Self::Io { .. } => "io_failure",
            Self::Unknown(_) => "unknown_failure",
        }
    }
}
