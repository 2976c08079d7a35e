//! Execution backends and the request/response shapes they speak.
//!
//! A backend takes one [`ExecutionRequest`] and always answers with an
//! [`ExecutionResult`]; internal failures never escape as errors.

mod host;

pub use host::HostBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecError;

/// One submission: source, language name and optional stdin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Program source text.
    pub code: String,
    /// Language name (`cpp`, `python`, `javascript`).
    pub language: String,
    /// Text fed to the program's stdin.
    #[serde(default)]
    pub input: Option<String>,
}

/// The only shape callers ever see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Program output; empty on any failure.
    pub output: String,
    /// Human-readable failure description; `None` on success.
    pub error: Option<String>,
}

impl ExecutionResult {
    pub const fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn failure(error: &ExecError) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.to_string()),
        }
    }
}

impl From<Result<String, ExecError>> for ExecutionResult {
    fn from(result: Result<String, ExecError>) -> Self {
        match result {
            Ok(output) => Self::success(output),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Trait for execution backends.
///
/// Each call is independent: implementations must not share mutable state
/// between requests, and dropping the returned future must stop any work
/// the request started.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Build (if needed) and run the request's code.
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult;
}
