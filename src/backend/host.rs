//! Host backend: builds and runs code with the toolchains installed on this
//! machine, one workspace and one worker task per request.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::{ExecutionBackend, ExecutionRequest, ExecutionResult};
use crate::config::Config;
use crate::error::ExecError;
use crate::language::Language;
use crate::outcome::{self, BuildOutcome};
use crate::process::{self, ProcessSpec};
use crate::toolchain::{self, Toolchain};
use crate::workspace::Workspace;

/// Backend that spawns host compilers and interpreters directly.
#[derive(Debug, Clone)]
pub struct HostBackend {
    config: Arc<Config>,
}

impl HostBackend {
    /// Create a new host backend.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExecutionBackend for HostBackend {
    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        let id = Uuid::new_v4();
        let config = Arc::clone(&self.config);

        let worker = tokio::spawn(async move { run_pipeline(&config, id, &request).await });
        // Abandoning this future tears the worker down with it
        let _abort = AbortOnDrop(worker.abort_handle());

        let result = match worker.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(ExecError::Unknown(panic_message(&*e.into_panic()))),
            Err(e) => Err(ExecError::Unknown(e.to_string())),
        };

        match &result {
            Ok(output) => debug!(request_id = %id, bytes = output.len(), "Execution succeeded"),
            Err(
                e @ (ExecError::Io { .. } | ExecError::MissingToolchain { .. } | ExecError::Unknown(_)),
            ) => error!(request_id = %id, kind = e.kind(), error = %e, "Execution failed"),
            Err(e) => info!(request_id = %id, kind = e.kind(), "Execution failed"),
        }

        ExecutionResult::from(result)
    }
}

/// Full request lifecycle: validate, acquire workspace, build, run, release.
#[instrument(skip_all, fields(request_id = %id, language = %request.language))]
async fn run_pipeline(
    config: &Config,
    id: Uuid,
    request: &ExecutionRequest,
) -> Result<String, ExecError> {
    // Rejected before any filesystem or process work
    let language: Language = request.language.parse()?;
    let toolchain = toolchain::for_language(language, &config.toolchains);

    let workspace = Workspace::acquire(&config.temp_root, id)?;
    let result = build_and_run(config, toolchain.as_ref(), &workspace, request).await;
    workspace.release();
    result
}

async fn build_and_run(
    config: &Config,
    toolchain: &dyn Toolchain,
    workspace: &Workspace,
    request: &ExecutionRequest,
) -> Result<String, ExecError> {
    workspace.write_file(toolchain.source_file(), &request.code)?;
    let stdin = workspace.write_stdin(request.input.as_deref())?;

    let run_argv = match toolchain.build_plan(workspace) {
        Some(plan) => {
            debug!(argv = ?plan.argv, "Building");
            let compiled = process::run(ProcessSpec {
                argv: &plan.argv,
                cwd: workspace.path(),
                stdin: None,
                deadline: config.build_timeout(),
                output_limit: config.output_limit_bytes,
            })
            .await?;
            BuildOutcome::from_process(compiled, plan, toolchain.run_argv(workspace))
                .into_run_argv(config.build_timeout_seconds)?
        }
        None => toolchain.run_argv(workspace),
    };

    debug!(argv = ?run_argv, "Running");
    let ran = process::run(ProcessSpec {
        argv: &run_argv,
        cwd: workspace.path(),
        stdin: stdin.as_deref(),
        deadline: config.run_timeout(),
        output_limit: config.output_limit_bytes,
    })
    .await?;

    outcome::run_result(ran, config.run_timeout_seconds)
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}
