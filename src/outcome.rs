//! Phase outcomes and their collapse into the pipeline result.
//!
//! A request moves through `Building` (only when the toolchain has a build
//! phase) and `Running`. Each phase ends in exactly one [`BuildOutcome`] or
//! [`RunOutcome`]; the functions here turn those into either the program's
//! output or the [`ExecError`] describing the terminal failure.

use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::error::ExecError;
use crate::process::ProcessOutcome;
use crate::toolchain::BuildPlan;

/// Result of the run phase.
pub type RunOutcome = ProcessOutcome;

/// Result of the build phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The artifact exists; `argv` runs it.
    Compiled { artifact: PathBuf, argv: Vec<String> },
    /// Compiler failed or ran out of time.
    BuildFailed { diagnostics: String, timed_out: bool },
}

impl BuildOutcome {
    /// Interpret a finished compiler process.
    pub fn from_process(outcome: ProcessOutcome, plan: BuildPlan, run_argv: Vec<String>) -> Self {
        match outcome {
            ProcessOutcome::Completed { status, .. } if status.success() => {
                if plan.artifact.is_file() {
                    Self::Compiled {
                        artifact: plan.artifact,
                        argv: run_argv,
                    }
                } else {
                    Self::BuildFailed {
                        diagnostics: format!(
                            "compiler exited successfully but produced no {}",
                            plan.artifact.display()
                        ),
                        timed_out: false,
                    }
                }
            }
            ProcessOutcome::Completed { status, output } => Self::BuildFailed {
                diagnostics: if output.is_empty() {
                    describe_exit(status)
                } else {
                    output.into_text()
                },
                timed_out: false,
            },
            ProcessOutcome::TimedOut => Self::BuildFailed {
                diagnostics: String::new(),
                timed_out: true,
            },
        }
    }

    /// The run argv on success, the terminal build error otherwise.
    pub fn into_run_argv(self, build_limit_secs: u64) -> Result<Vec<String>, ExecError> {
        match self {
            Self::Compiled { argv, .. } => Ok(argv),
            Self::BuildFailed {
                timed_out: true, ..
            } => Err(ExecError::CompileTimeout {
                limit_secs: build_limit_secs,
            }),
            Self::BuildFailed { diagnostics, .. } => Err(ExecError::CompileFailure { diagnostics }),
        }
    }
}

/// Program output on a zero exit, the terminal run error otherwise.
///
/// On a non-zero exit the merged output becomes the error text.
pub fn run_result(outcome: RunOutcome, run_limit_secs: u64) -> Result<String, ExecError> {
    match outcome {
        ProcessOutcome::Completed { status, output } if status.success() => Ok(output.into_text()),
        ProcessOutcome::Completed { status, output } => Err(ExecError::RuntimeFailure {
            message: if output.is_empty() {
                describe_exit(status)
            } else {
                output.into_text()
            },
        }),
        ProcessOutcome::TimedOut => Err(ExecError::RuntimeTimeout {
            limit_secs: run_limit_secs,
        }),
    }
}

fn describe_exit(status: ExitStatus) -> String {
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("Process exited with code {code}"),
        (None, Some(signal)) => format!("Process terminated by signal {signal}"),
        (None, None) => "Process exited abnormally".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{OutputCollector, TRUNCATION_MARKER};

    fn exited(code: i32, text: &str) -> ProcessOutcome {
        let mut collector = OutputCollector::new(64);
        collector.push(text.as_bytes());
        ProcessOutcome::Completed {
            status: ExitStatus::from_raw(code << 8),
            output: collector.finish(),
        }
    }

    fn signalled(signal: i32) -> ProcessOutcome {
        ProcessOutcome::Completed {
            status: ExitStatus::from_raw(signal),
            output: OutputCollector::new(64).finish(),
        }
    }

    fn plan(artifact: PathBuf) -> BuildPlan {
        BuildPlan {
            argv: vec!["g++".into()],
            artifact,
        }
    }

    #[test]
    fn zero_exit_yields_output() {
        assert_eq!(run_result(exited(0, "2\n"), 10).unwrap(), "2\n");
    }

    #[test]
    fn non_zero_exit_turns_output_into_error() {
        let err = run_result(exited(1, "Traceback: boom\n"), 10).unwrap_err();
        assert!(matches!(err, ExecError::RuntimeFailure { .. }));
        assert_eq!(err.to_string(), "Traceback: boom\n");
    }

    #[test]
    fn silent_failures_describe_the_exit() {
        let err = run_result(exited(7, ""), 10).unwrap_err();
        assert_eq!(err.to_string(), "Process exited with code 7");

        let err = run_result(signalled(11), 10).unwrap_err();
        assert_eq!(err.to_string(), "Process terminated by signal 11");
    }

    #[test]
    fn timeout_reports_the_limit() {
        let err = run_result(ProcessOutcome::TimedOut, 2).unwrap_err();
        assert_eq!(err.to_string(), "Execution timed out (limit: 2s)");
    }

    #[test]
    fn truncated_output_keeps_marker() {
        let mut collector = OutputCollector::new(3);
        collector.push(b"abcdef");
        let outcome = ProcessOutcome::Completed {
            status: ExitStatus::from_raw(0),
            output: collector.finish(),
        };
        assert_eq!(
            run_result(outcome, 10).unwrap(),
            format!("abc{TRUNCATION_MARKER}")
        );
    }

    #[test]
    fn successful_build_needs_an_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("main");

        let missing = BuildOutcome::from_process(exited(0, ""), plan(artifact.clone()), vec![]);
        assert!(matches!(missing, BuildOutcome::BuildFailed { timed_out: false, .. }));

        std::fs::write(&artifact, b"\x7fELF").unwrap();
        let run_argv = vec![artifact.to_string_lossy().into_owned()];
        let built =
            BuildOutcome::from_process(exited(0, ""), plan(artifact.clone()), run_argv.clone());
        assert_eq!(
            built,
            BuildOutcome::Compiled {
                artifact,
                argv: run_argv.clone()
            }
        );
        assert_eq!(built.into_run_argv(10).unwrap(), run_argv);
    }

    #[test]
    fn failed_build_carries_diagnostics() {
        let outcome = BuildOutcome::from_process(
            exited(1, "main.cpp:1:1: error: expected ';'\n"),
            plan(PathBuf::from("/nonexistent/main")),
            vec![],
        );
        let err = outcome.into_run_argv(10).unwrap_err();
        assert!(matches!(err, ExecError::CompileFailure { .. }));
        assert_eq!(
            err.to_string(),
            "Compilation failed:\nmain.cpp:1:1: error: expected ';'\n"
        );
    }

    #[test]
    fn build_timeout_is_distinct() {
        let outcome = BuildOutcome::from_process(
            ProcessOutcome::TimedOut,
            plan(PathBuf::from("/nonexistent/main")),
            vec![],
        );
        assert_eq!(
            outcome,
            BuildOutcome::BuildFailed {
                diagnostics: String::new(),
                timed_out: true
            }
        );
        let err = outcome.into_run_argv(10).unwrap_err();
        assert_eq!(err.to_string(), "Compilation timed out (limit: 10s)");
    }
}
