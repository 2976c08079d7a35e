//! Deadline-bounded subprocess execution.
//!
//! Spawns one program from an explicit argument vector (never through a
//! shell), merges its stdout and stderr into a single bounded capture and
//! enforces a wall-clock deadline. The child leads its own process group;
//! the whole group is killed when the deadline expires, when the caller's
//! future is dropped, and as soon as the leader exits, so stray background
//! children neither outlive the phase nor hold its output open.

use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::output::{CollectedOutput, OutputCollector};

const READ_CHUNK: usize = 8 * 1024;

/// Everything needed to run one phase of a request.
#[derive(Debug, Clone, Copy)]
pub struct ProcessSpec<'a> {
    /// Program followed by its arguments.
    pub argv: &'a [String],
    /// Working directory (the request's workspace).
    pub cwd: &'a Path,
    /// File to connect to stdin; `None` connects the null device.
    pub stdin: Option<&'a Path>,
    pub deadline: Duration,
    pub output_limit: usize,
}

/// How a process ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Exited (normally or by signal) before the deadline.
    Completed {
        status: ExitStatus,
        output: CollectedOutput,
    },
    /// Killed because the deadline expired.
    TimedOut,
}

/// Run a process to completion or until its deadline.
#[instrument(skip_all, fields(program = %spec.argv.first().map_or("", String::as_str), deadline = ?spec.deadline))]
pub async fn run(spec: ProcessSpec<'_>) -> Result<ProcessOutcome, ExecError> {
    let (program, args) = spec
        .argv
        .split_first()
        .ok_or_else(|| ExecError::Unknown("empty argument vector".into()))?;

    let stdin = match spec.stdin {
        Some(path) => Stdio::from(
            std::fs::File::open(path)
                .map_err(|e| ExecError::io("failed to open stdin file", path, e))?,
        ),
        None => Stdio::null(),
    };

    let mut std_cmd = std::process::Command::new(program);
    std_cmd
        .args(args)
        .current_dir(spec.cwd)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0);

    let mut cmd = Command::from(std_cmd);
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| spawn_error(program, spec.cwd, e))?;
    let mut group = ProcessGroup::new(child.id());

    debug!(pid = ?child.id(), "Process spawned");

    // Take pipe handles out so `child` stays usable for kill-on-timeout
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| ExecError::Unknown("child stdout was not captured".into()))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExecError::Unknown("child stderr was not captured".into()))?;

    let finished = tokio::time::timeout(
        spec.deadline,
        collect_and_wait(
            &mut child,
            &mut group,
            &mut stdout,
            &mut stderr,
            spec.output_limit,
        ),
    )
    .await;

    let outcome = match finished {
        Ok(result) => {
            let (status, output) =
                result.map_err(|e| ExecError::io("failed to collect process", spec.cwd, e))?;
            debug!(
                %status,
                bytes = output.as_bytes().len(),
                truncated = output.is_truncated(),
                "Process completed"
            );
            ProcessOutcome::Completed { status, output }
        }
        Err(_) => {
            debug!("Deadline exceeded, killing process group");
            group.kill();
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to reap timed-out process");
            }
            ProcessOutcome::TimedOut
        }
    };

    Ok(outcome)
}

/// Wait for the leader while reading both streams into one bounded capture.
///
/// Chunks are appended in arrival order. Once the cap is hit the remaining
/// bytes are drained and discarded. When the leader exits its group is
/// killed at once, so background children cannot keep the pipes open; the
/// streams are then read to EOF.
async fn collect_and_wait<O, E>(
    child: &mut Child,
    group: &mut ProcessGroup,
    stdout: &mut O,
    stderr: &mut E,
    limit: usize,
) -> std::io::Result<(ExitStatus, CollectedOutput)>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut collector = OutputCollector::new(limit);
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;
    let mut status = None;

    loop {
        if let (Some(status), false, false) = (status, out_open, err_open) {
            return Ok((status, collector.finish()));
        }
        tokio::select! {
            exited = child.wait(), if status.is_none() => {
                let exited = exited?;
                debug!(%exited, "Process exited");
                group.kill();
                status = Some(exited);
            }
            n = stdout.read(&mut out_buf), if out_open => match n? {
                0 => out_open = false,
                n => collector.push(&out_buf[..n]),
            },
            n = stderr.read(&mut err_buf), if err_open => match n? {
                0 => err_open = false,
                n => collector.push(&err_buf[..n]),
            },
        }
    }
}

fn spawn_error(program: &str, cwd: &Path, e: std::io::Error) -> ExecError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ExecError::MissingToolchain {
            program: program.to_string(),
            source: e,
        }
    } else {
        ExecError::io("failed to spawn process", cwd, e)
    }
}

/// SIGKILLs a process group once, on [`ProcessGroup::kill`] or when dropped.
struct ProcessGroup(Option<Pid>);

impl ProcessGroup {
    fn new(leader: Option<u32>) -> Self {
        Self(
            leader
                .and_then(|pid| i32::try_from(pid).ok())
                .map(Pid::from_raw),
        )
    }

    /// The pgid is forgotten after the first kill; a later call must not
    /// signal a group that reused the id.
    fn kill(&mut self) {
        let Some(pgid) = self.0.take() else {
            return;
        };
        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(pgid = pgid.as_raw(), error = %e, "Failed to kill process group"),
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}
