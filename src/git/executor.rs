use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{ChildStdin, Command};

/// Exit code reported when the process never ran or was killed by a signal
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// Why a process invocation did not succeed
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with code {exit_code}: {stderr}")]
    Exit {
        program: String,
        exit_code: i32,
        stderr: String,
    },
}

/// Result of running an external command
///
/// A non-zero exit is not an `Err`: callers inspect `exit_code` / `error`.
#[derive(Debug)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub error: Option<ProcessError>,
}

impl CommandResult {
    fn spawn_failure(program: &str, source: io::Error) -> Self {
        Self {
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: Vec::new(),
            stderr: Vec::new(),
            error: Some(ProcessError::Spawn {
                program: program.to_string(),
                source,
            }),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none() && self.exit_code == 0
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs external commands on behalf of the git facade
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd`, optionally feeding `stdin`
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        stdin: Option<&str>,
    ) -> CommandResult;
}

/// Spawns real processes through tokio
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    envs: Vec<(String, String)>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable for every process this runner spawns
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
        stdin: Option<&str>,
    ) -> CommandResult {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(cwd)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => return CommandResult::spawn_failure(program, source),
        };

        let input = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // stdout closed, stderr closed, process exited: all three must fire
        let (stdin_res, stdout_res, stderr_res, status) = tokio::join!(
            feed(input, stdin),
            drain(stdout),
            drain(stderr),
            child.wait()
        );

        let mut io_error = None;
        let exit_code = match status {
            Ok(status) => status.code().unwrap_or(SPAWN_FAILURE_EXIT_CODE),
            Err(e) => {
                io_error = Some(e);
                SPAWN_FAILURE_EXIT_CODE
            }
        };
        let stdout = stdout_res.unwrap_or_else(|e| {
            io_error.get_or_insert(e);
            Vec::new()
        });
        let stderr = stderr_res.unwrap_or_else(|e| {
            io_error.get_or_insert(e);
            Vec::new()
        });
        if let Err(e) = stdin_res {
            // The process may legitimately exit without reading its input
            if e.kind() != io::ErrorKind::BrokenPipe {
                io_error.get_or_insert(e);
            }
        }

        let error = match io_error {
            Some(source) => Some(ProcessError::Io {
                program: program.to_string(),
                source,
            }),
            None if exit_code != 0 => Some(ProcessError::Exit {
                program: program.to_string(),
                exit_code,
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            }),
            None => None,
        };

        CommandResult {
            exit_code,
            stdout,
            stderr,
            error,
        }
    }
}

async fn feed(pipe: Option<ChildStdin>, input: Option<&str>) -> io::Result<()> {
    if let (Some(mut pipe), Some(input)) = (pipe, input) {
        pipe.write_all(input.as_bytes()).await?;
        pipe.shutdown().await?;
    }
    Ok(())
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
