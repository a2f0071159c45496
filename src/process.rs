//! # Subprocess Execution
//!
//! Package managers and build hooks are run as external processes. The build
//! core only talks to them through the [`CommandRunner`] trait, so tests can
//! substitute a scripted runner and never spawn anything.
//!
//! [`SystemRunner`] is the real implementation. It captures stdout and stderr
//! on background threads (so a chatty child cannot fill a pipe and block),
//! and honours both a per-command timeout and a shared
//! [`CancellationToken`]: either one kills the child and turns the call into
//! [`Error::Cancelled`].

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// How often a running child is polled for exit, timeout and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, OsString)>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, working_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.to_path_buf(),
            env: Vec::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// The result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait for running external commands - allows mocking in tests
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion.
    ///
    /// A non-zero exit is reported through [`CommandOutput::exit_code`], not
    /// as an error; errors are reserved for commands that could not be
    /// started or were cancelled.
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

/// A cancellation flag shared between the orchestrator and running commands
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs commands as real child processes
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    cancel: CancellationToken,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose commands are killed once `cancel` is triggered
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled {
                command: spec.to_string(),
            });
        }

        log::debug!("Running `{}` in {}", spec, spec.working_dir.display());

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::CommandSpawn {
                command: spec.to_string(),
                message: e.to_string(),
            })?;

        let stdout = child.stdout.take().map(capture);
        let stderr = child.stderr.take().map(capture);

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            let timed_out = spec.timeout.is_some_and(|t| started.elapsed() >= t);
            if timed_out || self.cancel.is_cancelled() {
                // The child may exit between try_wait and kill.
                let _ = child.kill();
                let _ = child.wait();
                if timed_out {
                    log::warn!("`{}` timed out after {:?}", spec, started.elapsed());
                }
                return Err(Error::Cancelled {
                    command: spec.to_string(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: join_capture(stdout),
            stderr: join_capture(stderr),
        })
    }
}

fn capture<R: Read + Send + 'static>(mut reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = reader.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn join_capture(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
