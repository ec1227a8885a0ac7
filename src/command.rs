//! # External Command Execution
//!
//! Every external process a deploy run starts (`git version`, `git clone`, the
//! dependency-install hook) goes through the [`CommandRunner`] trait. The
//! production implementation, [`ShellRunner`], hands the command string to
//! `sh -c` and enforces a wall-time ceiling: a process that outlives it is
//! killed and reported as [`Error::CommandTimeout`]. A non-zero exit is
//! reported as [`Error::CommandFailed`]; callers treat both the same way.
//!
//! Command strings are built by interpolating paths, URLs and refs, so every
//! interpolated value must go through [`shell_quote`] first.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{Error, Result};

/// Interval between `try_wait` polls while a child is running.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout with trailing whitespace and newlines removed.
    pub fn trimmed(&self) -> &str {
        self.stdout.trim_end()
    }
}

/// Trait for command execution - allows mocking in tests
pub trait CommandRunner: Send + Sync {
    /// Runs `command` through the shell, failing on non-zero exit or when it
    /// runs longer than `timeout`.
    fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput>;
}

/// The default implementation of `CommandRunner`, which runs commands with
/// `sh -c` on the local host.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        debug!("running: {}", command);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::CommandSpawn {
                command: command.to_string(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty child can't block
        // on a full pipe while we poll for its exit.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let start = Instant::now();
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if start.elapsed() >= timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::CommandTimeout {
                        command: command.to_string(),
                        timeout_secs: timeout.as_secs(),
                    });
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        if !status.success() {
            let mut output = stdout;
            output.push_str(&stderr);
            return Err(Error::CommandFailed {
                command: command.to_string(),
                code: status.code(),
                output,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_reader(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Quote `value` for safe interpolation into a POSIX shell command.
///
/// Values made only of characters the shell never interprets are returned
/// as-is so logged commands stay readable.
pub fn shell_quote(value: &str) -> String {
    let is_plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+=,".contains(c));
    if is_plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
