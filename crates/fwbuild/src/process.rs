//! External command execution with streamed log capture
//!
//! This module runs build commands while capturing their combined output.
//! Each line is echoed to stderr with a label prefix as it arrives, so
//! long-running builds show live progress, and the full transcript is
//! accumulated for the caller. When a command fails, the transcript is
//! persisted to a failure report under the scratch directory.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use camino::Utf8PathBuf;
use chrono::Utc;

use crate::{Error, Result};

/// Options controlling a single program invocation
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Echo each output line to stderr as it arrives
    pub show_output: bool,
    /// If output was suppressed, dump the transcript when the command fails
    pub show_output_on_error: bool,
    /// Log the command line before spawning
    pub show_command: bool,
    /// Working directory (default: current directory)
    pub cwd: Option<Utf8PathBuf>,
    /// Full environment snapshot for the child (default: inherited)
    pub env: Option<HashMap<String, String>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            show_output: true,
            show_output_on_error: true,
            show_command: true,
            cwd: None,
            env: None,
        }
    }
}

/// Runs external programs with captured, streamed output
#[derive(Debug, Default)]
pub struct ProgramRunner {
    /// Directory for failure reports; reports are skipped when unset
    scratch_dir: Option<Utf8PathBuf>,
}

impl ProgramRunner {
    /// Create a runner that does not persist failure reports
    pub fn new() -> Self {
        Self { scratch_dir: None }
    }

    /// Create a runner that writes failure reports under `scratch_dir`
    pub fn with_scratch_dir(scratch_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            scratch_dir: Some(scratch_dir.into()),
        }
    }

    /// Run a program to completion and return the combined output transcript.
    ///
    /// stdout and stderr are drained line by line as they arrive; each line
    /// is reduced to printable ASCII and, unless suppressed, echoed to
    /// stderr as `"{label}: {line}"`. On a non-zero exit the transcript is
    /// written to `process-failure-<timestamp>` under the scratch directory
    /// (best effort) and [`Error::Process`] is returned.
    pub fn run(
        &self,
        label: &str,
        program: &str,
        args: &[&str],
        options: &RunOptions,
    ) -> Result<String> {
        let cwd = options
            .cwd
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        let command_line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        let command_debug = format!("Running ({command_line}) in ({cwd})");
        if options.show_command {
            tracing::info!("{command_debug}");
        }

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(env) = &options.env {
            command.env_clear();
            command.envs(env);
        }

        let mut child = command.spawn()?;
        let stdout = child.stdout.take().expect("Failed to capture stdout");
        let stderr = child.stderr.take().expect("Failed to capture stderr");

        // Both pipes must be drained concurrently or a chatty child can
        // deadlock on a full pipe buffer. The scoped reader cannot outlive
        // this call.
        let transcript = Mutex::new(String::new());
        std::thread::scope(|scope| {
            scope.spawn(|| drain_lines(stderr, label, options.show_output, &transcript));
            drain_lines(stdout, label, options.show_output, &transcript);
        });

        let status = child.wait()?;
        let output = transcript
            .into_inner()
            .expect("transcript lock poisoned");

        if !status.success() {
            if !options.show_output && options.show_output_on_error {
                // We were told not to show output, but the command failed,
                // so show it after all.
                eprint!("{output}");
            }
            tracing::warn!("Process failed ({status})");
            self.write_failure_report(&command_debug, &output);
            return Err(Error::process(command_line, status));
        }

        Ok(output)
    }

    /// Persist a failure report, best effort. Write failures are logged and
    /// never escalated so they cannot mask the process failure itself.
    fn write_failure_report(&self, command_debug: &str, output: &str) {
        let Some(dir) = &self.scratch_dir else {
            return;
        };
        let path = dir.join(format!("process-failure-{}", Utc::now().timestamp()));
        match std::fs::write(&path, format!("{command_debug}\n{output}")) {
            Ok(()) => tracing::info!("Wrote process failure report ({path})"),
            Err(error) => tracing::warn!("Writing process failure report failed: {error}"),
        }
    }
}

/// Read one output stream to EOF, appending each printable-filtered line to
/// the shared transcript and optionally echoing it with the label prefix.
fn drain_lines<R: Read>(stream: R, label: &str, echo: bool, transcript: &Mutex<String>) {
    let mut reader = BufReader::new(stream);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let had_newline = raw.last() == Some(&b'\n');
        let line = printable_lossy(&raw);
        {
            let mut accumulated = transcript.lock().expect("transcript lock poisoned");
            accumulated.push_str(&line);
            if had_newline {
                accumulated.push('\n');
            }
        }
        if echo {
            eprintln!("{label}: {}", line.trim_end());
        }
    }
}

/// Decode permissively: bytes outside the printable ASCII subset are dropped.
fn printable_lossy(raw: &[u8]) -> String {
    raw.iter()
        .copied()
        .filter(|byte| byte.is_ascii_graphic() || matches!(byte, b' ' | b'\t'))
        .map(char::from)
        .collect()
}
