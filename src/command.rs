//! External command execution seam
//!
//! The changesets CLI is driven as a child process; everything that shells
//! out goes through the [CommandRunner] trait so tests can substitute a mock,
//! mirroring the trait/mock split of the git layer.

use crate::error::{AutopilotError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

pub trait CommandRunner: Send + Sync {
    /// Run a command to completion and return its captured stdout. A nonzero
    /// exit status is an error carrying the command line and stderr.
    fn run(&self, program: &str, args: &[&str], envs: &[(String, String)]) -> Result<String>;
}

/// Runs commands as child processes in a fixed working directory.
pub struct ProcessRunner {
    cwd: PathBuf,
}

impl ProcessRunner {
    pub fn new(cwd: &Path) -> Self {
        ProcessRunner {
            cwd: cwd.to_path_buf(),
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[&str], envs: &[(String, String)]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .envs(envs.iter().map(|(k, v)| (k.clone(), v.clone())))
            .output()
            .map_err(|e| {
                AutopilotError::command(format!("cannot start {} {}: {}", program, args.join(" "), e))
            })?;

        if !output.status.success() {
            return Err(AutopilotError::command(format!(
                "{} {} exited with {}: {}",
                program,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

enum MockResponse {
    Stdout(String),
    Failure(String),
}

/// Scripted runner for tests: responses are matched by command-line prefix,
/// every call is recorded.
pub struct MockRunner {
    responses: Mutex<Vec<(String, MockResponse)>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        MockRunner {
            responses: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Return `stdout` for any command line starting with `prefix`
    pub fn respond(self, prefix: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((prefix.into(), MockResponse::Stdout(stdout.into())));
        self
    }

    /// Fail any command line starting with `prefix`
    pub fn fail(self, prefix: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push((prefix.into(), MockResponse::Failure(message.into())));
        self
    }

    /// Command lines seen so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, program: &str, args: &[&str], _envs: &[(String, String)]) -> Result<String> {
        let line = if args.is_empty() {
            program.to_string()
        } else {
            format!("{} {}", program, args.join(" "))
        };
        self.calls.lock().unwrap().push(line.clone());

        let responses = self.responses.lock().unwrap();
        for (prefix, response) in responses.iter() {
            if line.starts_with(prefix.as_str()) {
                return match response {
                    MockResponse::Stdout(out) => Ok(out.clone()),
                    MockResponse::Failure(msg) => Err(AutopilotError::command(msg.clone())),
                };
            }
        }
        Ok(String::new())
    }
}
