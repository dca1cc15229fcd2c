//! Read-only queries against the container and microVM runtimes.
//!
//! This is a pure I/O boundary: every call runs one external process to
//! completion and hands back its output or exit code unchanged. Nothing here
//! caches or retries.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use thiserror::Error;

/// Failure of a single runtime query.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The process could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully
    #[error("{program} exited with {}: {output:?}", exit_label(.code))]
    Exit {
        program: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured stdout and stderr lines
        output: Vec<String>,
    },
}

/// Queries a [`Machine`](crate::Machine) needs from its runtimes.
pub trait Inspector {
    /// Run `inspect -f '<format>' <target>` against the container runtime.
    ///
    /// The format is wrapped in single quotes, so each returned line carries
    /// them as well.
    fn inspect(&self, target: &str, format: &str) -> Result<Vec<String>, InspectError>;

    /// List container ids matching a `ps` filter such as `label=k=v`.
    fn list_ids(&self, filter: &str) -> Result<Vec<String>, InspectError>;

    /// Fetch the logs of a microVM, returning the exit code of the runtime.
    fn vm_logs(&self, name: &str) -> Result<i32, InspectError>;
}

/// Runtime binaries used by [`CliInspector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorConfig {
    /// Container runtime CLI
    pub container_bin: PathBuf,
    /// microVM runtime CLI
    pub microvm_bin: PathBuf,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            container_bin: PathBuf::from("docker"),
            microvm_bin: PathBuf::from("ignite"),
        }
    }
}

impl InspectorConfig {
    /// Load binaries from the environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `LOOSEBOX_DOCKER` | `docker` |
    /// | `LOOSEBOX_IGNITE` | `ignite` |
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            container_bin: std::env::var("LOOSEBOX_DOCKER")
                .map(PathBuf::from)
                .unwrap_or(default.container_bin),
            microvm_bin: std::env::var("LOOSEBOX_IGNITE")
                .map(PathBuf::from)
                .unwrap_or(default.microvm_bin),
        }
    }
}

/// [`Inspector`] that shells out to the runtime CLIs.
#[derive(Debug, Clone, Default)]
pub struct CliInspector {
    config: InspectorConfig,
}

impl CliInspector {
    pub fn new(config: InspectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    fn output<I, S>(&self, program: &Path, args: I) -> Result<Vec<String>, InspectError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(program);
        cmd.args(args);
        tracing::debug!(command = ?cmd, "Running runtime query");

        let out: Output = cmd.output().map_err(|e| InspectError::Spawn {
            program: program.display().to_string(),
            source: e,
        })?;

        if !out.status.success() {
            let mut output = lines(&out.stdout);
            output.extend(lines(&out.stderr));
            tracing::debug!(
                program = %program.display(),
                code = ?out.status.code(),
                "Runtime query failed"
            );
            return Err(InspectError::Exit {
                program: program.display().to_string(),
                code: out.status.code(),
                output,
            });
        }

        Ok(lines(&out.stdout))
    }
}

impl Inspector for CliInspector {
    fn inspect(&self, target: &str, format: &str) -> Result<Vec<String>, InspectError> {
        let format = format!("'{format}'");
        self.output(
            &self.config.container_bin,
            ["inspect", "-f", format.as_str(), target],
        )
    }

    fn list_ids(&self, filter: &str) -> Result<Vec<String>, InspectError> {
        self.output(&self.config.container_bin, ["ps", "-q", "-f", filter])
    }

    fn vm_logs(&self, name: &str) -> Result<i32, InspectError> {
        let program = &self.config.microvm_bin;
        tracing::debug!(program = %program.display(), name, "Fetching microVM logs");

        let status = Command::new(program)
            .args(["logs", name])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| InspectError::Spawn {
                program: program.display().to_string(),
                source: e,
            })?;

        status.code().ok_or_else(|| InspectError::Exit {
            program: program.display().to_string(),
            code: None,
            output: Vec::new(),
        })
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "signal".to_string(),
    }
}

fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}
