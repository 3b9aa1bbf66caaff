//! External tool invocation

use std::process::{Output, Stdio};
use thumbnailer_core::{PipelineError, PipelineResult};
use tokio::process::Command;

/// An external executable plus fixed leading arguments, e.g. `convert` or
/// `docker exec renderer convert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTool {
    pub program: String,
    pub base_args: Vec<String>,
}

impl ExternalTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Parse a whitespace-separated command line from configuration
    pub fn parse(command_line: &str) -> anyhow::Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("Tool command line is empty"))?;

        if program.contains(['\0', ';', '|', '&']) {
            return Err(anyhow::anyhow!("Invalid tool program: {}", program));
        }

        Ok(Self::new(program).with_args(parts))
    }

    /// Short name used in logs and error values
    pub fn name(&self) -> &str {
        self.program.rsplit('/').next().unwrap_or(&self.program)
    }

    /// Command with the base arguments applied. The child is killed if the handle is dropped.
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.base_args).kill_on_drop(true);
        command
    }

    /// Run to completion with captured output
    pub async fn output<I, S>(&self, args: I) -> PipelineResult<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))
    }

    pub(crate) fn spawn_error(&self, err: std::io::Error) -> PipelineError {
        PipelineError::RenderTool {
            tool: self.name().to_string(),
            exit_code: None,
            diagnostic: format!("Failed to run {}: {}", self.program, err),
        }
    }

    /// Map a finished process to its diagnostic when it did not succeed
    pub(crate) fn check(&self, output: &Output) -> PipelineResult<()> {
        if output.status.success() {
            return Ok(());
        }
        tracing::error!(
            tool = %self.name(),
            exit_code = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "External tool failed"
        );
        Err(PipelineError::render_tool(
            self.name(),
            output.status.code(),
            &output.stderr,
        ))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::ExternalTool;
    use std::path::Path;

    /// A fake tool: `sh <script>` followed by whatever arguments the caller adds.
    /// Scripts are run through `sh` so they never need the executable bit.
    pub fn script_tool(dir: &Path, name: &str, body: &str) -> ExternalTool {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        ExternalTool::new("sh").with_args([path.to_string_lossy().into_owned()])
    }

    /// Whether a process exists and is not a zombie
    #[cfg(target_os = "linux")]
    pub fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/status", pid)) {
            Ok(status) => !status.lines().any(|l| l.starts_with("State:") && l.contains('Z')),
            Err(_) => false,
        }
    }
}
