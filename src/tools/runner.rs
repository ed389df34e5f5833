use crate::foundation::error::RibResult;
use anyhow::Context as _;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of one external tool invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// Return `true` when the tool exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Seam for running external tools (texture optimizer, shader compiler).
///
/// Calls block until the child exits.
pub trait ToolRunner {
    /// Run `program` with `args` and capture its output.
    ///
    /// Failing to launch the program is an error; a non-zero exit is reported through
    /// [`ToolOutput::exit_code`].
    fn run(&self, program: &Path, args: &[OsString]) -> RibResult<ToolOutput>;
}

/// [`ToolRunner`] that spawns real processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> RibResult<ToolOutput> {
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run '{}'", program.display()))?;
        Ok(ToolOutput {
            exit_code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        })
    }
}

impl<R: ToolRunner + ?Sized> ToolRunner for &R {
    fn run(&self, program: &Path, args: &[OsString]) -> RibResult<ToolOutput> {
        (**self).run(program, args)
    }
}

/// Log captured tool output at debug level.
pub(crate) fn log_tool_output(program: &Path, out: &ToolOutput) {
    let stdout = out.stdout.trim();
    let stderr = out.stderr.trim();
    if !stdout.is_empty() {
        tracing::debug!(program = %program.display(), "{stdout}");
    }
    if !stderr.is_empty() {
        tracing::debug!(program = %program.display(), stderr = true, "{stderr}");
    }
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> RibResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Args helper: build an owned argument list from mixed strings and paths.
pub(crate) fn os_args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

/// Return the parent directory of `path`, or `.` for bare file names.
pub(crate) fn parent_or_cwd(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
