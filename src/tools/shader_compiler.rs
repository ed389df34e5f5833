use crate::{
    foundation::error::{RibError, RibResult},
    tools::runner::{ToolRunner, log_tool_output, os_args, parent_or_cwd},
};
use std::path::{Path, PathBuf};

/// Compile a shader source file in place with `compiler source -d <source dir>`.
///
/// Returns the output directory. Compilers overwrite existing byte code.
#[tracing::instrument(skip(runner), fields(shader = %source.display()))]
pub fn compile_shader(
    runner: &dyn ToolRunner,
    compiler: &Path,
    source: &Path,
) -> RibResult<PathBuf> {
    if !source.is_file() {
        return Err(RibError::validation(format!(
            "shader source '{}' does not exist",
            source.display()
        )));
    }
    let out_dir = parent_or_cwd(source);
    let args = os_args([
        source.as_os_str().to_owned(),
        "-d".into(),
        out_dir.as_os_str().to_owned(),
    ]);

    let out = runner.run(compiler, &args).map_err(|e| {
        tracing::warn!(
            compiler = %compiler.display(),
            error = %e,
            "shader compiler did not start"
        );
        RibError::Compilation {
            shader: source.to_path_buf(),
            exit_code: None,
        }
    })?;
    log_tool_output(compiler, &out);
    if !out.success() {
        return Err(RibError::Compilation {
            shader: source.to_path_buf(),
            exit_code: out.exit_code,
        });
    }
    tracing::info!(out_dir = %out_dir.display(), "compiled shader");
    Ok(out_dir)
}
