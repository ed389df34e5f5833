use crate::{foundation::error::RibResult, tools::runner::ensure_parent_dir};
use anyhow::Context as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Write `path` through a temporary sibling that is renamed into place on success.
///
/// When `body` fails the temporary file is removed and any existing file at `path` is left
/// untouched.
pub fn write_atomic<F>(path: &Path, body: F) -> RibResult<()>
where
    F: FnOnce(BufWriter<File>) -> RibResult<BufWriter<File>>,
{
    ensure_parent_dir(path)?;
    let tmp = temp_sibling(path);
    let mut guard = TempFileGuard(Some(tmp.clone()));

    let file = File::create(&tmp)
        .with_context(|| format!("create temporary output '{}'", tmp.display()))?;
    let sink = body(BufWriter::new(file))?;
    let file = sink
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush temporary output '{}'", tmp.display()))?;
    drop(file);

    std::fs::rename(&tmp, path)
        .with_context(|| format!("move '{}' to '{}'", tmp.display(), path.display()))?;
    guard.0 = None;
    Ok(())
}

/// Hidden temporary name next to `path`, unique per process.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_owned());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}
