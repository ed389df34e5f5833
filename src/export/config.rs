use crate::{
    foundation::error::{RibError, RibResult},
    paths::resolver::PathConfig,
    texture::optimizer::OptimizerConfig,
};
use anyhow::Context as _;
use std::path::{Path, PathBuf};

/// Exporter configuration: directory layout and external tool invocation.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Asset and output directory layout.
    pub paths: PathConfig,
    /// Texture optimizer invocation.
    pub optimizer: OptimizerConfig,
    /// Shader compiler executable.
    pub shader_compiler: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            paths: PathConfig::default(),
            optimizer: OptimizerConfig::default(),
            shader_compiler: PathBuf::from("shaderdl"),
        }
    }
}

impl ExportConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json_str(s: &str) -> RibResult<Self> {
        serde_json::from_str(s).map_err(|e| RibError::serde(format!("export config: {e}")))
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> RibResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read export config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> RibResult<()> {
        let ext = &self.paths.optimized_ext;
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(RibError::validation(format!(
                "optimized texture extension '{ext}' must be a bare, non-empty extension"
            )));
        }
        if self.optimizer.binary.as_os_str().is_empty() {
            return Err(RibError::validation("texture optimizer binary must be set"));
        }
        if self.shader_compiler.as_os_str().is_empty() {
            return Err(RibError::validation("shader compiler binary must be set"));
        }
        if self.paths.archive_dir.as_os_str().is_empty() {
            return Err(RibError::validation("archive directory must be set"));
        }
        Ok(())
    }
}
