use crate::{
    foundation::core::Frame,
    foundation::error::{RibError, RibResult},
    paths::resolver::PathResolver,
    scene::model::{ColorDepth, Compression, TextureDef},
    tools::runner::{ToolRunner, ensure_parent_dir, log_tool_output},
};
use anyhow::Context as _;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// External texture optimizer invocation settings.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Optimizer executable.
    pub binary: PathBuf,
    /// Flag placed between source and output paths. Empty omits it.
    pub output_flag: String,
    /// Arguments placed before the source path.
    pub extra_args: Vec<String>,
    /// Translate each texture's sampling settings into optimizer flags.
    pub forward_texture_settings: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tdlmake"),
            output_flag: "-o".to_owned(),
            extra_args: Vec::new(),
            forward_texture_settings: false,
        }
    }
}

/// Freshness of an optimized artifact relative to its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Staleness {
    /// Artifact exists and is at least as new as the source.
    Fresh,
    /// Artifact does not exist.
    Missing,
    /// Artifact is older than the source.
    Older,
}

/// What [`TextureOptimizer::ensure_optimized_detailed`] did for one texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureAction {
    /// Up-to-date artifact reused.
    Reused,
    /// Optimizer ran.
    Generated,
    /// Artifact is missing or stale but generation is disabled for this texture.
    Skipped,
}

/// Resolved optimized texture plus the action taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureOutcome {
    /// Optimized texture path.
    pub path: PathBuf,
    /// Action taken.
    pub action: TextureAction,
}

/// Bridge to the external texture optimizer with mtime-based cache staleness.
///
/// mtime comparison is sensitive to clock skew between machines on networked storage; an
/// artifact written by a host with a fast clock can look fresh after its source changed.
pub struct TextureOptimizer<'a> {
    resolver: &'a PathResolver,
    cfg: &'a OptimizerConfig,
    runner: &'a dyn ToolRunner,
}

impl<'a> TextureOptimizer<'a> {
    /// Create an optimizer bridge.
    pub fn new(
        resolver: &'a PathResolver,
        cfg: &'a OptimizerConfig,
        runner: &'a dyn ToolRunner,
    ) -> Self {
        Self {
            resolver,
            cfg,
            runner,
        }
    }

    /// Path resolver used for source and optimized paths.
    pub fn resolver(&self) -> &'a PathResolver {
        self.resolver
    }

    /// Ensure the optimized artifact for texture `name` at `frame` is current and return its path.
    pub fn ensure_optimized(
        &self,
        name: &str,
        texture: &TextureDef,
        frame: Frame,
    ) -> RibResult<PathBuf> {
        Ok(self.ensure_optimized_detailed(name, texture, frame)?.path)
    }

    /// Like [`Self::ensure_optimized`], also reporting whether the optimizer ran.
    #[tracing::instrument(skip(self, texture, frame), fields(frame = frame.0))]
    pub fn ensure_optimized_detailed(
        &self,
        name: &str,
        texture: &TextureDef,
        frame: Frame,
    ) -> RibResult<TextureOutcome> {
        let flags = self.flags_for(texture);
        let source = self.resolver.resolve_source_path(name, texture, frame)?;
        let optimized = self
            .resolver
            .resolve_optimized_path(name, texture, frame, &flags)?;

        if !source.is_file() {
            return Err(RibError::TextureNotFound {
                texture: name.to_owned(),
                path: source,
            });
        }

        let staleness = staleness(&source, &optimized)?;
        if staleness == Staleness::Fresh {
            return Ok(TextureOutcome {
                path: optimized,
                action: TextureAction::Reused,
            });
        }
        if !should_generate(texture, staleness) {
            tracing::warn!(
                texture = name,
                path = %optimized.display(),
                ?staleness,
                "optimized texture is not current and generation is disabled"
            );
            return Ok(TextureOutcome {
                path: optimized,
                action: TextureAction::Skipped,
            });
        }

        self.run_optimizer(&source, &optimized, &flags)?;
        Ok(TextureOutcome {
            path: optimized,
            action: TextureAction::Generated,
        })
    }

    /// Optimizer arguments preceding the source path for `texture`.
    pub fn flags_for(&self, texture: &TextureDef) -> Vec<String> {
        let mut flags = self.cfg.extra_args.clone();
        if self.cfg.forward_texture_settings {
            flags.extend(sampling_flags(texture));
        }
        flags
    }

    fn run_optimizer(&self, source: &Path, optimized: &Path, flags: &[String]) -> RibResult<()> {
        ensure_parent_dir(optimized)?;
        let mut args: Vec<OsString> = flags.iter().map(OsString::from).collect();
        args.push(source.as_os_str().to_owned());
        if !self.cfg.output_flag.is_empty() {
            args.push(OsString::from(&self.cfg.output_flag));
        }
        args.push(optimized.as_os_str().to_owned());

        tracing::debug!(
            source = %source.display(),
            optimized = %optimized.display(),
            "running texture optimizer"
        );
        let out = self.runner.run(&self.cfg.binary, &args).map_err(|e| {
            tracing::warn!(
                binary = %self.cfg.binary.display(),
                error = %e,
                "texture optimizer did not start"
            );
            RibError::Optimization {
                source_path: source.to_path_buf(),
                exit_code: None,
            }
        })?;
        log_tool_output(&self.cfg.binary, &out);
        if !out.success() {
            return Err(RibError::Optimization {
                source_path: source.to_path_buf(),
                exit_code: out.exit_code,
            });
        }
        Ok(())
    }
}

/// Compare artifact and source modification times.
pub fn staleness(source: &Path, optimized: &Path) -> RibResult<Staleness> {
    let opt_meta = match std::fs::metadata(optimized) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Staleness::Missing),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("stat optimized texture '{}'", optimized.display()))
                .into());
        }
    };
    let src_time = std::fs::metadata(source)
        .and_then(|m| m.modified())
        .with_context(|| format!("stat texture source '{}'", source.display()))?;
    let opt_time = opt_meta
        .modified()
        .with_context(|| format!("read mtime of '{}'", optimized.display()))?;
    Ok(if opt_time < src_time {
        Staleness::Older
    } else {
        Staleness::Fresh
    })
}

/// Generation gate: `auto_generate` masks both per-condition flags.
pub fn should_generate(texture: &TextureDef, staleness: Staleness) -> bool {
    if !texture.auto_generate {
        return false;
    }
    match staleness {
        Staleness::Fresh => false,
        Staleness::Missing => texture.generate_if_nonexistent,
        Staleness::Older => texture.generate_if_older,
    }
}

fn sampling_flags(texture: &TextureDef) -> Vec<String> {
    let s = &texture.sampling;
    let mut flags = vec![
        "-smode".to_owned(),
        s.wrap_s.as_str().to_owned(),
        "-tmode".to_owned(),
        s.wrap_t.as_str().to_owned(),
        "-filter".to_owned(),
        s.filter.clone(),
    ];
    if s.blur > 0.0 {
        flags.push("-blur".to_owned());
        flags.push(s.blur.to_string());
    }
    if s.flip_s {
        flags.push("-flips".to_owned());
    }
    if s.flip_t {
        flags.push("-flipt".to_owned());
    }
    match s.color_depth {
        ColorDepth::Byte => {}
        ColorDepth::Short => flags.push("-short".to_owned()),
        ColorDepth::Float => flags.push("-float".to_owned()),
    }
    match s.compression {
        Compression::None => {}
        Compression::Lzw => flags.push("-lzw".to_owned()),
        Compression::Zip => flags.push("-zip".to_owned()),
    }
    flags
}

#[cfg(test)]
#[path = "../../tests/unit/texture/optimizer.rs"]
mod tests;
