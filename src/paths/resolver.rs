use crate::{
    foundation::core::Frame,
    foundation::error::{RibError, RibResult},
    foundation::hash::StableHasher,
    scene::model::{GeometrySource, ObjectDef, SequenceAnim, TextureDef},
};
use std::path::{Component, Path, PathBuf};

/// Renderer marker for "append the default search path".
pub const DEFAULT_SEARCH_MARKER: &str = "&";

/// Directory layout used to resolve on-disk asset paths.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Root for `//`-prefixed project-relative paths. Relative paths stay relative when unset.
    pub project_root: Option<PathBuf>,
    /// Optimized texture cache directory. When unset, optimized files sit next to their source.
    pub texture_dir: Option<PathBuf>,
    /// Optimized texture extension.
    pub optimized_ext: String,
    /// Output directory for per-object archives.
    pub archive_dir: PathBuf,
    /// Shader search directories, in priority order.
    pub shader_paths: Vec<PathBuf>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            texture_dir: None,
            optimized_ext: "tdl".to_owned(),
            archive_dir: PathBuf::from("archives"),
            shader_paths: Vec::new(),
        }
    }
}

/// Pure path computations for textures, archives, shader search paths and frame outputs.
///
/// No method touches the filesystem; identical inputs always give identical paths.
#[derive(Clone, Debug, Default)]
pub struct PathResolver {
    cfg: PathConfig,
}

impl PathResolver {
    /// Create a resolver for `cfg`.
    pub fn new(cfg: PathConfig) -> Self {
        Self { cfg }
    }

    /// Resolver configuration.
    pub fn config(&self) -> &PathConfig {
        &self.cfg
    }

    /// Resolve the source image path of texture `name` for `frame`.
    pub fn resolve_source_path(
        &self,
        name: &str,
        texture: &TextureDef,
        frame: Frame,
    ) -> RibResult<PathBuf> {
        let raw = texture
            .file_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| RibError::path_resolution(name, "texture has no source file path"))?;
        Ok(self.resolve_sequenced(raw, &texture.anim, frame))
    }

    /// Resolve the optimized texture path of texture `name` for `frame`.
    ///
    /// `flags` are the optimizer arguments the artifact is built with; they take part in the
    /// cache fingerprint so changed settings produce a different file.
    pub fn resolve_optimized_path(
        &self,
        name: &str,
        texture: &TextureDef,
        frame: Frame,
        flags: &[String],
    ) -> RibResult<PathBuf> {
        let source = self.resolve_source_path(name, texture, frame)?;
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RibError::path_resolution(name, "texture source has no file name"))?;
        let ext = &self.cfg.optimized_ext;

        Ok(match &self.cfg.texture_dir {
            Some(dir) => {
                let mut h = StableHasher::new();
                h.write_str(&source.to_string_lossy());
                h.write_u64(flags.len() as u64);
                for f in flags {
                    h.write_str(f);
                }
                let fp = h.finish();
                dir.join(format!("{stem}.{}.{ext}", fp.short_hex()))
            }
            None => source.with_file_name(format!("{stem}.{ext}")),
        })
    }

    /// Resolve the archive file an object's geometry is read from (or written to) at `frame`.
    pub fn resolve_archive_path(&self, object: &ObjectDef, frame: Frame) -> RibResult<PathBuf> {
        match &object.geometry_source {
            GeometrySource::Archive { path, anim }
            | GeometrySource::DelayedLoadArchive { path, anim, .. } => {
                if path.trim().is_empty() {
                    return Err(RibError::path_resolution(
                        &object.name,
                        "archive geometry source has an empty path",
                    ));
                }
                Ok(self.resolve_sequenced(path, anim, frame))
            }
            _ if object.export_archive => Ok(self
                .cfg
                .archive_dir
                .join(format!("{}.{:04}.rib", object.name, frame.0))),
            _ => Err(RibError::path_resolution(
                &object.name,
                "object has no archive geometry source and is not exported as an archive",
            )),
        }
    }

    /// Shader search path string: configured directories joined with `:`, then `&`.
    pub fn shader_search_path(&self) -> String {
        let mut parts: Vec<String> = self
            .cfg
            .shader_paths
            .iter()
            .map(|p| self.absolutize(&p.to_string_lossy()).to_string_lossy().into_owned())
            .collect();
        parts.push(DEFAULT_SEARCH_MARKER.to_owned());
        parts.join(":")
    }

    /// Return `true` when `dir` is one of the configured shader directories.
    pub fn contains_shader_dir(&self, dir: &Path) -> bool {
        let want = normalize(dir);
        self.cfg
            .shader_paths
            .iter()
            .any(|p| normalize(&self.absolutize(&p.to_string_lossy())) == want)
    }

    fn resolve_sequenced(&self, raw: &str, anim: &SequenceAnim, frame: Frame) -> PathBuf {
        let path = self.absolutize(raw);
        if !anim.animated_sequence {
            return path;
        }
        let on_disk = sequence_frame(anim, frame);
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return path;
        };
        path.with_file_name(substitute_frame(name, on_disk))
    }

    fn absolutize(&self, raw: &str) -> PathBuf {
        match raw.strip_prefix("//") {
            Some(rel) => match &self.cfg.project_root {
                Some(root) => root.join(rel),
                None => PathBuf::from(rel),
            },
            None => PathBuf::from(raw),
        }
    }
}

/// On-disk frame of an animated sequence at host `frame`, clamped to the available range.
pub fn sequence_frame(anim: &SequenceAnim, frame: Frame) -> i64 {
    let lo = anim.sequence_in.min(anim.sequence_out);
    let hi = anim.sequence_in.max(anim.sequence_out);
    (anim.blender_start + (frame.0 - anim.blender_start)).clamp(lo, hi)
}

/// Substitute `frame` into a file name.
///
/// A run of `#` becomes the zero-padded frame; otherwise the last digit run of the stem is
/// replaced keeping its width; otherwise `.NNNN` is appended to the stem.
pub fn substitute_frame(file_name: &str, frame: i64) -> String {
    if let Some(end) = file_name.rfind('#') {
        let width = file_name[..=end]
            .chars()
            .rev()
            .take_while(|&c| c == '#')
            .count();
        let start = end + 1 - width;
        return format!(
            "{}{:0width$}{}",
            &file_name[..start],
            frame,
            &file_name[end + 1..]
        );
    }

    let (stem, ext) = split_ext(file_name);
    if let Some(end) = stem.rfind(|c: char| c.is_ascii_digit()) {
        let width = stem[..=end]
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .count();
        let start = end + 1 - width;
        return format!("{}{:0width$}{}{ext}", &stem[..start], frame, &stem[end + 1..]);
    }
    format!("{stem}.{frame:04}{ext}")
}

/// Per-frame output path for a sequence export: `out.rib` becomes `out.0003.rib`.
pub fn sequence_output_path(base: &Path, frame: Frame) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}.{:04}.{}", frame.0, ext.to_string_lossy()),
        None => format!("{stem}.{:04}", frame.0),
    };
    base.with_file_name(name)
}

fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i..]),
        _ => (name, ""),
    }
}

fn normalize(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/paths/resolver.rs"]
mod tests;
