use crate::{
    export::emit::FrameReport,
    foundation::core::Frame,
    foundation::error::RibError,
    foundation::issue::ExportIssue,
    scene::model::SceneSnapshot,
    texture::optimizer::{TextureAction, TextureOptimizer},
};
use std::collections::HashMap;

/// Counters for texture resolution over one export call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureStats {
    /// Up-to-date artifacts reused.
    pub reused: u64,
    /// Optimizer runs that succeeded.
    pub generated: u64,
    /// Stale or missing artifacts left alone because generation is disabled.
    pub skipped: u64,
    /// Textures that fell back to their source path or to an empty path.
    pub failed: u64,
}

/// Per-export memo of texture paths keyed by texture name and frame.
///
/// The first reference in a frame runs the optimizer bridge; later references in the same frame
/// reuse the answer, including failures, so each problem is reported once.
#[derive(Debug, Default)]
pub struct TextureCache {
    resolved: HashMap<(String, Frame), String>,
    stats: TextureStats,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of (texture, frame) entries resolved so far.
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    pub fn stats(&self) -> TextureStats {
        self.stats
    }

    /// Path written for texture `name` at `frame`.
    ///
    /// Optimization failures degrade to the source path with a warning; a missing source is an
    /// error that still writes the source path; an unresolvable source writes an empty string.
    pub(crate) fn resolve(
        &mut self,
        scene: &SceneSnapshot,
        optimizer: &TextureOptimizer<'_>,
        name: &str,
        frame: Frame,
        report: &mut FrameReport,
    ) -> String {
        let key = (name.to_owned(), frame);
        if let Some(hit) = self.resolved.get(&key) {
            return hit.clone();
        }

        let Some(texture) = scene.textures.get(name) else {
            self.stats.failed += 1;
            report
                .errors
                .push(issue(frame, name, RibError::missing_data(name, "texture")));
            self.resolved.insert(key, String::new());
            return String::new();
        };

        let source = || {
            optimizer
                .resolver()
                .resolve_source_path(name, texture, frame)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        let path = match optimizer.ensure_optimized_detailed(name, texture, frame) {
            Ok(outcome) => {
                match outcome.action {
                    TextureAction::Reused => self.stats.reused += 1,
                    TextureAction::Generated => self.stats.generated += 1,
                    TextureAction::Skipped => self.stats.skipped += 1,
                }
                outcome.path.to_string_lossy().into_owned()
            }
            Err(e @ RibError::Optimization { .. }) => {
                tracing::warn!(texture = name, error = %e, "falling back to unoptimized texture");
                self.stats.failed += 1;
                report.warnings.push(issue(frame, name, e));
                source()
            }
            Err(e @ RibError::PathResolution { .. }) => {
                self.stats.failed += 1;
                report.errors.push(issue(frame, name, e));
                String::new()
            }
            Err(e) => {
                self.stats.failed += 1;
                let path = source();
                report
                    .errors
                    .push(issue(frame, name, e).with_path(path.clone()));
                path
            }
        };
        self.resolved.insert(key, path.clone());
        path
    }
}

fn issue(frame: Frame, texture: &str, error: RibError) -> ExportIssue {
    ExportIssue::new(error).at_frame(frame).for_entity(texture)
}

#[cfg(test)]
#[path = "../../tests/unit/export/textures.rs"]
mod tests;
