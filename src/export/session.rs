use crate::{
    export::config::ExportConfig,
    export::emit::{Emitter, FrameReport},
    export::output::write_atomic,
    export::textures::{TextureCache, TextureStats},
    foundation::core::Frame,
    foundation::error::{RibError, RibResult},
    foundation::issue::ExportIssue,
    paths::resolver::PathResolver,
    scene::model::SceneSnapshot,
    sequence::frames::{CancelToken, FramePlan, PlannedFrame},
    stream::writer::RibWriter,
    texture::optimizer::TextureOptimizer,
    tools::runner::{SystemRunner, ToolRunner},
    walk::shaders::ShaderTypeCache,
    walk::walker::{FrameSamples, SceneWalker, Selection},
};
use std::path::PathBuf;

/// Which frames an export call writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameSelection {
    /// The scene's current frame, written to the output path unchanged.
    #[default]
    Current,
    /// One frame, written to the output path unchanged.
    Single(Frame),
    /// Every frame of `[start, end]`, each to a frame-numbered output path.
    Sequence {
        /// First frame.
        start: Frame,
        /// Last frame (inclusive).
        end: Frame,
    },
}

/// Options for one export call.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Output file, or the base name of a numbered sequence.
    pub output: PathBuf,
    /// Frames to write.
    pub frames: FrameSelection,
    /// Write motion blocks in archive exports.
    pub archive_motion: bool,
    /// Checked between frames.
    pub cancel: CancelToken,
}

impl ExportOptions {
    /// Export the current frame to `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            frames: FrameSelection::Current,
            archive_motion: true,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_frames(mut self, frames: FrameSelection) -> Self {
        self.frames = frames;
        self
    }
}

/// Lifecycle of an [`ExportSession`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No export started.
    #[default]
    Idle,
    /// Walking the scene for a frame.
    Collecting,
    /// Writing a frame's stream.
    Writing,
    /// Summarizing texture work after the last frame.
    FlushingTextures,
    /// Finished with at least one frame written, or nothing to do.
    Done,
    /// Every attempted frame failed.
    Failed,
}

/// Export call statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Frames in the plan.
    pub frames_total: u64,
    /// Frames written successfully.
    pub frames_written: u64,
    /// Frames aborted by a frame-fatal error.
    pub frames_failed: u64,
    /// Renderables collected over all frames.
    pub renderables: u64,
    /// Leaf requests written over all frame streams.
    pub requests: u64,
    /// Texture resolution counters.
    pub textures: TextureStats,
}

/// Outcome of one export call.
#[derive(Debug)]
pub struct ExportResult {
    /// Written files: frame streams, then each frame's object archives.
    pub written_paths: Vec<PathBuf>,
    /// Degraded but exported data.
    pub warnings: Vec<ExportIssue>,
    /// Entity-local errors and aborted frames.
    pub errors: Vec<ExportIssue>,
    /// Final session state.
    pub state: SessionState,
    /// `true` when cancellation stopped the plan early.
    pub cancelled: bool,
    /// Counters.
    pub stats: ExportStats,
}

/// One export invocation's state: resolver, tool runner, shader typing and texture caches.
///
/// The scene snapshot is borrowed and never mutated.
pub struct ExportSession<'a> {
    scene: &'a SceneSnapshot,
    config: ExportConfig,
    resolver: PathResolver,
    runner: Box<dyn ToolRunner + 'a>,
    shaders: ShaderTypeCache,
    textures: TextureCache,
    state: SessionState,
}

impl<'a> ExportSession<'a> {
    /// Create a session running external tools through `runner`.
    pub fn new(
        scene: &'a SceneSnapshot,
        config: ExportConfig,
        runner: impl ToolRunner + 'a,
    ) -> RibResult<Self> {
        config.validate()?;
        scene.validate()?;
        Ok(Self {
            scene,
            resolver: PathResolver::new(config.paths.clone()),
            config,
            runner: Box::new(runner),
            shaders: ShaderTypeCache::new(),
            textures: TextureCache::new(),
            state: SessionState::Idle,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Export the whole scene (`objects == None`) or an archive of the named objects.
    ///
    /// Frame-fatal errors are recorded and the plan continues with the next frame.
    pub fn export(
        &mut self,
        objects: Option<&[String]>,
        options: &ExportOptions,
    ) -> RibResult<ExportResult> {
        let plan = match options.frames {
            FrameSelection::Current => FramePlan::single(Frame(self.scene.settings.frame_current)),
            FrameSelection::Single(f) => FramePlan::single(f),
            FrameSelection::Sequence { start, end } => FramePlan::archive_sequence(start, end)?,
        };
        let selection = match objects {
            None => Selection::All,
            Some(names) => Selection::Objects(names.to_vec()),
        };
        let motion_allowed = objects.is_none() || options.archive_motion;

        let mut result = ExportResult {
            written_paths: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            state: SessionState::Idle,
            cancelled: false,
            stats: ExportStats {
                frames_total: plan.len(),
                ..ExportStats::default()
            },
        };

        for planned in plan.frames(&options.output) {
            if options.cancel.is_cancelled() {
                tracing::info!(frame = planned.frame.0, "export cancelled");
                result.cancelled = true;
                break;
            }
            match self.export_frame(&selection, &planned, motion_allowed, &mut result) {
                Ok(()) => result.stats.frames_written += 1,
                Err(e) => {
                    tracing::warn!(frame = planned.frame.0, error = %e, "frame aborted");
                    result.stats.frames_failed += 1;
                    result.errors.push(
                        ExportIssue::new(e)
                            .at_frame(planned.frame)
                            .with_path(planned.output.clone()),
                    );
                }
            }
        }

        self.state = SessionState::FlushingTextures;
        let tex = self.textures.stats();
        result.stats.textures = tex;
        tracing::info!(
            reused = tex.reused,
            generated = tex.generated,
            skipped = tex.skipped,
            failed = tex.failed,
            "texture summary"
        );

        let attempted = result.stats.frames_written + result.stats.frames_failed;
        self.state = if attempted > 0 && result.stats.frames_written == 0 {
            SessionState::Failed
        } else {
            SessionState::Done
        };
        result.state = self.state;
        Ok(result)
    }

    #[tracing::instrument(skip_all, fields(frame = planned.frame.0, output = %planned.output.display()))]
    fn export_frame(
        &mut self,
        selection: &Selection,
        planned: &PlannedFrame,
        motion_allowed: bool,
        result: &mut ExportResult,
    ) -> RibResult<()> {
        self.state = SessionState::Collecting;
        let samples = FrameSamples::from_scene(self.scene, planned.frame, motion_allowed);
        let collection = SceneWalker::new(self.scene, &self.resolver, &mut self.shaders)
            .collect(selection, &samples)?;
        result.warnings.extend(collection.warnings);
        result.errors.extend(collection.issues);
        result.stats.renderables += collection.renderables.len() as u64;

        self.state = SessionState::Writing;
        let optimizer =
            TextureOptimizer::new(&self.resolver, &self.config.optimizer, self.runner.as_ref());
        let mut report = FrameReport::default();
        let mut requests = 0;
        let written = {
            let mut emitter = Emitter::new(
                self.scene,
                &optimizer,
                &mut self.textures,
                planned.frame,
                &mut report,
            );
            write_atomic(&planned.output, |sink| {
                let mut w = RibWriter::new(sink);
                match selection {
                    Selection::All => {
                        emitter.write_scene(&mut w, &collection.renderables, &samples)?
                    }
                    Selection::Objects(_) => {
                        emitter.write_archive(&mut w, &collection.renderables)?
                    }
                }
                requests = w.request_count();
                w.finish()
            })
        };

        result.warnings.append(&mut report.warnings);
        result.errors.append(&mut report.errors);
        if let Err(e) = written {
            discard_archives(&report.archives);
            return Err(e);
        }

        tracing::debug!(requests, archives = report.archives.len(), "frame written");
        result.stats.requests += requests;
        result.written_paths.push(planned.output.clone());
        result.written_paths.append(&mut report.archives);
        Ok(())
    }
}

/// Remove object archives of a frame whose main stream was not written.
fn discard_archives(paths: &[PathBuf]) {
    for path in paths {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed archive of aborted frame"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not remove archive of aborted frame"
            ),
        }
    }
}

/// Export with external tools run as real processes.
pub fn export(
    scene: &SceneSnapshot,
    objects: Option<&[String]>,
    options: &ExportOptions,
    config: ExportConfig,
) -> RibResult<ExportResult> {
    ExportSession::new(scene, config, SystemRunner)?.export(objects, options)
}

impl ExportResult {
    /// Return `true` when nothing was reported as an error.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error, if any.
    pub fn first_error(&self) -> Option<&RibError> {
        self.errors.first().map(|i| &i.error)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/session.rs"]
mod tests;
