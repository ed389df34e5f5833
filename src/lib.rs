//! ribexport serializes host scene snapshots into RenderMan RIB description streams.
//!
//! The exporter is session-oriented:
//!
//! - Load and validate a [`SceneSnapshot`] and an [`ExportConfig`]
//! - Create an [`ExportSession`] with a [`ToolRunner`] for the texture optimizer
//! - Export the whole scene or an archive of selected objects, for one frame or a sequence
//!
//! Motion blur, per-frame archive sequences, texture optimization with mtime staleness and
//! shader compilation are supported; the renderer itself is an external collaborator.
#![forbid(unsafe_code)]

pub mod export;
pub mod foundation;
pub mod paths;
pub mod scene;
pub mod sequence;
pub mod stream;
pub mod texture;
pub mod tools;
pub mod walk;

pub use crate::foundation::core::{Frame, FrameRange, Shutter};
pub use crate::foundation::error::{RibError, RibResult};
pub use crate::foundation::issue::ExportIssue;

pub use crate::export::config::ExportConfig;
pub use crate::export::session::{
    ExportOptions, ExportResult, ExportSession, ExportStats, FrameSelection, SessionState, export,
};
pub use crate::paths::resolver::{PathConfig, PathResolver, sequence_output_path};
pub use crate::scene::model::SceneSnapshot;
pub use crate::sequence::frames::{CancelToken, FramePlan};
pub use crate::sequence::samples::plan_samples;
pub use crate::stream::writer::{BlockKind, RibWriter};
pub use crate::texture::optimizer::{OptimizerConfig, TextureOptimizer};
pub use crate::tools::runner::{SystemRunner, ToolOutput, ToolRunner};
pub use crate::tools::shader_compiler::compile_shader;
pub use crate::walk::walker::{SceneWalker, Selection};
