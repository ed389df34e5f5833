use crate::{
    foundation::core::{Frame, FrameRange},
    foundation::error::RibResult,
    paths::resolver::sequence_output_path,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation flag, checked between frames.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// New, not-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The frame in progress still completes.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Return `true` once [`Self::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// One frame of a plan together with its output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedFrame {
    /// Host frame.
    pub frame: Frame,
    /// Output file for this frame.
    pub output: PathBuf,
}

/// Ordered list of frames to export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePlan {
    range: FrameRange,
    numbered: bool,
}

impl FramePlan {
    /// Export a single frame to the output path unchanged.
    pub fn single(frame: Frame) -> Self {
        Self {
            range: FrameRange::single(frame),
            numbered: false,
        }
    }

    /// Export every integer frame of `[start, end]`, each to a frame-numbered output path.
    pub fn archive_sequence(start: Frame, end: Frame) -> RibResult<Self> {
        Ok(Self {
            range: FrameRange::new(start, end)?,
            numbered: true,
        })
    }

    /// Frame range covered by the plan.
    pub fn range(&self) -> FrameRange {
        self.range
    }

    /// Number of frames.
    pub fn len(&self) -> u64 {
        self.range.len_frames()
    }

    /// Plans always contain at least one frame.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Frames in ascending order with their outputs derived from `base`.
    pub fn frames<'a>(&'a self, base: &'a Path) -> impl Iterator<Item = PlannedFrame> + 'a {
        self.range.iter().map(move |frame| PlannedFrame {
            frame,
            output: if self.numbered {
                sequence_output_path(base, frame)
            } else {
                base.to_path_buf()
            },
        })
    }
}
