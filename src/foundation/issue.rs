use crate::foundation::core::Frame;
use crate::foundation::error::RibError;
use std::path::PathBuf;

/// A localized failure recorded during export, with enough context to show the user.
#[derive(Debug)]
pub struct ExportIssue {
    /// Frame being exported when the issue was recorded.
    pub frame: Option<Frame>,
    /// Entity (object, texture, particle system) the issue belongs to.
    pub entity: Option<String>,
    /// File path involved, if any.
    pub path: Option<PathBuf>,
    /// Underlying error.
    pub error: RibError,
}

impl ExportIssue {
    /// Wrap an error with no extra context.
    pub fn new(error: RibError) -> Self {
        Self {
            frame: None,
            entity: None,
            path: None,
            error,
        }
    }

    /// Attach a frame.
    pub fn at_frame(mut self, frame: Frame) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Attach an entity name.
    pub fn for_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Attach a path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ExportIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(frame) = self.frame {
            write!(f, "[frame {frame}] ")?;
        }
        if let Some(entity) = &self.entity {
            write!(f, "{entity}: ")?;
        }
        write!(f, "{}", self.error)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path.display())?;
        }
        Ok(())
    }
}
