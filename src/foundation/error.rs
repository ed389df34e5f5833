use std::path::PathBuf;

/// Convenience result type used across the exporter.
pub type RibResult<T> = Result<T, RibError>;

/// Top-level error taxonomy used by exporter APIs.
///
/// Variants are grouped by blast radius: `PathResolution`, `MissingData`, `TextureNotFound` and
/// `Optimization` are local to one asset or variable; `Structural` and `MotionTopology` abort the
/// frame being written.
#[derive(thiserror::Error, Debug)]
pub enum RibError {
    /// An asset has no usable on-disk path.
    #[error("path resolution error for '{asset}': {reason}")]
    PathResolution {
        /// Asset (texture or object) name.
        asset: String,
        /// Human readable cause.
        reason: String,
    },

    /// A named data channel could not be found on its owner.
    #[error("missing data '{channel}' on '{entity}'")]
    MissingData {
        /// Owning entity name.
        entity: String,
        /// Channel (layer, group, particle attribute) name.
        channel: String,
    },

    /// Block nesting violation in the description stream.
    #[error("structural error: {0}")]
    Structural(String),

    /// Motion samples of one entity disagree on topology.
    #[error("motion topology mismatch on '{entity}': expected {expected} elements, found {found}")]
    MotionTopology {
        /// Entity name.
        entity: String,
        /// Element count of the first sample.
        expected: usize,
        /// Element count of the offending sample.
        found: usize,
    },

    /// A texture's resolved source file does not exist.
    #[error("texture '{texture}' source not found at '{}'", .path.display())]
    TextureNotFound {
        /// Texture name.
        texture: String,
        /// Resolved source path.
        path: PathBuf,
    },

    /// The texture optimizer exited unsuccessfully.
    #[error("texture optimization failed for '{}' ({})", .source_path.display(), exit_label(.exit_code))]
    Optimization {
        /// Source image passed to the optimizer.
        source_path: PathBuf,
        /// Process exit code, `None` when the process could not be run or was killed.
        exit_code: Option<i32>,
    },

    /// The shader compiler exited unsuccessfully.
    #[error("shader compilation failed for '{}' ({})", .shader.display(), exit_label(.exit_code))]
    Compilation {
        /// Shader source file.
        shader: PathBuf,
        /// Process exit code, `None` when the process could not be run or was killed.
        exit_code: Option<i32>,
    },

    /// Invalid user-provided scene or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code".to_owned(),
    }
}

impl RibError {
    /// Build a [`RibError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RibError::Structural`] value.
    pub fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }

    /// Build a [`RibError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`RibError::PathResolution`] value.
    pub fn path_resolution(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PathResolution {
            asset: asset.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`RibError::MissingData`] value.
    pub fn missing_data(entity: impl Into<String>, channel: impl Into<String>) -> Self {
        Self::MissingData {
            entity: entity.into(),
            channel: channel.into(),
        }
    }

    /// Return `true` when this error must abort the frame currently being written.
    pub fn is_frame_fatal(&self) -> bool {
        matches!(
            self,
            Self::Structural(_) | Self::MotionTopology { .. } | Self::Other(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
