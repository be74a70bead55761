use thiserror::Error;

/// Failures surfaced by a crop session.
///
/// Every variant is scoped to the current session; nothing here is fatal to
/// the process and nothing is retried automatically.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CropError {
    /// The source bitmap could not be read or decoded.
    #[error("failed to load source image: {reason}")]
    ImageLoadFailure { reason: String },
    /// The image has no area, so no crop rectangle can exist on it.
    #[error("degenerate crop geometry for a {width}x{height} image")]
    DegenerateGeometry { width: u32, height: u32 },
    /// The output buffer could not be produced. The session stays open.
    #[error("failed to rasterize crop: {0}")]
    RasterizationFailure(String),
    /// An operation needed a decoded source image but none is available yet.
    #[error("no source image is ready")]
    NotReady,
    /// The settings file could not be read, parsed or written.
    #[error("settings error: {0}")]
    Settings(String),
}

impl CropError {
    pub(crate) fn load(reason: impl std::fmt::Display) -> Self {
        Self::ImageLoadFailure {
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = CropError> = std::result::Result<T, E>;
