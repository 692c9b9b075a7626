use thiserror::Error;

/// Errors raised while validating core numeric parameters.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid raster dimensions {width}×{height} (must be non-zero and even)")]
    InvalidRaster { width: u32, height: u32 },

    #[error("invalid escape radius: {0} (must be > 0.0)")]
    InvalidEscapeRadius(f64),

    #[error("invalid chunk size: {0} (must be >= 1)")]
    InvalidChunkSize(u32),

    #[error("invalid iteration ceiling: {0} (must be >= 1)")]
    InvalidMaxSteps(u32),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },
}
