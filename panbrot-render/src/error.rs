use thiserror::Error;

/// Errors originating from engine construction and snapshot export.
///
/// Run-time mutation requests never fail: invalid or contended requests are
/// dropped, see [`Engine`](crate::Engine).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("palette must contain at least one color")]
    EmptyPalette,

    #[error("palette table length {0} is not a multiple of 4")]
    RaggedPalette(usize),

    #[error("frame holds {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("failed to spawn worker thread")]
    Spawn(#[source] std::io::Error),

    #[error(transparent)]
    SeederPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encoding(#[from] png::EncodingError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] panbrot_core::CoreError),
}
