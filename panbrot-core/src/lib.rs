pub mod complex;
pub mod error;
pub mod escape;
pub mod mode;
pub mod point;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use escape::{advance, Escape, EscapeParams};
pub use mode::FractalMode;
pub use point::{Point, Progress};
pub use viewport::Viewport;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
