pub mod config;
mod coordinator;
pub mod double_buffer;
pub mod engine;
pub mod error;
pub mod export;
pub mod frame;
pub mod grid;
pub mod palette;
pub mod sync;
mod worker;

pub use config::EngineConfig;
pub use coordinator::{EpochReport, EpochState};
pub use double_buffer::{DoubleBuffer, EpochKind, Overlap, Transition};
pub use engine::Engine;
pub use error::RenderError;
pub use export::{export_engine_png, export_png, SnapshotMetadata};
pub use frame::{FrameBuffer, FrameSignal};
pub use grid::Grid;
pub use palette::{Palette, PaletteMode};

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
