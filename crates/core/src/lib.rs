//! Core library for the Lightbeam effect.
//!
//! A procedural, additively composited light beam painted onto a resizable
//! 2D surface. Bands are sampled once from a seed, evaluated as an
//! edge-converging wave field each frame, and layered with glows, a wash
//! and flares. The engine is driven entirely by its host: it never spawns
//! threads, polls for size or touches the clock on its own.

pub mod bands;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod record;
pub mod render;
pub mod surface;
pub mod timeline;

pub use bands::{Band, BandSet, Harmonic, Waveform};
pub use config::{BandRanges, BeamConfig, ColorStop, CompositorParams, Palette, WaveParams};
pub use engine::{BeamEngine, FrameOutcome};
pub use error::{BeamError, Result};
pub use record::{FrameRecorder, RecordingSettings};
pub use render::Compositor;
pub use surface::{
    DrawCommand, PixmapSurface, RecordingSurface, Surface, SurfaceGeometry, Viewport,
};
pub use timeline::{
    AnimationClock, DriverState, FrameDriver, FrameScheduler, FrameToken, ManualScheduler,
    MAX_DELTA,
};
