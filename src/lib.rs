//! Fractal Grove - an idle garden grown from math
//!
//! Core modules:
//! - `fractal`: Escape-time evaluator (Mandelbrot/Julia) with a tiled CPU
//!   backend and shared parameter/palette math
//! - `growth`: L-system rewriting, 3D turtle interpretation, light exposure
//! - `renderer`: WebGPU fragment-shader fractal backend
//! - `settings`: Persisted preferences (render backend, generation caps)

pub mod fractal;
pub mod growth;
pub mod renderer;
pub mod settings;

pub use settings::{RenderBackend, Settings};

/// Shared configuration constants
pub mod consts {
    /// Hard cap on escape-time iterations, mirrored in the shader loop bound
    pub const ITERATION_CAP: u32 = 1000;

    /// Height of one CPU render strip in pixels
    pub const DEFAULT_TILE_HEIGHT: u32 = 32;

    /// Hard cap on emitted branch segments per interpretation pass
    pub const DEFAULT_MAX_SEGMENTS: usize = 3500;

    /// Cap on the rewritten sentence length (bounding, not truncating)
    pub const DEFAULT_MAX_SENTENCE: usize = 12000;
}
