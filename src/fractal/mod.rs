//! Escape-time fractal subsystem
//!
//! Pure math plus a tiled CPU backend. This module must stay free of
//! rendering and platform dependencies; the GPU twin lives in
//! `crate::renderer` and consumes the same derived parameters.

pub mod evaluate;
pub mod job;
pub mod palette;
pub mod params;
pub mod tiles;

pub use evaluate::{FractalView, escape_time};
pub use job::{RenderJob, RenderReply, RenderRequest};
pub use palette::Escape;
pub use params::{ComplexParameter, FractalFormula, RenderParams};
pub use tiles::{Tile, TileRenderer, render_frame};
