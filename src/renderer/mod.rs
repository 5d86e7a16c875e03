//! WebGPU rendering module
//!
//! The fractal's GPU twin: a fullscreen-triangle fragment shader iterating
//! the same recurrence as `crate::fractal`, fed from the same derived
//! parameters.

pub mod fractal_pipeline;

pub use fractal_pipeline::FractalSurface;
