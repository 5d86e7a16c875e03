//! Derived render parameters for the escape-time evaluator
//!
//! Pure functions of `(depth, amplifiers)`. Both backends consume the same
//! derived values: the CPU tile loop calls these directly, the GPU path feeds
//! them into its uniforms. Keeping one copy is what prevents the two numeric
//! paths from drifting apart.

use serde::{Deserialize, Serialize};

use crate::consts::ITERATION_CAP;

/// A point in the complex plane. Copied, never aliased across frames.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplexParameter {
    pub real: f64,
    pub imaginary: f64,
}

impl ComplexParameter {
    pub const fn new(real: f64, imaginary: f64) -> Self {
        Self { real, imaginary }
    }
}

/// Which recurrence the evaluator iterates.
///
/// Julia mode carries its own constant; the "constant defaults to the view
/// center" rule lives in [`FractalFormula::julia`] rather than as a runtime
/// fallback on an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FractalFormula {
    Mandelbrot,
    Julia { constant: ComplexParameter },
}

impl FractalFormula {
    /// Julia formula with an explicit constant, falling back to `center`
    /// when none has been picked yet.
    pub fn julia(constant: Option<ComplexParameter>, center: ComplexParameter) -> Self {
        Self::Julia {
            constant: constant.unwrap_or(center),
        }
    }
}

impl Default for FractalFormula {
    fn default() -> Self {
        Self::Mandelbrot
    }
}

/// Iteration budget: grows with depth and amplifiers, capped at 1000.
pub fn max_iterations(depth: f64, amplifiers: u32) -> u32 {
    let raw = (40.0 + depth * 14.0 + f64::from(amplifiers) * 12.0).floor();
    (raw as i64).clamp(1, i64::from(ITERATION_CAP)) as u32
}

/// Zoom multiplier: exponential in depth, half-weight per amplifier.
pub fn zoom(depth: f64, amplifiers: u32) -> f64 {
    1.3_f64.powf(depth + f64::from(amplifiers) * 0.5)
}

/// Hue rotation in degrees, always in `[0, 360)`.
pub fn palette_shift(depth: f64, amplifiers: u32) -> f64 {
    ((depth * 17.0 + f64::from(amplifiers) * 45.0) % 360.0 + 360.0) % 360.0
}

/// Palette saturation in `[0, 1]`, wobbling slowly with depth.
pub fn saturation(depth: f64) -> f64 {
    (0.7 + (depth * 0.4).sin() * 0.1).clamp(0.0, 1.0)
}

/// All derived parameters for one render. Ephemeral: recomputed whenever
/// depth or amplifiers change, never stored across frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderParams {
    pub max_iterations: u32,
    pub zoom: f64,
    pub palette_shift: f64,
    pub saturation: f64,
}

impl RenderParams {
    pub fn derive(depth: f64, amplifiers: u32) -> Self {
        Self {
            max_iterations: max_iterations(depth, amplifiers),
            zoom: zoom(depth, amplifiers),
            palette_shift: palette_shift(depth, amplifiers),
            saturation: saturation(depth),
        }
    }
}
