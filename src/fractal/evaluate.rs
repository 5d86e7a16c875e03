//! Per-pixel escape-time evaluation
//!
//! The full input tuple for one frame lives in [`FractalView`]; both backends
//! are fed from it and must stay visually interchangeable.

use serde::{Deserialize, Serialize};

use super::palette::{self, Escape};
use super::params::{ComplexParameter, FractalFormula, RenderParams};

/// Everything needed to evaluate one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalView {
    pub width: u32,
    pub height: u32,
    pub center: ComplexParameter,
    pub formula: FractalFormula,
    pub params: RenderParams,
}

impl FractalView {
    pub fn new(
        width: u32,
        height: u32,
        center: ComplexParameter,
        formula: FractalFormula,
        params: RenderParams,
    ) -> Self {
        Self {
            width,
            height,
            center,
            formula,
            params,
        }
    }

    /// Map a pixel to its point in the complex plane.
    ///
    /// Both axes are normalized by `0.5 * zoom * height` - height for BOTH
    /// divisors. Using width for the real axis distorts the set on
    /// non-square canvases; a regression test below pins this down.
    pub fn pixel_to_plane(&self, px: u32, py: u32) -> ComplexParameter {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let divisor = 0.5 * self.params.zoom * h;
        ComplexParameter {
            real: (f64::from(px) - w / 2.0) / divisor + self.center.real,
            imaginary: (f64::from(py) - h / 2.0) / divisor + self.center.imaginary,
        }
    }

    /// Evaluate the recurrence for one pixel.
    pub fn escape_at(&self, px: u32, py: u32) -> Escape {
        let mapped = self.pixel_to_plane(px, py);
        let (z0, c) = match self.formula {
            FractalFormula::Mandelbrot => (ComplexParameter::default(), mapped),
            FractalFormula::Julia { constant } => (mapped, constant),
        };
        escape_time(z0, c, self.params.max_iterations)
    }

    /// Evaluate and color one pixel.
    pub fn shade(&self, px: u32, py: u32) -> [u8; 4] {
        palette::escape_color(self.escape_at(px, py), &self.params)
    }
}

/// Iterate `z <- z^2 + c` until `|z|^2 > 4` or the budget runs out.
pub fn escape_time(z0: ComplexParameter, c: ComplexParameter, max_iterations: u32) -> Escape {
    let mut x = z0.real;
    let mut y = z0.imaginary;
    let mut iter = 0;

    while x * x + y * y <= 4.0 && iter < max_iterations {
        let xt = x * x - y * y + c.real;
        y = 2.0 * x * y + c.imaginary;
        x = xt;
        iter += 1;
    }

    if iter >= max_iterations {
        Escape::Inside
    } else {
        let zn = (x * x + y * y).sqrt();
        Escape::Outside {
            iter,
            smooth: palette::smooth_iteration(iter, zn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(width: u32, height: u32, center: ComplexParameter, formula: FractalFormula) -> FractalView {
        FractalView::new(width, height, center, formula, RenderParams::derive(0.0, 0))
    }

    #[test]
    fn test_escape_time_origin_is_interior() {
        // c = 0 stays at 0 forever
        let escape = escape_time(
            ComplexParameter::default(),
            ComplexParameter::default(),
            100,
        );
        assert_eq!(escape, Escape::Inside);
    }

    #[test]
    fn test_escape_time_far_point_escapes_immediately() {
        let c = ComplexParameter::new(10.0, 10.0);
        match escape_time(ComplexParameter::default(), c, 100) {
            Escape::Outside { iter, .. } => assert!(iter <= 2),
            Escape::Inside => panic!("point far outside the set must escape"),
        }
    }

    #[test]
    fn test_both_axes_divide_by_height() {
        // On a wide canvas, stepping one pixel in x and one in y must move
        // the plane coordinate by the same amount. This is the aspect-ratio
        // regression: normalizing the real axis by width breaks it.
        let v = view(
            300,
            100,
            ComplexParameter::default(),
            FractalFormula::Mandelbrot,
        );
        let origin = v.pixel_to_plane(150, 50);
        let right = v.pixel_to_plane(151, 50);
        let down = v.pixel_to_plane(150, 51);

        let dx = right.real - origin.real;
        let dy = down.imaginary - origin.imaginary;
        assert!((dx - dy).abs() < 1e-12, "real step {dx} != imag step {dy}");
    }

    #[test]
    fn test_center_pixel_maps_to_center() {
        let center = ComplexParameter::new(-0.75, 0.11);
        let v = view(100, 100, center, FractalFormula::Mandelbrot);
        let mapped = v.pixel_to_plane(50, 50);
        assert!((mapped.real - center.real).abs() < 1e-12);
        assert!((mapped.imaginary - center.imaginary).abs() < 1e-12);
    }

    #[test]
    fn test_seahorse_valley_center_escape_count() {
        // The tuning "sweet spot" (-0.75, 0.11) sits just off the cardioid
        // boundary: a slow escape, but still within the base budget of 40.
        // Pinned so a mapping or recurrence change shows up immediately.
        let center = ComplexParameter::new(-0.75, 0.11);
        let v = view(100, 100, center, FractalFormula::Mandelbrot);
        match v.escape_at(50, 50) {
            Escape::Outside { iter, smooth } => {
                assert_eq!(iter, 29);
                assert!(smooth > 28.0 && smooth < 31.0);
            }
            Escape::Inside => panic!("(-0.75, 0.11) escapes at iteration 29"),
        }
    }

    #[test]
    fn test_bulb_center_is_interior() {
        // (-1, 0) is the center of the period-2 bulb: interior at any budget
        let center = ComplexParameter::new(-1.0, 0.0);
        let v = view(100, 100, center, FractalFormula::Mandelbrot);
        assert_eq!(v.escape_at(50, 50), Escape::Inside);
    }

    #[test]
    fn test_julia_uses_constant_not_center() {
        // With a huge center, a Mandelbrot view escapes instantly everywhere;
        // a Julia view with c = 0 iterates z <- z^2 and the (huge) seed
        // escapes, while the same view seeded near 0 stays inside.
        let center = ComplexParameter::new(100.0, 100.0);
        let julia = view(
            100,
            100,
            ComplexParameter::default(),
            FractalFormula::Julia {
                constant: ComplexParameter::default(),
            },
        );
        // z0 = 0 under z^2: interior
        assert_eq!(julia.escape_at(50, 50), Escape::Inside);

        let mandel = view(100, 100, center, FractalFormula::Mandelbrot);
        assert!(matches!(mandel.escape_at(50, 50), Escape::Outside { .. }));
    }

    #[test]
    fn test_shade_is_opaque() {
        let v = view(
            64,
            64,
            ComplexParameter::default(),
            FractalFormula::Mandelbrot,
        );
        for &(px, py) in &[(0, 0), (32, 32), (63, 63)] {
            assert_eq!(v.shade(px, py)[3], 255);
        }
    }
}
