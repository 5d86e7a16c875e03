//! Shared smooth-coloring palette
//!
//! One implementation of HSL conversion and escape coloring, used verbatim by
//! the CPU tile loop. The WGSL fragment shader mirrors these formulas; any
//! change here must be ported there (the uniforms themselves come from
//! [`crate::fractal::params`], so only the per-pixel math is duplicated).

use super::params::RenderParams;

/// Outcome of iterating one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Escape {
    /// Escaped after `iter` whole iterations with a fractional smoothed count.
    Outside { iter: u32, smooth: f64 },
    /// Never exceeded the bailout within the iteration budget.
    Inside,
}

/// Continuous iteration count at the escape boundary.
///
/// `zn` is the final modulus `|z|`; after a `|z|^2 > 4` escape it is always
/// above 2, but the log term is still guarded against non-positive input.
pub fn smooth_iteration(iter: u32, zn: f64) -> f64 {
    let iter = f64::from(iter);
    if zn > 0.0 {
        let inner = zn.ln();
        if inner > 0.0 {
            return iter + 1.0 - inner.ln() / std::f64::consts::LN_2;
        }
    }
    iter
}

/// Standard piecewise HSL to RGB conversion.
///
/// `h` in degrees (any value, wrapped), `s` and `l` in `[0, 1]`.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    let h = ((h % 360.0) + 360.0) % 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return [v, v, v];
    }

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h / 60.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());

    let (r, g, b) = match hp {
        hp if hp < 1.0 => (c, x, 0.0),
        hp if hp < 2.0 => (x, c, 0.0),
        hp if hp < 3.0 => (0.0, c, x),
        hp if hp < 4.0 => (0.0, x, c),
        hp if hp < 5.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let m = l - c / 2.0;
    [
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    ]
}

/// Map an escape result to an RGBA color under the given palette parameters.
///
/// Escaped pixels get a hue rotated by `t^0.6` through the full wheel and a
/// lightness ramp; interior pixels get a fixed near-black at the base hue.
pub fn escape_color(escape: Escape, params: &RenderParams) -> [u8; 4] {
    let [r, g, b] = match escape {
        Escape::Outside { smooth, .. } => {
            let t = (smooth / f64::from(params.max_iterations)).clamp(0.0, 1.0);
            let hue = (params.palette_shift + 360.0 * t.powf(0.6)) % 360.0;
            let lightness = (0.40 + t * 0.50).clamp(0.10, 0.95);
            hsl_to_rgb(hue, params.saturation, lightness)
        }
        Escape::Inside => hsl_to_rgb(params.palette_shift, params.saturation, 0.05),
    };
    [r, g, b, 255]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_iterations: u32) -> RenderParams {
        RenderParams {
            max_iterations,
            zoom: 1.0,
            palette_shift: 0.0,
            saturation: 0.7,
        }
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), [255, 0, 0]);
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), [0, 255, 0]);
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), [0, 0, 255]);
    }

    #[test]
    fn test_hsl_grayscale_when_desaturated() {
        assert_eq!(hsl_to_rgb(123.0, 0.0, 0.5), [128, 128, 128]);
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), [255, 255, 255]);
    }

    #[test]
    fn test_hsl_hue_wraps() {
        assert_eq!(hsl_to_rgb(360.0, 1.0, 0.5), hsl_to_rgb(0.0, 1.0, 0.5));
        assert_eq!(hsl_to_rgb(-120.0, 1.0, 0.5), hsl_to_rgb(240.0, 1.0, 0.5));
    }

    #[test]
    fn test_smooth_iteration_between_whole_counts() {
        // Escape at |z| = 3: fractional part lands between iter and iter + 1
        let s = smooth_iteration(10, 3.0);
        assert!(s > 9.0 && s < 11.0);
    }

    #[test]
    fn test_smooth_iteration_guards_log() {
        assert_eq!(smooth_iteration(5, 0.0), 5.0);
        assert_eq!(smooth_iteration(5, 1.0), 5.0);
        assert_eq!(smooth_iteration(5, -1.0), 5.0);
    }

    #[test]
    fn test_interior_is_near_black() {
        let [r, g, b, a] = escape_color(Escape::Inside, &params(40));
        assert_eq!(a, 255);
        assert!(r < 30 && g < 30 && b < 30);
    }

    #[test]
    fn test_escaped_is_opaque_and_lit() {
        let color = escape_color(
            Escape::Outside {
                iter: 20,
                smooth: 20.5,
            },
            &params(40),
        );
        assert_eq!(color[3], 255);
        assert!(color[..3].iter().any(|&c| c > 30));
    }
}
