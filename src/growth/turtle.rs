//! 3D turtle interpretation of a rewritten sentence
//!
//! A left-to-right scan drives a cursor with position + orientation and an
//! explicit branch stack. Orientation is tracked purely by quaternion
//! composition; no Euler accumulation, no gimbal lock, and the stack is a
//! growable `Vec` so sentence length never touches the call stack.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_MAX_SEGMENTS;

/// Geometric knobs for one interpretation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurtleConfig {
    /// Turn/pitch/roll angle per symbol, degrees
    pub angle_degrees: f32,
    /// Forward step length per `F`
    pub step: f32,
    /// Trunk radius; branches taper from it with nesting depth
    pub width: f32,
    /// Honor `&`/`^` pitch symbols
    pub enable_pitch: bool,
    /// Honor `/`/`\` roll symbols
    pub enable_roll: bool,
    /// Hard cap on emitted segments (interpretation stops outright)
    pub max_segments: usize,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            angle_degrees: 25.0,
            step: 1.0,
            width: 0.1,
            enable_pitch: true,
            enable_roll: true,
            max_segments: DEFAULT_MAX_SEGMENTS,
        }
    }
}

/// One branch segment, ready for instanced rendering.
///
/// `mid` and `orientation` are derived from start/end for the renderer's
/// convenience; `depth` only drives radius tapering and color banding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
    pub mid: Vec3,
    pub orientation: Quat,
    pub radius: f32,
    pub length: f32,
    pub depth: u32,
    pub exposure: f32,
}

/// A foliage point emitted at branch tips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    pub position: Vec3,
    pub exposure: f32,
    pub size: f32,
}

/// Axis-aligned extent of everything the turtle visited.
///
/// `center` is the midpoint of min/max (used to re-center the rendered
/// structure), not a centroid of mass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub center: Vec3,
}

impl Bounds {
    fn extend(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    fn finish(&mut self) {
        self.center = (self.min + self.max) * 0.5;
    }
}

/// Raw interpreter output, before the exposure pass fills in lighting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Skeleton {
    pub segments: Vec<Segment>,
    pub leaves: Vec<Leaf>,
    pub bounds: Bounds,
}

const UP: Vec3 = Vec3::Y;

/// Saved state for one open bracket.
struct BranchFrame {
    position: Vec3,
    orientation: Quat,
    depth: u32,
}

/// Walk the sentence and emit branch geometry.
///
/// Unbalanced `]` on an empty stack is a silent no-op: mutated rule strings
/// are expected input, not errors. A trailing unclosed branch still gets its
/// tip leaf after the scan.
pub fn interpret(sentence: &str, config: &TurtleConfig) -> Skeleton {
    let angle = config.angle_degrees.to_radians();
    let leaf_size = config.width * 3.2;

    let mut segments = Vec::new();
    let mut leaves = Vec::new();
    let mut bounds = Bounds::default();

    let mut position = Vec3::ZERO;
    let mut orientation = Quat::IDENTITY;
    let mut depth = 0u32;
    let mut moved = false;
    let mut stack: Vec<BranchFrame> = Vec::new();

    for symbol in sentence.chars() {
        match symbol {
            'F' => {
                let direction = (orientation * UP).normalize_or(UP);
                let end = position + direction * config.step;
                let radius = (config.width * 0.9_f32.powi(depth as i32)).max(0.01);
                let delta = end - position;

                segments.push(Segment {
                    start: position,
                    end,
                    mid: position + direction * (config.step * 0.5),
                    // A zero step leaves delta degenerate; fall back to the
                    // heading so the quaternion stays finite
                    orientation: Quat::from_rotation_arc(UP, delta.normalize_or(direction)),
                    radius,
                    length: delta.length(),
                    depth,
                    exposure: 1.0,
                });

                position = end;
                bounds.extend(position);
                moved = true;

                if segments.len() >= config.max_segments {
                    break;
                }
            }
            '+' => orientation *= Quat::from_axis_angle(Vec3::Z, angle),
            '-' => orientation *= Quat::from_axis_angle(Vec3::Z, -angle),
            '&' if config.enable_pitch => orientation *= Quat::from_axis_angle(Vec3::X, angle),
            '^' if config.enable_pitch => orientation *= Quat::from_axis_angle(Vec3::X, -angle),
            '/' if config.enable_roll => orientation *= Quat::from_axis_angle(Vec3::Y, angle),
            '\\' if config.enable_roll => orientation *= Quat::from_axis_angle(Vec3::Y, -angle),
            '[' => {
                stack.push(BranchFrame {
                    position,
                    orientation,
                    depth,
                });
                depth += 1;
                moved = false;
            }
            ']' => {
                if moved {
                    leaves.push(Leaf {
                        position,
                        exposure: 1.0,
                        size: leaf_size,
                    });
                }
                if let Some(frame) = stack.pop() {
                    position = frame.position;
                    orientation = frame.orientation;
                    depth = frame.depth;
                }
                moved = false;
            }
            // Unrecognized symbols pass through untouched
            _ => {}
        }
    }

    // The sentence ended mid-branch: the tip still gets a leaf
    if moved {
        leaves.push(Leaf {
            position,
            exposure: 1.0,
            size: leaf_size,
        });
    }

    bounds.finish();

    Skeleton {
        segments,
        leaves,
        bounds,
    }
}
