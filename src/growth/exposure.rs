//! Light exposure analysis
//!
//! Every segment casts a 2D footprint (ground-plane projection, ignoring Y)
//! that shadows points below its top. The test is all-pairs against every
//! occluder, which stays affordable because the interpreter hard-caps the
//! segment count.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::turtle::{Bounds, Skeleton};

/// Exposure assigned to a shadowed point.
pub const SHADED: f32 = 0.15;
/// Exposure assigned to an unobstructed point.
pub const FULL_SUN: f32 = 1.0;

/// Vertical slack before a branch counts as "above" a point.
const HEIGHT_EPSILON: f32 = 0.02;
/// Shadow reach as a multiple of the branch radius.
const SHADOW_REACH: f32 = 1.2;

/// A segment's shadow footprint on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occluder {
    pub ax: f32,
    pub az: f32,
    pub bx: f32,
    pub bz: f32,
    pub max_y: f32,
    pub radius: f32,
}

/// Clamped-projection distance from a point to a 2D segment.
fn distance_to_segment_2d(px: f32, pz: f32, occ: &Occluder) -> f32 {
    let abx = occ.bx - occ.ax;
    let abz = occ.bz - occ.az;
    let apx = px - occ.ax;
    let apz = pz - occ.az;
    let denom = abx * abx + abz * abz;
    let t = if denom == 0.0 {
        0.0
    } else {
        ((apx * abx + apz * abz) / denom).clamp(0.0, 1.0)
    };
    let dx = px - (occ.ax + abx * t);
    let dz = pz - (occ.az + abz * t);
    (dx * dx + dz * dz).sqrt()
}

/// Exposure of one point against every occluder.
fn exposure_at(point: Vec3, occluders: &[Occluder]) -> f32 {
    for occ in occluders {
        if occ.max_y <= point.y + HEIGHT_EPSILON {
            continue;
        }
        if distance_to_segment_2d(point.x, point.z, occ) < occ.radius * SHADOW_REACH {
            return SHADED;
        }
    }
    FULL_SUN
}

/// Derived structure statistics - the hand-off to the progression layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthStats {
    pub leaf_count: usize,
    pub segment_count: usize,
    pub sentence_length: usize,
    pub avg_exposure: f32,
    pub total_volume: f32,
    pub root_depth: f32,
    pub max_height: f32,
    pub suggested_angle: f32,
    pub center: Vec3,
}

/// Fill in per-leaf and per-segment exposure, then derive stats.
///
/// Segments are tested at their end point (the growing tip). An upward
/// segment does not shade itself, but a downward one can: its own start sits
/// above its end.
pub fn analyze(skeleton: &mut Skeleton, sentence_length: usize) -> GrowthStats {
    let occluders: Vec<Occluder> = skeleton
        .segments
        .iter()
        .map(|s| Occluder {
            ax: s.start.x,
            az: s.start.z,
            bx: s.end.x,
            bz: s.end.z,
            max_y: s.start.y.max(s.end.y),
            radius: s.radius,
        })
        .collect();

    let mut exposure_sum = 0.0;
    for leaf in &mut skeleton.leaves {
        leaf.exposure = exposure_at(leaf.position, &occluders);
        exposure_sum += leaf.exposure;
    }

    for segment in &mut skeleton.segments {
        segment.exposure = exposure_at(segment.end, &occluders);
    }

    stats_for(skeleton, exposure_sum, sentence_length)
}

fn stats_for(skeleton: &Skeleton, leaf_exposure_sum: f32, sentence_length: usize) -> GrowthStats {
    let leaf_count = skeleton.leaves.len();
    let avg_exposure = if leaf_count > 0 {
        leaf_exposure_sum / leaf_count as f32
    } else {
        FULL_SUN
    };

    let total_volume = skeleton
        .segments
        .iter()
        .map(|s| std::f32::consts::PI * s.radius * s.radius * s.length)
        .sum();

    let Bounds { min, max, center } = skeleton.bounds;

    GrowthStats {
        leaf_count,
        segment_count: skeleton.segments.len(),
        sentence_length,
        avg_exposure,
        total_volume,
        root_depth: min.y.abs().max(0.5),
        max_height: max.y,
        suggested_angle: (20.0 + (1.0 - avg_exposure) * 55.0).clamp(10.0, 85.0),
        center,
    }
}
