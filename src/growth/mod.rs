//! Plant growth subsystem
//!
//! Rewrite, interpret, analyze - one deterministic pass, recomputed wholesale
//! whenever any input changes. No incremental update exists on purpose: the
//! caller memoizes on the input tuple, and identical inputs always yield
//! identical geometry and exposure.

pub mod exposure;
pub mod rewrite;
pub mod turtle;

pub use exposure::{FULL_SUN, GrowthStats, SHADED, analyze};
pub use rewrite::{Rules, rewrite};
pub use turtle::{Bounds, Leaf, Segment, Skeleton, TurtleConfig, interpret};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_MAX_SEGMENTS, DEFAULT_MAX_SENTENCE};

/// Complete input tuple for one growth pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthConfig {
    pub axiom: String,
    pub rules: Rules,
    pub iterations: u32,
    pub angle_degrees: f32,
    pub step: f32,
    pub width: f32,
    pub enable_pitch: bool,
    pub enable_roll: bool,
    pub max_segments: usize,
    pub max_sentence_length: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            axiom: "X".to_owned(),
            rules: Rules::from_iter([('X', "F[+X][-X]"), ('F', "F")]),
            iterations: 4,
            angle_degrees: 25.0,
            step: 1.0,
            width: 0.1,
            enable_pitch: true,
            enable_roll: true,
            max_segments: DEFAULT_MAX_SEGMENTS,
            max_sentence_length: DEFAULT_MAX_SENTENCE,
        }
    }
}

impl GrowthConfig {
    fn turtle(&self) -> TurtleConfig {
        TurtleConfig {
            angle_degrees: self.angle_degrees,
            step: self.step,
            width: self.width,
            enable_pitch: self.enable_pitch,
            enable_roll: self.enable_roll,
            max_segments: self.max_segments,
        }
    }
}

/// Fully analyzed growth geometry, ready for the instancing renderer and the
/// progression layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthResult {
    pub sentence: String,
    pub skeleton: Skeleton,
    pub stats: GrowthStats,
}

/// Run the whole pipeline: rewrite the axiom, walk the turtle, light the
/// canopy.
pub fn generate(config: &GrowthConfig) -> GrowthResult {
    let sentence = rewrite(
        &config.axiom,
        &config.rules,
        config.iterations,
        config.max_sentence_length,
    );
    let mut skeleton = interpret(&sentence, &config.turtle());
    let stats = analyze(&mut skeleton, sentence.len());

    log::debug!(
        "grew {} segments, {} leaves (sentence {} chars, avg exposure {:.2})",
        stats.segment_count,
        stats.leaf_count,
        stats.sentence_length,
        stats.avg_exposure,
    );

    GrowthResult {
        sentence,
        skeleton,
        stats,
    }
}
