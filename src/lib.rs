//! League-aware recruitment scoring for right wing-backs: per-90
//! normalization, league-cohort z-scores, pillar composites, a
//! feasibility overlay and a weight-sensitivity check on the final ranking.

pub mod input;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
