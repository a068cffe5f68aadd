//! # nerofea-plan
//!
//! Study-plan allocation for nerofea.
//!
//! Turns the practice-question catalog plus a time budget into a per-week
//! schedule: questions are scored by learning value per minute, greedily
//! accepted into the flat time budget, then spread across weeks with a
//! progressive difficulty ramp (easy-heavy early, hard-heavy late).

pub mod allocator;
pub mod weights;

pub use allocator::{
    generate_plan, LearningProgression, PlanRequest, PlanSummary, WeekPlan, STUDY_TIPS,
};
pub use weights::topic_weight;
