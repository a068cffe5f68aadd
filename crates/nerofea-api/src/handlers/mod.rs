//! Handler modules for nerofea-api.

pub mod assistant;
pub mod attachments;
pub mod study_plans;
