// src/survey/mod.rs
pub mod merge;
pub mod models;
pub mod normalize;

pub use merge::SurveyCollection;
pub use models::CompositeResponse;
pub use normalize::{normalize, NormalizedTable};
