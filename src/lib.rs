//! Grade Predictor - предсказание GPA и буквенной оценки студента

pub mod analytics;
pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod service;
pub mod types;

pub use error::{PipelineError, Result};
pub use models::*;
pub use preprocessing::*;
pub use types::*;

// Re-export для удобства
pub use artifact::{ArtifactError, PipelineArtifact};
pub use config::ServiceConfig;
pub use dataset::{load_training_set, TrainingSet};
