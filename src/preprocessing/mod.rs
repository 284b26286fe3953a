/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;
pub mod schema;

pub use feature_engineering::FeatureEngineer;
pub use normalization::{ScalerState, StandardScaler};
pub use schema::TrainingSchema;
