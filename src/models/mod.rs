/// ML модели

pub mod grading;
pub mod linear;
pub mod metrics;
pub mod pipeline;
pub mod regressor;
pub mod ridge;
pub mod tree;

pub use grading::GradeClassifier;
pub use linear::LinearRegressor;
pub use metrics::{ClassificationReport, PipelineReport, RegressionMetrics};
pub use pipeline::GradePredictionPipeline;
pub use regressor::{GpaRegressor, Regressor};
pub use ridge::RidgeRegressor;
pub use tree::TreeRegressor;
