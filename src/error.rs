//! Ошибки пайплайна предсказания

use thiserror::Error;

/// Ошибки операций пайплайна.
///
/// Каждый вид ошибки отдаётся вызывающему коду как есть: ничего не
/// подменяется значением по умолчанию и ничего не повторяется.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Во входной записи нет колонки из схемы или входов для производного признака
    #[error("schema error: {0}")]
    Schema(String),

    /// Операция вызвана до `fit`
    #[error("not fitted: {0}")]
    NotFitted(String),

    /// Значение пустое, нечисловое или вне допустимого домена
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Сохранённый пайплайн нельзя восстановить
    #[error("artifact error: {0}")]
    Artifact(String),

    /// Регрессор не смог обучиться или предсказать
    #[error("regressor error: {0}")]
    Regressor(String),
}

impl PipelineError {
    pub fn missing_column(column: &str) -> Self {
        Self::Schema(format!("missing required column '{column}'"))
    }

    /// Короткое имя вида ошибки для логов и ответов API
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::NotFitted(_) => "not_fitted",
            Self::InvalidInput(_) => "invalid_input",
            Self::Artifact(_) => "artifact",
            Self::Regressor(_) => "regressor",
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Ошибки чтения обучающего датасета
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed dataset row: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is empty")]
    Empty,

    #[error("invalid holdout fraction {0}, expected a value in (0, 1)")]
    InvalidHoldout(f64),
}
