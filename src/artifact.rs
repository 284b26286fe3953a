//! Сохранение и загрузка обученного пайплайна

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::error::{PipelineError, Result};
use crate::models::{GradePredictionPipeline, Regressor};
use crate::preprocessing::{ScalerState, TrainingSchema};
use crate::types::columns;

/// Версия формата артефакта; загрузка других версий отклоняется
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to access artifact file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported artifact format version {found}, expected {expected}", expected = FORMAT_VERSION)]
    UnsupportedVersion { found: u32 },

    #[error("inconsistent artifact: {0}")]
    Inconsistent(String),
}

impl From<ArtifactError> for PipelineError {
    fn from(err: ArtifactError) -> Self {
        PipelineError::Artifact(err.to_string())
    }
}

/// JSON-представление обученного пайплайна
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact<R> {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub trained_with_preprocess: bool,
    pub schema: TrainingSchema,
    pub scaler: ScalerState,
    pub regressor: R,
}

impl<R> PipelineArtifact<R>
where
    R: Regressor + Serialize + DeserializeOwned,
{
    pub fn to_json(&self) -> std::result::Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> std::result::Result<(), ArtifactError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "Pipeline artifact saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ArtifactError> {
        let path = path.as_ref();
        let artifact = Self::from_json(&fs::read_to_string(path)?)?;
        tracing::info!(
            path = %path.display(),
            trained_at = %artifact.trained_at,
            "Pipeline artifact loaded"
        );
        Ok(artifact)
    }
}

impl<R: Regressor> PipelineArtifact<R> {
    /// Согласованность всех частей артефакта, включая обученный регрессор
    pub fn validate(&self) -> std::result::Result<(), ArtifactError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
            });
        }
        if self.schema.preprocess() != self.trained_with_preprocess {
            return Err(ArtifactError::Inconsistent(
                "schema preprocess flag disagrees with trained_with_preprocess".to_string(),
            ));
        }
        self.schema
            .validate()
            .map_err(|e| ArtifactError::Inconsistent(e.to_string()))?;
        self.scaler
            .validate()
            .map_err(|e| ArtifactError::Inconsistent(e.to_string()))?;
        if self.scaler.columns() != &columns::SCALED[..] {
            return Err(ArtifactError::Inconsistent(format!(
                "scaler columns {:?} do not match {:?}",
                self.scaler.columns(),
                columns::SCALED
            )));
        }
        self.regressor
            .check_fitted(self.schema.feature_columns().len())
            .map_err(|e| ArtifactError::Inconsistent(e.to_string()))?;
        Ok(())
    }
}

impl<R: Regressor + Clone> GradePredictionPipeline<R> {
    /// Снимок обученного пайплайна
    pub fn to_artifact(&self) -> Result<PipelineArtifact<R>> {
        let state = self.fitted_state()?;
        Ok(PipelineArtifact {
            format_version: FORMAT_VERSION,
            trained_at: Utc::now(),
            trained_with_preprocess: state.schema.preprocess(),
            schema: state.schema.clone(),
            scaler: state.scaler.clone(),
            regressor: self.regressor().clone(),
        })
    }

    /// Восстановление пайплайна в состоянии Fitted.
    ///
    /// Несогласованный артефакт отклоняется сразу, а не на первом `predict`.
    pub fn from_artifact(artifact: PipelineArtifact<R>) -> Result<Self> {
        artifact.validate()?;
        Ok(GradePredictionPipeline::from_parts(
            artifact.regressor,
            artifact.schema,
            artifact.scaler,
        ))
    }
}
