//! Пайплайн предсказания GPA и буквенной оценки

#![allow(non_snake_case)]

use std::borrow::Cow;

use ndarray::{Array1, Array2};

use crate::error::{PipelineError, Result};
use crate::models::grading::GradeClassifier;
use crate::models::metrics::{self, ClassificationReport, PipelineReport, RegressionMetrics};
use crate::models::regressor::Regressor;
use crate::preprocessing::{FeatureEngineer, ScalerState, StandardScaler, TrainingSchema};
use crate::types::{columns, GradeClass, Prediction, StudentRecord};

/// Всё, что появляется после успешного `fit`
#[derive(Debug, Clone)]
pub(crate) struct FittedState {
    pub(crate) schema: TrainingSchema,
    pub(crate) scaler: ScalerState,
}

/// Регрессор + скейлер + производные признаки + пороги оценок.
///
/// Жизненный цикл: Unfitted -> Fitted. Обратного перехода нет, повторный
/// `fit` заменяет схему, скейлер и регрессор целиком.
///
/// Флаг `preprocess` в `fit`/`predict`/`score`/`report`:
/// - `true`: на вход подаются сырые записи; пайплайн проверяет домены,
///   стандартизирует `StudyTimeWeekly`/`Absences` и считает производные
///   признаки сам;
/// - `false`: записи уже подготовлены вызывающим кодом (включая
///   производные признаки) и передаются регрессору как есть.
#[derive(Debug, Clone)]
pub struct GradePredictionPipeline<R> {
    regressor: R,
    supplied_scaler: Option<ScalerState>,
    fitted: Option<FittedState>,
}

impl<R: Regressor> GradePredictionPipeline<R> {
    pub fn new(regressor: R) -> Self {
        Self {
            regressor,
            supplied_scaler: None,
            fitted: None,
        }
    }

    /// Пайплайн с заранее подготовленным скейлером: `fit` не будет его переобучать
    pub fn with_scaler(regressor: R, scaler: ScalerState) -> Self {
        Self {
            regressor,
            supplied_scaler: Some(scaler),
            fitted: None,
        }
    }

    pub(crate) fn from_parts(regressor: R, schema: TrainingSchema, scaler: ScalerState) -> Self {
        Self {
            regressor,
            supplied_scaler: None,
            fitted: Some(FittedState { schema, scaler }),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn schema(&self) -> Option<&TrainingSchema> {
        self.fitted.as_ref().map(|s| &s.schema)
    }

    pub fn scaler_state(&self) -> Option<&ScalerState> {
        self.fitted.as_ref().map(|s| &s.scaler)
    }

    pub fn regressor(&self) -> &R {
        &self.regressor
    }

    /// Обучение на записях и непрерывном GPA.
    ///
    /// Схема, скейлер и регрессор фиксируются только при успехе; при
    /// ошибке предыдущее состояние остаётся нетронутым.
    pub fn fit(
        &mut self,
        records: &[StudentRecord],
        targets: &[f64],
        preprocess: bool,
    ) -> Result<&mut Self>
    where
        R: Clone,
    {
        let first = records.first().ok_or_else(|| {
            PipelineError::InvalidInput("cannot fit on an empty training set".to_string())
        })?;
        if records.len() != targets.len() {
            return Err(PipelineError::InvalidInput(format!(
                "{} training records for {} targets",
                records.len(),
                targets.len()
            )));
        }
        if let Some(t) = targets.iter().find(|t| !t.is_finite()) {
            return Err(PipelineError::InvalidInput(format!("non-finite target {t}")));
        }

        let schema = TrainingSchema::capture(first, preprocess);
        schema.validate()?;
        for record in records {
            schema.ensure_covered(record)?;
        }

        let scaler = match &self.supplied_scaler {
            Some(state) => state.clone(),
            None => {
                let names = columns::SCALED.iter().map(|c| c.to_string()).collect();
                StandardScaler::fit_state(names, &scaled_columns(records)?)?
            }
        };

        let state = FittedState { schema, scaler };
        let X = build_features(&state, records, preprocess)?;
        let y = Array1::from(targets.to_vec());

        let mut regressor = self.regressor.clone();
        regressor.fit(&X, &y)?;

        tracing::info!(
            samples = X.nrows(),
            features = X.ncols(),
            preprocess,
            regressor = regressor.name(),
            "Grade pipeline fitted"
        );

        self.regressor = regressor;
        self.fitted = Some(state);
        Ok(self)
    }

    /// GPA и класс для каждой записи, в исходном порядке
    pub fn predict(&self, records: &[StudentRecord], preprocess: bool) -> Result<Vec<Prediction>> {
        let gpa = self.predict_gpa(records, preprocess)?;

        Ok(gpa
            .into_iter()
            .map(|gpa| Prediction {
                gpa,
                grade_class: GradeClassifier::classify(gpa),
            })
            .collect())
    }

    /// Доля записей, у которых предсказанный класс совпал с истинным
    pub fn score(
        &self,
        records: &[StudentRecord],
        truth: &[GradeClass],
        preprocess: bool,
    ) -> Result<f64> {
        check_batch(records.len(), truth.len())?;

        let predicted: Vec<GradeClass> = self
            .predict(records, preprocess)?
            .iter()
            .map(|p| p.grade_class)
            .collect();

        metrics::accuracy(truth, &predicted)
    }

    /// Метрики регрессии по GPA и классификации по классам A..F
    pub fn report(
        &self,
        records: &[StudentRecord],
        truth_gpa: &[f64],
        preprocess: bool,
    ) -> Result<PipelineReport> {
        check_batch(records.len(), truth_gpa.len())?;

        let predictions = self.predict(records, preprocess)?;
        let predicted_gpa: Vec<f64> = predictions.iter().map(|p| p.gpa).collect();
        let predicted_class: Vec<GradeClass> = predictions.iter().map(|p| p.grade_class).collect();
        let true_class = GradeClassifier::classify_all(truth_gpa);

        Ok(PipelineReport {
            regression: RegressionMetrics::compute(truth_gpa, &predicted_gpa)?,
            classification: ClassificationReport::compute(&true_class, &predicted_class)?,
        })
    }

    fn predict_gpa(&self, records: &[StudentRecord], preprocess: bool) -> Result<Vec<f64>> {
        let state = self.fitted_state()?;

        if records.is_empty() {
            return Ok(Vec::new());
        }

        if preprocess != state.schema.preprocess() {
            tracing::debug!(
                fitted_with = state.schema.preprocess(),
                requested = preprocess,
                "Predicting with a different preprocess flag than fit"
            );
        }

        let X = build_features(state, records, preprocess)?;
        let gpa = self.regressor.predict(&X)?;

        if gpa.len() != records.len() {
            return Err(PipelineError::Regressor(format!(
                "regressor returned {} scores for {} records",
                gpa.len(),
                records.len()
            )));
        }

        tracing::debug!(records = records.len(), "Predicted GPA batch");
        Ok(gpa.to_vec())
    }

    pub(crate) fn fitted_state(&self) -> Result<&FittedState> {
        self.fitted.as_ref().ok_or_else(|| {
            PipelineError::NotFitted("pipeline must be fitted before use".to_string())
        })
    }
}

fn check_batch(records: usize, truth: usize) -> Result<()> {
    if records != truth {
        return Err(PipelineError::InvalidInput(format!(
            "{records} records for {truth} true values"
        )));
    }
    Ok(())
}

/// Колонки `StudyTimeWeekly`, `Absences` из записей
fn scaled_columns(records: &[StudentRecord]) -> Result<Array2<f64>> {
    let mut X = Array2::zeros((records.len(), columns::SCALED.len()));
    for (i, record) in records.iter().enumerate() {
        for (j, column) in columns::SCALED.iter().enumerate() {
            let value = record.require(column)?;
            if !value.is_finite() {
                return Err(PipelineError::InvalidInput(format!(
                    "column '{column}' has non-finite value {value}"
                )));
            }
            X[[i, j]] = value;
        }
    }
    Ok(X)
}

/// Матрица признаков в порядке `TrainingSchema::feature_columns`
fn build_features(
    state: &FittedState,
    records: &[StudentRecord],
    preprocess: bool,
) -> Result<Array2<f64>> {
    let feature_columns = state.schema.feature_columns();
    let mut X = Array2::zeros((records.len(), feature_columns.len()));

    for (i, record) in records.iter().enumerate() {
        state.schema.ensure_covered(record)?;

        let record: Cow<'_, StudentRecord> = if preprocess {
            record.validate_raw()?;
            Cow::Owned(FeatureEngineer::derive(record)?)
        } else {
            record.ensure_finite()?;
            Cow::Borrowed(record)
        };

        for (j, column) in feature_columns.iter().enumerate() {
            X[[i, j]] = record.require(column)?;
        }
    }

    if preprocess {
        let positions = scaled_positions(&feature_columns)?;

        let mut raw = Array2::zeros((records.len(), positions.len()));
        for (k, &j) in positions.iter().enumerate() {
            raw.column_mut(k).assign(&X.column(j));
        }

        let scaled = StandardScaler::transform_with(&state.scaler, &raw)?;
        for (k, &j) in positions.iter().enumerate() {
            X.column_mut(j).assign(&scaled.column(k));
        }
    }

    Ok(X)
}

fn scaled_positions(feature_columns: &[&str]) -> Result<Vec<usize>> {
    columns::SCALED
        .iter()
        .map(|name| {
            feature_columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| PipelineError::missing_column(name))
        })
        .collect()
}
