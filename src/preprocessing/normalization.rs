//! Стандартизация числовых признаков

#![allow(non_snake_case)]

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::columns;

/// Статистики скейлера, снятые на обучающей выборке.
///
/// После `fit` не меняются.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    columns: Vec<String>,
    mean: Vec<f64>,
    std: Vec<f64>,
}

impl ScalerState {
    /// Состояние из готовых статистик (например, посчитанных заранее)
    pub fn new(columns: Vec<String>, mean: Vec<f64>, std: Vec<f64>) -> Result<Self> {
        let state = Self { columns, mean, std };
        state.validate()?;
        Ok(state)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn std(&self) -> &[f64] {
        &self.std
    }

    /// Согласованность размеров и статистик
    pub fn validate(&self) -> Result<()> {
        let n = self.columns.len();
        if n == 0 || self.mean.len() != n || self.std.len() != n {
            return Err(PipelineError::InvalidInput(format!(
                "scaler state has {} columns, {} means and {} deviations",
                n,
                self.mean.len(),
                self.std.len()
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(PipelineError::InvalidInput(
                "scaler mean must be finite".to_string(),
            ));
        }
        if self.std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(PipelineError::InvalidInput(
                "scaler deviations must be finite and positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Z-score скейлер: (x - mean) / std
#[derive(Debug, Clone, Default)]
pub struct StandardScaler {
    state: Option<ScalerState>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self { state: None }
    }

    pub fn state(&self) -> Option<&ScalerState> {
        self.state.as_ref()
    }

    /// Статистики для колонок `StudyTimeWeekly`, `Absences`
    pub fn fit(&mut self, X: &Array2<f64>) -> Result<&ScalerState> {
        let names = columns::SCALED.iter().map(|c| c.to_string()).collect();
        let state = Self::fit_state(names, X)?;
        Ok(&*self.state.insert(state))
    }

    /// Подсчёт статистик по столбцам `X`, имена колонок задаёт вызывающий
    pub fn fit_state(names: Vec<String>, X: &Array2<f64>) -> Result<ScalerState> {
        if X.nrows() == 0 {
            return Err(PipelineError::InvalidInput(
                "cannot fit scaler on an empty dataset".to_string(),
            ));
        }
        if X.ncols() != names.len() {
            return Err(PipelineError::Schema(format!(
                "scaler expects {} columns, got {}",
                names.len(),
                X.ncols()
            )));
        }

        let mean = X
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::InvalidInput("failed to compute mean".to_string()))?;

        // Стандартное отклонение генеральной совокупности (ddof = 0)
        let std = X
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s < 1e-10 { 1.0 } else { s });

        ScalerState::new(names, mean.to_vec(), std.to_vec())
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted("scaler has not been fitted".to_string()))?;
        Self::transform_with(state, X)
    }

    /// Применение уже снятых статистик; состояние не меняется
    pub fn transform_with(state: &ScalerState, X: &Array2<f64>) -> Result<Array2<f64>> {
        if X.ncols() != state.columns.len() {
            return Err(PipelineError::Schema(format!(
                "scaler was fitted on {} columns, got {}",
                state.columns.len(),
                X.ncols()
            )));
        }

        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - state.mean[i]) / state.std[i];
            }
        }

        Ok(normalized)
    }

    pub fn fit_transform(&mut self, X: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(X)?;
        self.transform(X)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_uses_population_statistics() {
        let X = array![[1.0, 10.0], [3.0, 20.0], [5.0, 30.0]];
        let mut scaler = StandardScaler::new();
        let state = scaler.fit(&X).unwrap().clone();

        assert_eq!(state.columns(), &["StudyTimeWeekly", "Absences"]);
        assert_eq!(state.mean(), &[3.0, 20.0]);
        let expected = (8.0f64 / 3.0).sqrt();
        assert!((state.std()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transform_standardizes_with_fit_statistics_only() {
        let train = array![[0.0, 0.0], [2.0, 4.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&train).unwrap();
        assert_eq!(scaled, array![[-1.0, -1.0], [1.0, 1.0]]);

        let unseen = array![[4.0, 6.0]];
        assert_eq!(scaler.transform(&unseen).unwrap(), array![[3.0, 2.0]]);
        assert_eq!(scaler.state().unwrap().mean(), &[1.0, 2.0]);
    }

    #[test]
    fn test_constant_column_gets_unit_std() {
        let X = array![[5.0, 1.0], [5.0, 2.0]];
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&X).unwrap();
        assert_eq!(scaler.state().unwrap().std()[0], 1.0);
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_transform_before_fit_is_not_fitted() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&array![[1.0, 2.0]]),
            Err(PipelineError::NotFitted(_))
        ));
    }

    #[test]
    fn test_empty_and_misshaped_input() {
        let mut scaler = StandardScaler::new();
        assert!(scaler.fit(&Array2::zeros((0, 2))).is_err());
        assert!(matches!(
            scaler.fit(&Array2::zeros((3, 1))),
            Err(PipelineError::Schema(_))
        ));

        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0, 2.0, 3.0]]),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_state_rejects_non_positive_std() {
        let state = ScalerState::new(vec!["a".into()], vec![0.0], vec![0.0]);
        assert!(state.is_err());
        let state = ScalerState::new(vec!["a".into()], vec![0.0, 1.0], vec![1.0]);
        assert!(state.is_err());
    }
}
