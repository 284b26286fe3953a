//! Обычная линейная регрессия (МНК) через linfa

#![allow(non_snake_case)]

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::regressor::Regressor;

/// Линейная регрессия без регуляризации.
///
/// Требует матрицу признаков полного ранга; для пайплайна с производными
/// признаками обычно лучше подходит [`RidgeRegressor`](crate::models::RidgeRegressor).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearRegressor {
    coefficients: Option<Vec<f64>>,
    intercept: Option<f64>,
}

impl LinearRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    pub fn intercept(&self) -> Option<f64> {
        self.intercept
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if X.nrows() == 0 || X.ncols() == 0 {
            return Err(PipelineError::Regressor("empty dataset".to_string()));
        }
        if y.len() != X.nrows() {
            return Err(PipelineError::Regressor(format!(
                "{} targets for {} samples",
                y.len(),
                X.nrows()
            )));
        }

        let dataset = Dataset::new(X.clone(), y.clone());
        let fitted = LinearRegression::new()
            .fit(&dataset)
            .map_err(|e| PipelineError::Regressor(format!("least squares failed: {e}")))?;

        let coefficients = fitted.params().to_vec();
        let intercept = fitted.intercept();
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PipelineError::Regressor(
                "least squares produced non-finite coefficients".to_string(),
            ));
        }

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        Ok(())
    }

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted("linear model not trained".to_string()))?;

        if X.ncols() != coefficients.len() {
            return Err(PipelineError::Regressor(format!(
                "model has {} coefficients, got {} features",
                coefficients.len(),
                X.ncols()
            )));
        }

        let intercept = self.intercept.unwrap_or(0.0);
        Ok(X.dot(&Array1::from(coefficients.clone())) + intercept)
    }

    fn name(&self) -> &str {
        "linear"
    }

    fn check_fitted(&self, n_features: usize) -> Result<()> {
        let (Some(coefficients), Some(intercept)) = (&self.coefficients, self.intercept) else {
            return Err(PipelineError::NotFitted("linear model not trained".to_string()));
        };
        if coefficients.len() != n_features {
            return Err(PipelineError::Regressor(format!(
                "model has {} coefficients, expected {n_features}",
                coefficients.len()
            )));
        }
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return Err(PipelineError::Regressor(
                "linear coefficients must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fits_simple_line() {
        let X = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];

        let mut model = LinearRegressor::new();
        model.fit(&X, &y).unwrap();

        assert!((model.coefficients().unwrap()[0] - 2.0).abs() < 1e-6);
        assert!((model.intercept().unwrap() - 1.0).abs() < 1e-6);

        let pred = model.predict(&array![[10.0]]).unwrap();
        assert!((pred[0] - 21.0).abs() < 1e-6);
    }

    #[test]
    fn test_predict_requires_fit() {
        let model = LinearRegressor::new();
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(PipelineError::NotFitted(_))
        ));
        assert!(matches!(model.check_fitted(1), Err(PipelineError::NotFitted(_))));
    }

    #[test]
    fn test_check_fitted_compares_feature_count() {
        let mut model = LinearRegressor::new();
        model
            .fit(&array![[0.0], [1.0], [2.0]], &array![1.0, 3.0, 5.0])
            .unwrap();
        assert!(model.check_fitted(1).is_ok());
        assert!(matches!(model.check_fitted(2), Err(PipelineError::Regressor(_))));
    }
}
