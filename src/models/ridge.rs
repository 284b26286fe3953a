//! Ridge Regression на нормальных уравнениях

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::regressor::Regressor;

/// Линейная модель с L2-регуляризацией.
///
/// Данные центрируются, свободный член не штрафуется. При `alpha > 0`
/// система решается и для линейно зависимых признаков
/// (`TotalExtracurricular` = сумма четырёх флагов).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegressor {
    alpha: f64,
    weights: Option<Vec<f64>>,
    bias: Option<f64>,
}

impl RidgeRegressor {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            weights: None,
            bias: None,
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn bias(&self) -> Option<f64> {
        self.bias
    }
}

impl Default for RidgeRegressor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Regressor for RidgeRegressor {
    fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = X.nrows();
        let n_features = X.ncols();

        if n_samples == 0 || n_features == 0 {
            return Err(PipelineError::Regressor("empty dataset".to_string()));
        }
        if y.len() != n_samples {
            return Err(PipelineError::Regressor(format!(
                "{} targets for {} samples",
                y.len(),
                n_samples
            )));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(PipelineError::Regressor(format!(
                "alpha must be finite and non-negative, got {}",
                self.alpha
            )));
        }

        let x_mean = X
            .mean_axis(Axis(0))
            .ok_or_else(|| PipelineError::Regressor("failed to compute feature mean".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);

        let Xc = X - &x_mean;
        let yc = y - y_mean;

        // (Xc^T Xc + αI) w = Xc^T yc
        let mut xtx = Xc.t().dot(&Xc);
        for i in 0..n_features {
            xtx[[i, i]] += self.alpha;
        }
        let xty = Xc.t().dot(&yc);

        let weights = solve_linear_system(&xtx, &xty)?;
        let bias = y_mean - x_mean.dot(&weights);

        self.weights = Some(weights.to_vec());
        self.bias = Some(bias);

        Ok(())
    }

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        let weights = self
            .weights
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted("ridge model not trained".to_string()))?;
        let bias = self.bias.unwrap_or(0.0);

        if X.ncols() != weights.len() {
            return Err(PipelineError::Regressor(format!(
                "model has {} weights, got {} features",
                weights.len(),
                X.ncols()
            )));
        }

        Ok(X.dot(&Array1::from(weights.clone())) + bias)
    }

    fn name(&self) -> &str {
        "ridge"
    }

    fn check_fitted(&self, n_features: usize) -> Result<()> {
        let (Some(weights), Some(bias)) = (&self.weights, self.bias) else {
            return Err(PipelineError::NotFitted("ridge model not trained".to_string()));
        };
        if weights.len() != n_features {
            return Err(PipelineError::Regressor(format!(
                "model has {} weights, expected {n_features}",
                weights.len()
            )));
        }
        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(PipelineError::Regressor(
                "ridge weights must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Метод Гаусса с выбором главного элемента по столбцу
pub(crate) fn solve_linear_system(A: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = A.nrows();
    let mut augmented = Array2::<f64>::zeros((n, n + 1));
    augmented.slice_mut(ndarray::s![.., ..n]).assign(A);
    augmented.column_mut(n).assign(b);

    // Прямой ход
    for i in 0..n {
        let max_row = (i..n)
            .max_by(|&r1, &r2| {
                augmented[[r1, i]]
                    .abs()
                    .partial_cmp(&augmented[[r2, i]].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(i);

        if max_row != i {
            for j in 0..=n {
                augmented.swap([i, j], [max_row, j]);
            }
        }

        let pivot = augmented[[i, i]];
        if pivot.abs() < 1e-10 {
            return Err(PipelineError::Regressor("singular matrix".to_string()));
        }

        for k in (i + 1)..n {
            let factor = augmented[[k, i]] / pivot;
            for j in i..=n {
                augmented[[k, j]] -= factor * augmented[[i, j]];
            }
        }
    }

    // Обратный ход
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = augmented[[i, n]];
        for j in (i + 1)..n {
            sum -= augmented[[i, j]] * x[j];
        }
        x[i] = sum / augmented[[i, i]];
    }

    Ok(x)
}
