//! Контракт регрессора и встроенные реализации

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::linear::LinearRegressor;
use crate::models::ridge::RidgeRegressor;
use crate::models::tree::TreeRegressor;

/// Числовой предсказатель, который пайплайн получает извне.
///
/// `predict` возвращает ровно одно значение на строку `X`, в том же
/// порядке. Пайплайн никогда не смотрит на конкретный тип реализации.
pub trait Regressor {
    fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>>;

    fn name(&self) -> &str {
        "regressor"
    }

    /// Обучена ли модель под матрицу из `n_features` колонок.
    ///
    /// Нужна при восстановлении из артефакта, где состояние модели
    /// приходит извне.
    fn check_fitted(&self, _n_features: usize) -> Result<()> {
        Ok(())
    }
}

/// Встроенные регрессоры в одной сериализуемой обёртке.
///
/// Нужна, чтобы артефакт и API-сервер могли работать с любой из
/// реализаций без знания о том, какая была выбрана при обучении.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GpaRegressor {
    Ridge(RidgeRegressor),
    Linear(LinearRegressor),
    Tree(TreeRegressor),
}

impl GpaRegressor {
    fn inner(&self) -> &dyn Regressor {
        match self {
            GpaRegressor::Ridge(r) => r,
            GpaRegressor::Linear(r) => r,
            GpaRegressor::Tree(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            GpaRegressor::Ridge(r) => r,
            GpaRegressor::Linear(r) => r,
            GpaRegressor::Tree(r) => r,
        }
    }
}

impl Regressor for GpaRegressor {
    fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(X, y)
    }

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(X)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn check_fitted(&self, n_features: usize) -> Result<()> {
        self.inner().check_fitted(n_features)
    }
}

impl From<RidgeRegressor> for GpaRegressor {
    fn from(r: RidgeRegressor) -> Self {
        GpaRegressor::Ridge(r)
    }
}

impl From<LinearRegressor> for GpaRegressor {
    fn from(r: LinearRegressor) -> Self {
        GpaRegressor::Linear(r)
    }
}

impl From<TreeRegressor> for GpaRegressor {
    fn from(r: TreeRegressor) -> Self {
        GpaRegressor::Tree(r)
    }
}
