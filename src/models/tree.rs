//! Дерево решений для регрессии

#![allow(non_snake_case)]

use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::regressor::Regressor;

/// Сколько случайных порогов пробуется на каждый признак
const CANDIDATE_THRESHOLDS: usize = 10;

/// Регрессионное дерево со случайными порогами разбиения.
///
/// Генератор инициализируется `seed`, так что обучение на одних и тех же
/// данных даёт одно и то же дерево.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeRegressor {
    max_depth: usize,
    min_samples_split: usize,
    seed: u64,
    n_features: usize,
    root: Option<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeRegressor {
    pub fn new(max_depth: usize, min_samples_split: usize, seed: u64) -> Self {
        Self {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            seed,
            n_features: 0,
            root: None,
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map(walk).unwrap_or(0)
    }

    fn build_tree(
        &self,
        X: &Array2<f64>,
        y: &Array1<f64>,
        depth: usize,
        indices: Vec<usize>,
        rng: &mut StdRng,
    ) -> TreeNode {
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64;

        if depth >= self.max_depth || indices.len() < self.min_samples_split {
            return TreeNode::Leaf { value: mean };
        }

        let mut best: Option<(usize, f64, f64)> = None;

        for feature in 0..X.ncols() {
            let (min_val, max_val) = indices.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &i| (lo.min(X[[i, feature]]), hi.max(X[[i, feature]])),
            );

            if (max_val - min_val).abs() < 1e-10 {
                continue;
            }

            for _ in 0..CANDIDATE_THRESHOLDS {
                let threshold = rng.gen_range(min_val..=max_val);
                let Some(sse) = split_sse(X, y, &indices, feature, threshold) else {
                    continue;
                };

                if best.map_or(true, |(_, _, score)| sse < score) {
                    best = Some((feature, threshold, sse));
                }
            }
        }

        let Some((feature, threshold, _)) = best else {
            return TreeNode::Leaf { value: mean };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| X[[i, feature]] < threshold);

        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(self.build_tree(X, y, depth + 1, left, rng)),
            right: Box::new(self.build_tree(X, y, depth + 1, right, rng)),
        }
    }

    fn predict_single(node: &TreeNode, sample: ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] < *threshold {
                    Self::predict_single(left, sample)
                } else {
                    Self::predict_single(right, sample)
                }
            }
        }
    }
}

impl Default for TreeRegressor {
    fn default() -> Self {
        Self::new(10, 5, 42)
    }
}

/// Сумма квадратов отклонений в двух половинах; `None`, если одна из них пуста
fn split_sse(
    X: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
    feature: usize,
    threshold: f64,
) -> Option<f64> {
    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| X[[i, feature]] < threshold);

    if left.is_empty() || right.is_empty() {
        return None;
    }

    let sse = |part: &[usize]| {
        let mean = part.iter().map(|&i| y[i]).sum::<f64>() / part.len() as f64;
        part.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>()
    };

    Some(sse(&left) + sse(&right))
}

impl Regressor for TreeRegressor {
    fn fit(&mut self, X: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if X.nrows() == 0 {
            return Err(PipelineError::Regressor("empty dataset".to_string()));
        }
        if y.len() != X.nrows() {
            return Err(PipelineError::Regressor(format!(
                "{} targets for {} samples",
                y.len(),
                X.nrows()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let root = self.build_tree(X, y, 0, (0..X.nrows()).collect(), &mut rng);
        self.n_features = X.ncols();
        self.root = Some(root);
        Ok(())
    }

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted("tree model not trained".to_string()))?;

        if X.ncols() != self.n_features {
            return Err(PipelineError::Regressor(format!(
                "tree was trained on {} features, got {}",
                self.n_features,
                X.ncols()
            )));
        }

        Ok(X.rows()
            .into_iter()
            .map(|row| Self::predict_single(root, row))
            .collect())
    }

    fn name(&self) -> &str {
        "tree"
    }

    fn check_fitted(&self, n_features: usize) -> Result<()> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| PipelineError::NotFitted("tree model not trained".to_string()))?;

        if self.n_features != n_features {
            return Err(PipelineError::Regressor(format!(
                "tree was trained on {} features, expected {n_features}",
                self.n_features
            )));
        }
        check_node(root, n_features)
    }
}

/// Индексы признаков в пределах матрицы, пороги и листья конечны
fn check_node(node: &TreeNode, n_features: usize) -> Result<()> {
    match node {
        TreeNode::Leaf { value } if value.is_finite() => Ok(()),
        TreeNode::Leaf { value } => Err(PipelineError::Regressor(format!(
            "tree leaf has non-finite value {value}"
        ))),
        TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if *feature >= n_features || !threshold.is_finite() {
                return Err(PipelineError::Regressor(format!(
                    "tree split on feature {feature} at {threshold} is out of range"
                )));
            }
            check_node(left, n_features)?;
            check_node(right, n_features)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        let X = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y = X.column(0).mapv(|v| if v < 20.0 { 1.0 } else { 3.0 });
        (X, y)
    }

    #[test]
    fn test_learns_step_function() {
        let (X, y) = step_data();
        let mut tree = TreeRegressor::new(4, 2, 7);
        tree.fit(&X, &y).unwrap();

        let pred = tree.predict(&array![[2.0], [37.0]]).unwrap();
        assert!(pred[0] < 1.5, "low side predicted {}", pred[0]);
        assert!(pred[1] > 2.5, "high side predicted {}", pred[1]);
        assert!(tree.depth() <= 4);
    }

    #[test]
    fn test_same_seed_gives_same_tree() {
        let (X, y) = step_data();
        let mut a = TreeRegressor::new(6, 2, 11);
        let mut b = TreeRegressor::new(6, 2, 11);
        a.fit(&X, &y).unwrap();
        b.fit(&X, &y).unwrap();
        assert_eq!(a.predict(&X).unwrap(), b.predict(&X).unwrap());
    }

    #[test]
    fn test_constant_features_produce_single_leaf() {
        let X = array![[1.0], [1.0], [1.0]];
        let y = array![2.0, 3.0, 4.0];
        let mut tree = TreeRegressor::default();
        tree.fit(&X, &y).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&array![[5.0]]).unwrap()[0], 3.0);
    }

    #[test]
    fn test_predict_requires_fit() {
        assert!(matches!(
            TreeRegressor::default().predict(&array![[1.0]]),
            Err(PipelineError::NotFitted(_))
        ));
        assert!(matches!(
            TreeRegressor::default().check_fitted(1),
            Err(PipelineError::NotFitted(_))
        ));
    }

    #[test]
    fn test_check_fitted_walks_every_split() {
        let (X, y) = step_data();
        let mut tree = TreeRegressor::new(4, 2, 7);
        tree.fit(&X, &y).unwrap();
        assert!(tree.check_fitted(1).is_ok());
        assert!(matches!(tree.check_fitted(2), Err(PipelineError::Regressor(_))));

        // Сплит по несуществующему признаку
        tree.root = Some(TreeNode::Split {
            feature: 3,
            threshold: 0.5,
            left: Box::new(TreeNode::Leaf { value: 1.0 }),
            right: Box::new(TreeNode::Leaf { value: 2.0 }),
        });
        assert!(matches!(tree.check_fitted(1), Err(PipelineError::Regressor(_))));
    }
}
