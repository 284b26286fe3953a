//! Метрики регрессии и классификации

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::GradeClass;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;

        let n = y_true.len() as f64;
        let mae = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n;
        let ss_res = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>();
        let mse = ss_res / n;

        let mean = y_true.iter().sum::<f64>() / n;
        let ss_tot = y_true.iter().map(|t| (t - mean).powi(2)).sum::<f64>();

        // Постоянная цель: 1.0 при точном совпадении, иначе 0.0
        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        Ok(Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            r2,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub grade: GradeClass,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Отчёт по классам A..F, всегда пять строк
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
}

impl ClassificationReport {
    pub fn compute(y_true: &[GradeClass], y_pred: &[GradeClass]) -> Result<Self> {
        check_lengths(y_true.len(), y_pred.len())?;

        let total = y_true.len();
        let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();

        let classes: Vec<ClassMetrics> = GradeClass::ALL
            .iter()
            .map(|&grade| {
                let tp = y_true
                    .iter()
                    .zip(y_pred)
                    .filter(|(t, p)| **t == grade && **p == grade)
                    .count();
                let predicted = y_pred.iter().filter(|&&p| p == grade).count();
                let support = y_true.iter().filter(|&&t| t == grade).count();

                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };

                ClassMetrics {
                    grade,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let k = classes.len() as f64;
        let macro_avg = AveragedMetrics {
            precision: classes.iter().map(|c| c.precision).sum::<f64>() / k,
            recall: classes.iter().map(|c| c.recall).sum::<f64>() / k,
            f1: classes.iter().map(|c| c.f1).sum::<f64>() / k,
            support: total,
        };

        let weighted = |metric: fn(&ClassMetrics) -> f64| {
            classes
                .iter()
                .map(|c| metric(c) * c.support as f64)
                .sum::<f64>()
                / total as f64
        };
        let weighted_avg = AveragedMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            support: total,
        };

        Ok(Self {
            accuracy: ratio(correct, total),
            classes,
            macro_avg,
            weighted_avg,
        })
    }

    pub fn class(&self, grade: GradeClass) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.grade == grade)
    }
}

/// Полный отчёт пайплайна: регрессия + классификация
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub regression: RegressionMetrics,
    pub classification: ClassificationReport,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.regression;
        writeln!(f, "Regression metrics:")?;
        writeln!(f, "\tMAE: {:.4}", r.mae)?;
        writeln!(f, "\tMSE: {:.4}", r.mse)?;
        writeln!(f, "\tRMSE: {:.4}", r.rmse)?;
        writeln!(f, "\tR²: {:.4}", r.r2)?;

        let c = &self.classification;
        writeln!(f, "Classification metrics:")?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for class in &c.classes {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                class.grade.label(),
                class.precision,
                class.recall,
                class.f1,
                class.support
            )?;
        }
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", c.accuracy, c.macro_avg.support
        )?;
        for (name, avg) in [("macro avg", &c.macro_avg), ("weighted avg", &c.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, avg.support
            )?;
        }
        Ok(())
    }
}

/// Доля верно предсказанных классов, всегда в [0, 1]
pub fn accuracy(y_true: &[GradeClass], y_pred: &[GradeClass]) -> Result<f64> {
    check_lengths(y_true.len(), y_pred.len())?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(ratio(correct, y_true.len()))
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn check_lengths(truth: usize, predicted: usize) -> Result<()> {
    if truth == 0 {
        return Err(PipelineError::InvalidInput(
            "cannot compute metrics on an empty batch".to_string(),
        ));
    }
    if truth != predicted {
        return Err(PipelineError::InvalidInput(format!(
            "{truth} true values for {predicted} predictions"
        )));
    }
    Ok(())
}
