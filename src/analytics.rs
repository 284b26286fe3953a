//! Сводка по предсказаниям: распределение оценок и группы студентов

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::models::GradeClassifier;
use crate::types::{GradeClass, Prediction};

/// Число студентов в одном классе оценки
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradeCount {
    pub grade: GradeClass,
    pub label: &'static str,
    pub count: usize,
    pub share: f64,
}

/// Распределение по всем пяти классам A..F (нулевые тоже включены)
pub fn grade_distribution(grades: &[GradeClass]) -> Vec<GradeCount> {
    let total = grades.len();

    GradeClass::ALL
        .iter()
        .map(|&grade| {
            let count = grades.iter().filter(|&&g| g == grade).count();
            GradeCount {
                grade,
                label: grade.label(),
                count,
                share: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64
                },
            }
        })
        .collect()
}

/// Группа студентов: индексы записей во входном батче
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    pub count: usize,
    pub students: Vec<usize>,
}

impl From<Vec<usize>> for Cohort {
    fn from(students: Vec<usize>) -> Self {
        Self {
            count: students.len(),
            students,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortSummary {
    pub total: usize,
    pub true_distribution: Vec<GradeCount>,
    pub predicted_distribution: Vec<GradeCount>,
    /// Истинный класс F
    pub failing: Cohort,
    /// Предсказанный GPA ниже 2.0
    pub at_risk: Cohort,
    /// Предсказанный класс хуже истинного, но GPA ещё не ниже 2.0
    pub watchlist: Cohort,
    /// Предсказанный GPA выше истинного
    pub predicted_improvement: Cohort,
}

/// Сводка по батчу предсказаний и истинным GPA тех же студентов
pub fn summarize(predictions: &[Prediction], true_gpa: &[f64]) -> Result<CohortSummary> {
    if predictions.is_empty() {
        return Err(PipelineError::InvalidInput(
            "cannot summarize an empty batch".to_string(),
        ));
    }
    if predictions.len() != true_gpa.len() {
        return Err(PipelineError::InvalidInput(format!(
            "{} predictions for {} true GPA values",
            predictions.len(),
            true_gpa.len()
        )));
    }
    if let Some(gpa) = true_gpa.iter().find(|g| !g.is_finite()) {
        return Err(PipelineError::InvalidInput(format!(
            "non-finite true GPA {gpa}"
        )));
    }

    let true_class = GradeClassifier::classify_all(true_gpa);
    let predicted_class: Vec<GradeClass> = predictions.iter().map(|p| p.grade_class).collect();

    let (mut failing, mut at_risk, mut watchlist, mut improvement) =
        (Vec::new(), Vec::new(), Vec::new(), Vec::new());

    for (i, ((p, &gpa), &truth)) in predictions.iter().zip(true_gpa).zip(&true_class).enumerate() {
        if truth == GradeClass::F {
            failing.push(i);
        }
        if p.gpa < 2.0 {
            at_risk.push(i);
        }
        // NaN не проходит ни одно сравнение и не попадает ни в одну из групп
        if p.gpa >= 2.0 && p.grade_class > truth {
            watchlist.push(i);
        }
        if p.gpa > gpa {
            improvement.push(i);
        }
    }

    let summary = CohortSummary {
        total: predictions.len(),
        true_distribution: grade_distribution(&true_class),
        predicted_distribution: grade_distribution(&predicted_class),
        failing: Cohort::from(failing),
        at_risk: Cohort::from(at_risk),
        watchlist: Cohort::from(watchlist),
        predicted_improvement: Cohort::from(improvement),
    };

    tracing::debug!(
        total = summary.total,
        failing = summary.failing.count,
        at_risk = summary.at_risk.count,
        watchlist = summary.watchlist.count,
        "Cohort summary computed"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(gpa: f64) -> Prediction {
        Prediction {
            gpa,
            grade_class: GradeClassifier::classify(gpa),
        }
    }

    #[test]
    fn test_cohorts() {
        let predictions = [
            prediction(1.5), // F, истинный F
            prediction(2.2), // D, истинный B -> watchlist
            prediction(3.8), // A, истинный C -> улучшение
            prediction(2.7), // C, истинный C
        ];
        let truth = [1.0, 3.1, 2.6, 2.9];

        let summary = summarize(&predictions, &truth).unwrap();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.failing.students, vec![0]);
        assert_eq!(summary.at_risk.students, vec![0]);
        assert_eq!(summary.watchlist.students, vec![1]);
        assert_eq!(summary.predicted_improvement.students, vec![0, 2]);
        assert_eq!(summary.predicted_improvement.count, 2);
    }

    #[test]
    fn test_worse_prediction_below_two_is_at_risk_not_watchlist() {
        let summary = summarize(&[prediction(1.9)], &[3.6]).unwrap();
        assert_eq!(summary.at_risk.count, 1);
        assert_eq!(summary.watchlist.count, 0);
        assert_eq!(summary.failing.count, 0);
    }

    #[test]
    fn test_nan_prediction_is_not_on_watchlist() {
        let summary = summarize(&[prediction(f64::NAN)], &[3.6]).unwrap();
        assert_eq!(summary.predicted_distribution[4].count, 1);
        assert_eq!(summary.watchlist.count, 0);
        assert_eq!(summary.at_risk.count, 0);
        assert_eq!(summary.predicted_improvement.count, 0);
    }

    #[test]
    fn test_distributions_cover_all_classes() {
        let summary = summarize(&[prediction(3.9), prediction(3.7)], &[3.6, 1.2]).unwrap();

        assert_eq!(summary.true_distribution.len(), 5);
        let labels: Vec<&str> = summary.predicted_distribution.iter().map(|g| g.label).collect();
        assert_eq!(labels, vec!["A", "B", "C", "D", "F"]);

        assert_eq!(summary.predicted_distribution[0].count, 2);
        assert_eq!(summary.predicted_distribution[0].share, 1.0);
        assert_eq!(summary.true_distribution[0].count, 1);
        assert_eq!(summary.true_distribution[4].count, 1);
        assert_eq!(summary.true_distribution[4].share, 0.5);
    }

    #[test]
    fn test_rejects_bad_batches() {
        assert!(matches!(summarize(&[], &[]), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(
            summarize(&[prediction(3.0)], &[3.0, 2.0]),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            summarize(&[prediction(3.0)], &[f64::NAN]),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}
