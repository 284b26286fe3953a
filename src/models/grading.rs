//! Перевод непрерывного GPA в буквенную оценку

use crate::types::GradeClass;

pub struct GradeClassifier;

impl GradeClassifier {
    /// Фиксированные пороги, граница относится к лучшему классу:
    ///
    /// | GPA            | класс |
    /// |----------------|-------|
    /// | `>= 3.5`       | A (0) |
    /// | `[3.0, 3.5)`   | B (1) |
    /// | `[2.5, 3.0)`   | C (2) |
    /// | `[2.0, 2.5)`   | D (3) |
    /// | `< 2.0`        | F (4) |
    ///
    /// Значения вне [0, 4] не обрезаются. NaN не проходит ни один порог
    /// и попадает в F.
    pub fn classify(score: f64) -> GradeClass {
        if score >= 3.5 {
            GradeClass::A
        } else if score >= 3.0 {
            GradeClass::B
        } else if score >= 2.5 {
            GradeClass::C
        } else if score >= 2.0 {
            GradeClass::D
        } else {
            GradeClass::F
        }
    }

    pub fn classify_all(scores: &[f64]) -> Vec<GradeClass> {
        scores.iter().copied().map(Self::classify).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_belong_to_better_bucket() {
        assert_eq!(GradeClassifier::classify(2.0), GradeClass::D);
        assert_eq!(GradeClassifier::classify(2.5), GradeClass::C);
        assert_eq!(GradeClassifier::classify(3.0), GradeClass::B);
        assert_eq!(GradeClassifier::classify(3.5), GradeClass::A);
        assert_eq!(GradeClassifier::classify(1.999), GradeClass::F);
    }

    #[test]
    fn test_indices_match_labels() {
        assert_eq!(GradeClassifier::classify(2.0).index(), 3);
        assert_eq!(GradeClassifier::classify(2.5).index(), 2);
        assert_eq!(GradeClassifier::classify(3.0).index(), 1);
        assert_eq!(GradeClassifier::classify(3.5).index(), 0);
        assert_eq!(GradeClassifier::classify(1.8).label(), "F");
    }

    #[test]
    fn test_out_of_range_scores_are_not_errors() {
        assert_eq!(GradeClassifier::classify(-3.0), GradeClass::F);
        assert_eq!(GradeClassifier::classify(5.2), GradeClass::A);
        assert_eq!(GradeClassifier::classify(f64::NAN), GradeClass::F);
    }

    #[test]
    fn test_monotonic_in_score() {
        let mut previous = GradeClassifier::classify(-1.0);
        let mut score = -1.0;
        while score <= 5.0 {
            let current = GradeClassifier::classify(score);
            assert!(current <= previous, "class got worse at {score}");
            previous = current;
            score += 0.01;
        }
    }
}
