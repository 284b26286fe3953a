//! Feature engineering для пайплайна оценок

use crate::error::Result;
use crate::types::columns::{
    EXTRACURRICULAR, MUSIC, PARENTAL_SUPPORT, SPORTS, TOTAL_EXTRACURRICULAR, TUTORING,
    TUTORING_PARENTAL_SUPPORT, VOLUNTEERING,
};
use crate::types::StudentRecord;

/// Внеучебные активности, из которых складывается `TotalExtracurricular`
const ACTIVITY_FLAGS: [&str; 4] = [EXTRACURRICULAR, SPORTS, MUSIC, VOLUNTEERING];

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Добавление производных признаков к записи.
    ///
    /// Производные колонки всегда пересчитываются из сырых полей и
    /// перезаписываются, поэтому повторный вызов на уже обработанной
    /// записи даёт тот же результат.
    pub fn derive(record: &StudentRecord) -> Result<StudentRecord> {
        let (total, support) = Self::derived_values(record)?;

        let mut engineered = record.clone();
        engineered.insert(TOTAL_EXTRACURRICULAR, total);
        engineered.insert(TUTORING_PARENTAL_SUPPORT, support);
        Ok(engineered)
    }

    /// Значения (`TotalExtracurricular`, `Tutoring_ParentalSupport`) без копирования записи
    pub fn derived_values(record: &StudentRecord) -> Result<(f64, f64)> {
        let mut total = 0.0;
        for flag in ACTIVITY_FLAGS {
            total += record.require(flag)?;
        }

        let support = record.require(TUTORING)? * record.require(PARENTAL_SUPPORT)?;

        Ok((total, support))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn record(flags: [f64; 4], tutoring: f64, support: f64) -> StudentRecord {
        StudentRecord::new()
            .with(EXTRACURRICULAR, flags[0])
            .with(SPORTS, flags[1])
            .with(MUSIC, flags[2])
            .with(VOLUNTEERING, flags[3])
            .with(TUTORING, tutoring)
            .with(PARENTAL_SUPPORT, support)
    }

    #[test]
    fn test_derived_columns_are_literal_sum_and_product() {
        for mask in 0..16u8 {
            let flags = [0, 1, 2, 3].map(|bit| f64::from((mask >> bit) & 1));
            for tutoring in [0.0, 1.0] {
                for support in 0..=4 {
                    let support = f64::from(support);
                    let out = FeatureEngineer::derive(&record(flags, tutoring, support)).unwrap();

                    let total = out.get(TOTAL_EXTRACURRICULAR).unwrap();
                    assert_eq!(total, flags.iter().sum::<f64>());
                    assert!((0.0..=4.0).contains(&total));

                    let product = out.get(TUTORING_PARENTAL_SUPPORT).unwrap();
                    assert_eq!(product, tutoring * support);
                    assert!((0.0..=4.0).contains(&product));
                }
            }
        }
    }

    #[test]
    fn test_derive_is_idempotent() {
        let once = FeatureEngineer::derive(&record([1.0, 1.0, 0.0, 1.0], 1.0, 3.0)).unwrap();
        let twice = FeatureEngineer::derive(&once).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.get(TOTAL_EXTRACURRICULAR), Some(3.0));
        assert_eq!(twice.get(TUTORING_PARENTAL_SUPPORT), Some(3.0));
    }

    #[test]
    fn test_stale_derived_values_are_overwritten() {
        let stale = record([0.0, 0.0, 1.0, 0.0], 0.0, 4.0)
            .with(TOTAL_EXTRACURRICULAR, 9.0)
            .with(TUTORING_PARENTAL_SUPPORT, 9.0);
        let out = FeatureEngineer::derive(&stale).unwrap();
        assert_eq!(out.get(TOTAL_EXTRACURRICULAR), Some(1.0));
        assert_eq!(out.get(TUTORING_PARENTAL_SUPPORT), Some(0.0));
    }

    #[test]
    fn test_missing_inputs_are_schema_errors() {
        let mut without_support = record([0.0; 4], 1.0, 2.0);
        without_support.remove(PARENTAL_SUPPORT);
        assert!(matches!(
            FeatureEngineer::derive(&without_support),
            Err(PipelineError::Schema(_))
        ));

        let mut without_music = record([0.0; 4], 1.0, 2.0);
        without_music.remove(MUSIC);
        assert!(matches!(
            FeatureEngineer::derive(&without_music),
            Err(PipelineError::Schema(_))
        ));
    }
}
