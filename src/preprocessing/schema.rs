//! Схема входных колонок, зафиксированная при обучении

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::{columns, StudentRecord};

/// Набор колонок, увиденных в `fit`.
///
/// Форма схемы зависит от флага `preprocess`:
/// - `true`: все колонки обучающей записи как есть;
/// - `false`: те же колонки без двух производных признаков.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSchema {
    columns: Vec<String>,
    preprocess: bool,
}

impl TrainingSchema {
    pub fn capture(observed: &StudentRecord, preprocess: bool) -> Self {
        let columns = observed
            .columns()
            .filter(|c| preprocess || !columns::is_derived(c))
            .map(str::to_string)
            .collect();

        Self { columns, preprocess }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Флаг `preprocess`, с которым была снята схема
    pub fn preprocess(&self) -> bool {
        self.preprocess
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Колонки матрицы признаков для регрессора: колонки схемы без
    /// производных, затем `TotalExtracurricular`, `Tutoring_ParentalSupport`
    pub fn feature_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| !columns::is_derived(c))
            .chain(columns::DERIVED)
            .collect()
    }

    pub fn missing_columns<'a>(&'a self, record: &StudentRecord) -> Vec<&'a str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| !record.contains(c))
            .collect()
    }

    pub fn ensure_covered(&self, record: &StudentRecord) -> Result<()> {
        let missing = self.missing_columns(record);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Schema(format!(
                "record is missing columns: {}",
                missing.join(", ")
            )))
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(PipelineError::Schema("training schema is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::columns::*;

    fn engineered_record() -> StudentRecord {
        RAW_FEATURES
            .iter()
            .chain(DERIVED.iter())
            .map(|c| (c.to_string(), 1.0))
            .collect()
    }

    #[test]
    fn test_schema_shape_depends_on_preprocess_flag() {
        let record = engineered_record();

        let with = TrainingSchema::capture(&record, true);
        assert_eq!(with.columns().len(), 14);
        assert!(with.contains(TOTAL_EXTRACURRICULAR));

        let without = TrainingSchema::capture(&record, false);
        assert_eq!(without.columns().len(), 12);
        assert!(!without.contains(TOTAL_EXTRACURRICULAR));
        assert!(!without.contains(TUTORING_PARENTAL_SUPPORT));
    }

    #[test]
    fn test_feature_columns_never_duplicate_derived() {
        let record = engineered_record();
        for preprocess in [true, false] {
            let schema = TrainingSchema::capture(&record, preprocess);
            let features = schema.feature_columns();
            assert_eq!(features.len(), 14);
            assert_eq!(&features[12..], &DERIVED);
        }
    }

    #[test]
    fn test_coverage_is_name_matched_superset() {
        let schema = TrainingSchema::capture(
            &StudentRecord::new().with(AGE, 1.0).with(MUSIC, 0.0),
            true,
        );

        let superset = StudentRecord::new()
            .with(MUSIC, 1.0)
            .with("Unrelated", 5.0)
            .with(AGE, 2.0);
        assert!(schema.ensure_covered(&superset).is_ok());

        let partial = StudentRecord::new().with(AGE, 2.0);
        assert_eq!(schema.missing_columns(&partial), vec![MUSIC]);
        assert!(matches!(
            schema.ensure_covered(&partial),
            Err(PipelineError::Schema(_))
        ));
    }
}
