//! Загрузка обучающего датасета из CSV

use std::fs::File;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Deserialize;

use crate::error::DatasetError;
use crate::models::GradeClassifier;
use crate::types::{GradeClass, StudentProfile, StudentRecord};

/// Строка CSV: сырые признаки + GPA.
///
/// Остальные колонки (`StudentID`, `GradeClass`) игнорируются: класс
/// всегда пересчитывается из GPA.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainingRow {
    pub age: u32,
    pub gender: u8,
    pub ethnicity: u8,
    pub parental_education: u8,
    pub study_time_weekly: f64,
    pub absences: f64,
    pub tutoring: u8,
    pub parental_support: u8,
    pub extracurricular: u8,
    pub sports: u8,
    pub music: u8,
    pub volunteering: u8,
    #[serde(rename = "GPA")]
    pub gpa: f64,
}

impl TrainingRow {
    pub fn profile(&self) -> StudentProfile {
        StudentProfile {
            age: self.age,
            gender: self.gender,
            ethnicity: self.ethnicity,
            parental_education: self.parental_education,
            study_time_weekly: self.study_time_weekly,
            absences: self.absences,
            tutoring: self.tutoring,
            parental_support: self.parental_support,
            extracurricular: self.extracurricular,
            sports: self.sports,
            music: self.music,
            volunteering: self.volunteering,
        }
    }
}

/// Записи и целевой GPA, выровненные по индексу
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub records: Vec<StudentRecord>,
    pub gpa: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn grade_classes(&self) -> Vec<GradeClass> {
        GradeClassifier::classify_all(&self.gpa)
    }

    /// Перемешивание с фиксированным seed и отделение доли `holdout` под проверку.
    ///
    /// Возвращает `(train, holdout)`; обе части непустые.
    pub fn split(&self, holdout: f64, seed: u64) -> Result<(TrainingSet, TrainingSet), DatasetError> {
        if !(holdout > 0.0 && holdout < 1.0) {
            return Err(DatasetError::InvalidHoldout(holdout));
        }
        if self.len() < 2 {
            return Err(DatasetError::Empty);
        }

        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let test_size = ((self.len() as f64 * holdout).round() as usize).clamp(1, self.len() - 1);
        let (test_idx, train_idx) = indices.split_at(test_size);

        Ok((self.subset(train_idx), self.subset(test_idx)))
    }

    fn subset(&self, indices: &[usize]) -> TrainingSet {
        TrainingSet {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            gpa: indices.iter().map(|&i| self.gpa[i]).collect(),
        }
    }
}

impl FromIterator<TrainingRow> for TrainingSet {
    fn from_iter<I: IntoIterator<Item = TrainingRow>>(iter: I) -> Self {
        let mut set = TrainingSet::default();
        for row in iter {
            set.records.push(StudentRecord::from(row.profile()));
            set.gpa.push(row.gpa);
        }
        set
    }
}

pub fn load_training_set(path: impl AsRef<Path>) -> Result<TrainingSet, DatasetError> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let rows = reader
        .deserialize::<TrainingRow>()
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(DatasetError::Empty);
    }

    let set: TrainingSet = rows.into_iter().collect();
    tracing::info!(path = %path.display(), rows = set.len(), "Training data loaded");
    Ok(set)
}
