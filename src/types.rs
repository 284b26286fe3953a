//! Типы данных для пайплайна предсказания оценок

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Имена колонок датасета
pub mod columns {
    pub const AGE: &str = "Age";
    pub const GENDER: &str = "Gender";
    pub const ETHNICITY: &str = "Ethnicity";
    pub const PARENTAL_EDUCATION: &str = "ParentalEducation";
    pub const STUDY_TIME_WEEKLY: &str = "StudyTimeWeekly";
    pub const ABSENCES: &str = "Absences";
    pub const TUTORING: &str = "Tutoring";
    pub const PARENTAL_SUPPORT: &str = "ParentalSupport";
    pub const EXTRACURRICULAR: &str = "Extracurricular";
    pub const SPORTS: &str = "Sports";
    pub const MUSIC: &str = "Music";
    pub const VOLUNTEERING: &str = "Volunteering";

    // Производные признаки
    pub const TOTAL_EXTRACURRICULAR: &str = "TotalExtracurricular";
    pub const TUTORING_PARENTAL_SUPPORT: &str = "Tutoring_ParentalSupport";

    pub const GPA: &str = "GPA";

    pub const RAW_FEATURES: [&str; 12] = [
        AGE,
        GENDER,
        ETHNICITY,
        PARENTAL_EDUCATION,
        STUDY_TIME_WEEKLY,
        ABSENCES,
        TUTORING,
        PARENTAL_SUPPORT,
        EXTRACURRICULAR,
        SPORTS,
        MUSIC,
        VOLUNTEERING,
    ];

    pub const DERIVED: [&str; 2] = [TOTAL_EXTRACURRICULAR, TUTORING_PARENTAL_SUPPORT];

    /// Колонки, которые стандартизирует скейлер
    pub const SCALED: [&str; 2] = [STUDY_TIME_WEEKLY, ABSENCES];

    pub fn is_derived(column: &str) -> bool {
        DERIVED.contains(&column)
    }
}

/// Допустимый домен сырого признака
#[derive(Debug, Clone, Copy)]
enum Domain {
    /// Целое >= 0
    Count,
    /// 0 или 1
    Flag,
    /// Целый код 0..=max
    Code(u8),
    /// Вещественное >= 0
    NonNegative,
}

impl Domain {
    fn accepts(self, value: f64) -> bool {
        let integral = value.fract() == 0.0;
        match self {
            Domain::Count => integral && value >= 0.0,
            Domain::Flag => value == 0.0 || value == 1.0,
            Domain::Code(max) => integral && (0.0..=f64::from(max)).contains(&value),
            Domain::NonNegative => value >= 0.0,
        }
    }

    fn describe(self) -> String {
        match self {
            Domain::Count => "a non-negative integer".to_string(),
            Domain::Flag => "0 or 1".to_string(),
            Domain::Code(max) => format!("an integer code in 0..={max}"),
            Domain::NonNegative => "a non-negative number".to_string(),
        }
    }
}

fn raw_domain(column: &str) -> Option<Domain> {
    use columns::*;

    let domain = match column {
        AGE | GENDER | ETHNICITY | PARENTAL_EDUCATION => Domain::Count,
        TUTORING | EXTRACURRICULAR | SPORTS | MUSIC | VOLUNTEERING => Domain::Flag,
        PARENTAL_SUPPORT => Domain::Code(4),
        STUDY_TIME_WEEKLY | ABSENCES => Domain::NonNegative,
        _ => return None,
    };
    Some(domain)
}

/// Запись о студенте: имя колонки -> числовое значение.
///
/// Колонки хранятся упорядоченно по имени, поэтому порядок обхода
/// детерминирован и не зависит от порядка во входных данных.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentRecord {
    values: BTreeMap<String, f64>,
}

impl StudentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: f64) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: f64) {
        self.values.insert(column.into(), value);
    }

    pub fn remove(&mut self, column: &str) -> Option<f64> {
        self.values.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    /// Значение колонки или `Schema`, если её нет
    pub fn require(&self, column: &str) -> Result<f64> {
        self.get(column)
            .ok_or_else(|| PipelineError::missing_column(column))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Разбор JSON-объекта запроса.
    ///
    /// `null`, строки, булевы и вложенные значения отклоняются как
    /// `InvalidInput`: молча подставлять значения нельзя.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            PipelineError::InvalidInput("record must be a JSON object".to_string())
        })?;

        let mut record = Self::new();
        for (column, value) in object {
            let number = match value {
                serde_json::Value::Null => {
                    return Err(PipelineError::InvalidInput(format!(
                        "column '{column}' is null"
                    )))
                }
                serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
                    PipelineError::InvalidInput(format!("column '{column}' is not representable as f64"))
                })?,
                _ => {
                    return Err(PipelineError::InvalidInput(format!(
                        "column '{column}' must be numeric"
                    )))
                }
            };
            record.insert(column.clone(), number);
        }

        Ok(record)
    }

    /// Все значения конечны (без NaN и бесконечностей)
    pub fn ensure_finite(&self) -> Result<()> {
        match self.values.iter().find(|(_, v)| !v.is_finite()) {
            Some((column, value)) => Err(PipelineError::InvalidInput(format!(
                "column '{column}' has non-finite value {value}"
            ))),
            None => Ok(()),
        }
    }

    /// Проверка доменов сырых признаков.
    ///
    /// Неизвестные колонки проверяются только на конечность.
    pub fn validate_raw(&self) -> Result<()> {
        self.ensure_finite()?;

        for (column, &value) in &self.values {
            if let Some(domain) = raw_domain(column) {
                if !domain.accepts(value) {
                    return Err(PipelineError::InvalidInput(format!(
                        "column '{column}' = {value} must be {}",
                        domain.describe()
                    )));
                }
            }
        }

        Ok(())
    }
}

impl FromIterator<(String, f64)> for StudentRecord {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Типизированные сырые признаки студента
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StudentProfile {
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
}

impl From<&StudentProfile> for StudentRecord {
    fn from(profile: &StudentProfile) -> Self {
        use columns::*;

        StudentRecord::new()
            .with(AGE, f64::from(profile.age))
            .with(GENDER, f64::from(profile.gender))
            .with(ETHNICITY, f64::from(profile.ethnicity))
            .with(PARENTAL_EDUCATION, f64::from(profile.parental_education))
            .with(STUDY_TIME_WEEKLY, profile.study_time_weekly)
            .with(ABSENCES, profile.absences)
            .with(TUTORING, f64::from(profile.tutoring))
            .with(PARENTAL_SUPPORT, f64::from(profile.parental_support))
            .with(EXTRACURRICULAR, f64::from(profile.extracurricular))
            .with(SPORTS, f64::from(profile.sports))
            .with(MUSIC, f64::from(profile.music))
            .with(VOLUNTEERING, f64::from(profile.volunteering))
    }
}

impl From<StudentProfile> for StudentRecord {
    fn from(profile: StudentProfile) -> Self {
        Self::from(&profile)
    }
}

/// Порядковый класс оценки: 0 = A (лучший) ... 4 = F (худший)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum GradeClass {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    F = 4,
}

impl GradeClass {
    pub const ALL: [GradeClass; 5] = [
        GradeClass::A,
        GradeClass::B,
        GradeClass::C,
        GradeClass::D,
        GradeClass::F,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            GradeClass::A => "A",
            GradeClass::B => "B",
            GradeClass::C => "C",
            GradeClass::D => "D",
            GradeClass::F => "F",
        }
    }

    /// Таблица GradeClass -> буква
    pub fn label_table() -> BTreeMap<u8, &'static str> {
        Self::ALL.iter().map(|g| (g.index(), g.label())).collect()
    }
}

impl From<GradeClass> for u8 {
    fn from(grade: GradeClass) -> Self {
        grade.index()
    }
}

impl TryFrom<u8> for GradeClass {
    type Error = PipelineError;

    fn try_from(value: u8) -> Result<Self> {
        GradeClass::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| PipelineError::InvalidInput(format!("grade class {value} is outside 0..=4")))
    }
}

impl fmt::Display for GradeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Результат предсказания для одной записи
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "GPA")]
    pub gpa: f64,
    #[serde(rename = "GradeClass")]
    pub grade_class: GradeClass,
}
