use std::io::Write;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use grade_predictor::service::{build_router, AppState};
use grade_predictor::{
    analytics, load_training_set, GpaRegressor, GradeClass, GradeClassifier,
    GradePredictionPipeline, PipelineArtifact, RidgeRegressor, StudentProfile, StudentRecord,
};

const HEADER: &str = "StudentID,Age,Gender,Ethnicity,ParentalEducation,StudyTimeWeekly,Absences,Tutoring,ParentalSupport,Extracurricular,Sports,Music,Volunteering,GPA,GradeClass";

/// Синтетический датасет с линейной зависимостью GPA от учёбы, пропусков и поддержки
fn write_dataset(rows: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();

    for i in 0..rows {
        let study = (i * 7 % 20) as f64;
        let absences = (i * 13 % 30) as f64;
        let support = i % 5;
        let tutoring = (i / 2) % 2;
        let gpa = 1.8 + 0.06 * study - 0.05 * absences + 0.15 * support as f64 + 0.2 * tutoring as f64;

        writeln!(
            file,
            "{},{},{},{},{},{study},{absences},{tutoring},{support},{},{},{},{},{gpa},0",
            1000 + i,
            15 + i % 4,
            i % 2,
            i % 4,
            i % 5,
            (i / 3) % 2,
            (i / 5) % 2,
            (i / 7) % 2,
            (i / 11) % 2,
        )
        .unwrap();
    }
    file
}

fn profile() -> StudentProfile {
    StudentProfile {
        age: 17,
        gender: 1,
        ethnicity: 0,
        parental_education: 2,
        study_time_weekly: 15.0,
        absences: 3.0,
        tutoring: 1,
        parental_support: 4,
        extracurricular: 1,
        sports: 0,
        music: 1,
        volunteering: 0,
    }
}

#[test]
fn test_train_save_load_predict() {
    let csv = write_dataset(200);
    let data = load_training_set(csv.path()).unwrap();
    let (train, holdout) = data.split(0.25, 7).unwrap();

    let mut pipeline = GradePredictionPipeline::new(GpaRegressor::from(RidgeRegressor::new(0.1)));
    pipeline.fit(&train.records, &train.gpa, true).unwrap();

    let report = pipeline.report(&holdout.records, &holdout.gpa, true).unwrap();
    assert!(report.regression.r2 > 0.95, "r2 = {}", report.regression.r2);

    let accuracy = pipeline
        .score(&holdout.records, &holdout.grade_classes(), true)
        .unwrap();
    assert!((0.0..=1.0).contains(&accuracy));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    pipeline.to_artifact().unwrap().save(&path).unwrap();

    let restored =
        GradePredictionPipeline::from_artifact(PipelineArtifact::<GpaRegressor>::load(&path).unwrap())
            .unwrap();
    let record = StudentRecord::from(profile());
    assert_eq!(
        restored.predict(&[record.clone()], true).unwrap(),
        pipeline.predict(&[record], true).unwrap()
    );

    let predictions = restored.predict(&holdout.records, true).unwrap();
    let summary = analytics::summarize(&predictions, &holdout.gpa).unwrap();
    assert_eq!(summary.total, holdout.len());
    assert_eq!(
        summary.failing.count,
        holdout
            .grade_classes()
            .iter()
            .filter(|&&g| g == GradeClass::F)
            .count()
    );
}

#[tokio::test]
async fn test_service_serves_loaded_artifact() {
    let csv = write_dataset(120);
    let data = load_training_set(csv.path()).unwrap();

    let mut pipeline = GradePredictionPipeline::new(GpaRegressor::from(RidgeRegressor::new(0.5)));
    pipeline.fit(&data.records, &data.gpa, true).unwrap();

    let json = pipeline.to_artifact().unwrap().to_json().unwrap();
    let restored = GradePredictionPipeline::from_artifact(
        PipelineArtifact::<GpaRegressor>::from_json(&json).unwrap(),
    )
    .unwrap();
    let app = build_router(AppState::new(restored));

    let body = serde_json::to_vec(&profile()).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    let gpa = json["GPA"].as_f64().unwrap();
    let expected = pipeline.predict(&[StudentRecord::from(profile())], true).unwrap()[0];
    assert_eq!(gpa, expected.gpa);
    assert_eq!(json["label"], GradeClassifier::classify(gpa).label());
}
