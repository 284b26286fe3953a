//! HTTP API поверх обученного пайплайна

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::analytics::{self, CohortSummary};
use crate::error::PipelineError;
use crate::models::{GpaRegressor, GradePredictionPipeline, Regressor};
use crate::types::{columns, GradeClass, Prediction, StudentRecord};

/// Пайплайн загружается один раз при старте и дальше только читается
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<GradePredictionPipeline<GpaRegressor>>,
}

impl AppState {
    pub fn new(pipeline: GradePredictionPipeline<GpaRegressor>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/grade-classes", get(grade_classes))
        .route("/api/predict", post(predict))
        .route("/api/analytics", post(analytics_summary))
        .layer(cors)
        .with_state(state)
}

/// Ошибка пайплайна, отданная клиенту без подробностей
#[derive(Debug)]
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            PipelineError::Schema(_) | PipelineError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, "invalid student record")
            }
            PipelineError::NotFitted(_) | PipelineError::Artifact(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "model is not available")
            }
            PipelineError::Regressor(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "prediction failed")
            }
        };

        tracing::warn!(kind = self.0.kind(), error = %self.0, "Request rejected");

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct PredictionResponse {
    #[serde(rename = "GPA")]
    gpa: f64,
    #[serde(rename = "GradeClass")]
    grade_class: GradeClass,
    label: &'static str,
}

impl From<Prediction> for PredictionResponse {
    fn from(p: Prediction) -> Self {
        Self {
            gpa: p.gpa,
            grade_class: p.grade_class,
            label: p.grade_class.label(),
        }
    }
}

async fn root() -> Json<Value> {
    Json(serde_json::json!({
        "message": "Grade Predictor API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "fitted": state.pipeline.is_fitted(),
        "regressor": state.pipeline.regressor().name(),
    }))
}

async fn grade_classes() -> Json<Value> {
    Json(serde_json::json!(GradeClass::label_table()))
}

/// Один объект -> один ответ, массив -> массив ответов в том же порядке
async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(rejected_body)?;
    let (records, single) = match &body {
        Value::Array(items) => (parse_records(items)?, false),
        other => (vec![StudentRecord::from_json(other)?], true),
    };

    tracing::info!(records = records.len(), "Predict request");

    let responses: Vec<PredictionResponse> = state
        .pipeline
        .predict(&records, true)?
        .into_iter()
        .map(PredictionResponse::from)
        .collect();

    let encoded = match responses.as_slice() {
        [one] if single => serde_json::to_value(one),
        all => serde_json::to_value(all),
    };
    let json = encoded
        .map_err(|e| PipelineError::Regressor(format!("failed to encode response: {e}")))?;

    Ok(Json(json))
}

/// Массив записей с истинным `GPA` -> распределения и группы студентов
async fn analytics_summary(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CohortSummary>, ApiError> {
    let Json(body) = body.map_err(rejected_body)?;
    let items = body.as_array().ok_or_else(|| {
        PipelineError::InvalidInput("analytics expects an array of records".to_string())
    })?;

    let mut records = parse_records(items)?;
    let true_gpa = records
        .iter_mut()
        .map(|r| {
            r.remove(columns::GPA)
                .ok_or_else(|| PipelineError::missing_column(columns::GPA))
        })
        .collect::<Result<Vec<f64>, _>>()?;

    tracing::info!(records = records.len(), "Analytics request");

    let predictions = state.pipeline.predict(&records, true)?;
    Ok(Json(analytics::summarize(&predictions, &true_gpa)?))
}

/// Тело не разобрано как JSON: тот же 400, что и для плохой записи
fn rejected_body(rejection: JsonRejection) -> PipelineError {
    PipelineError::InvalidInput(rejection.body_text())
}

fn parse_records(items: &[Value]) -> Result<Vec<StudentRecord>, PipelineError> {
    items.iter().map(StudentRecord::from_json).collect()
}
