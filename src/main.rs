//! API сервер для предсказания оценок

use anyhow::Context;

use grade_predictor::{
    service::{build_router, AppState},
    GpaRegressor, GradePredictionPipeline, PipelineArtifact, Regressor, ServiceConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServiceConfig::from_env();

    // Без обученного пайплайна сервер не стартует
    let artifact = PipelineArtifact::<GpaRegressor>::load(&config.model_path).with_context(|| {
        format!(
            "failed to load pipeline artifact from {}",
            config.model_path.display()
        )
    })?;
    let pipeline = GradePredictionPipeline::from_artifact(artifact)?;

    tracing::info!(
        model_path = %config.model_path.display(),
        regressor = pipeline.regressor().name(),
        "Pipeline ready"
    );

    let app = build_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!("Server listening on http://{}", config.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
