//! Обучение пайплайна на CSV и сохранение артефакта

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use grade_predictor::{
    analytics, load_training_set, GpaRegressor, GradePredictionPipeline, LinearRegressor,
    RidgeRegressor, TreeRegressor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RegressorKind {
    Ridge,
    Linear,
    Tree,
}

#[derive(Debug, Parser)]
#[command(name = "grade-train", version, about = "Обучение пайплайна предсказания оценок")]
struct Args {
    /// CSV с сырыми признаками студентов и колонкой GPA
    #[arg(long)]
    data: PathBuf,

    /// Куда сохранить артефакт пайплайна
    #[arg(long, default_value = "models/grade_pipeline.json")]
    output: PathBuf,

    /// Регрессор: ridge, linear или tree
    #[arg(long, value_enum, default_value_t = RegressorKind::Ridge)]
    regressor: RegressorKind,

    /// Сила L2-регуляризации для ridge
    #[arg(long, default_value_t = 1.0)]
    alpha: f64,

    /// Максимальная глубина дерева
    #[arg(long, default_value_t = 10)]
    max_depth: usize,

    /// Доля строк, отложенная для проверки
    #[arg(long, default_value_t = 0.2)]
    holdout: f64,

    /// Seed для перемешивания выборки и дерева
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

impl Args {
    fn build_regressor(&self) -> GpaRegressor {
        match self.regressor {
            RegressorKind::Ridge => RidgeRegressor::new(self.alpha).into(),
            RegressorKind::Linear => LinearRegressor::new().into(),
            RegressorKind::Tree => TreeRegressor::new(self.max_depth, 5, self.seed).into(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let data = load_training_set(&args.data)
        .with_context(|| format!("failed to load {}", args.data.display()))?;
    let (train, holdout) = data.split(args.holdout, args.seed)?;

    tracing::info!(
        train = train.len(),
        holdout = holdout.len(),
        regressor = ?args.regressor,
        "Training grade pipeline"
    );

    let mut pipeline = GradePredictionPipeline::new(args.build_regressor());
    pipeline.fit(&train.records, &train.gpa, true)?;

    let report = pipeline.report(&holdout.records, &holdout.gpa, true)?;
    tracing::info!(
        mae = report.regression.mae,
        r2 = report.regression.r2,
        accuracy = report.classification.accuracy,
        "Holdout evaluation"
    );
    println!("{report}");

    let predictions = pipeline.predict(&holdout.records, true)?;
    let cohorts = analytics::summarize(&predictions, &holdout.gpa)?;
    tracing::info!(
        failing = cohorts.failing.count,
        at_risk = cohorts.at_risk.count,
        watchlist = cohorts.watchlist.count,
        predicted_improvement = cohorts.predicted_improvement.count,
        "Students of interest on holdout"
    );

    pipeline
        .to_artifact()?
        .save(&args.output)
        .with_context(|| format!("failed to save {}", args.output.display()))?;

    Ok(())
}
