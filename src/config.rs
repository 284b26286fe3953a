//! Настройки API-сервера

use std::path::PathBuf;

pub const DEFAULT_MODEL_PATH: &str = "models/grade_pipeline.json";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

pub const MODEL_PATH_ENV: &str = "GRADE_MODEL_PATH";
pub const LISTEN_ADDR_ENV: &str = "GRADE_LISTEN_ADDR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub listen_addr: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Настройки процесса.
    ///
    /// Порядок (первое найденное побеждает):
    /// 1. Первый аргумент командной строки как путь к артефакту
    /// 2. Переменные `GRADE_MODEL_PATH` / `GRADE_LISTEN_ADDR` (учитывается `.env`)
    /// 3. Значения по умолчанию
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::resolve(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    pub fn resolve(arg: Option<String>, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |v: String| if v.trim().is_empty() { None } else { Some(v) };

        let model_path = arg
            .and_then(non_empty)
            .or_else(|| env(MODEL_PATH_ENV).and_then(non_empty))
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);

        let listen_addr = env(LISTEN_ADDR_ENV)
            .and_then(non_empty)
            .unwrap_or(defaults.listen_addr);

        Self {
            model_path,
            listen_addr,
        }
    }
}
