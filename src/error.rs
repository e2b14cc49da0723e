//! Определения ошибок для компактора FIR.

use thiserror::Error;

/// Основной тип `Result` для библиотеки.
pub type FirResult<T> = Result<T, FirError>;

/// Перечисление всех возможных ошибок.
///
/// Любая ошибка фатальна для прогона: компактор либо возвращает
/// полностью слитую программу, либо ошибку. Частичных результатов нет.
#[derive(Error, Debug)]
pub enum FirError {
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Failed to load module '{module}': {detail}")]
    ModuleLoadError { module: String, detail: String },

    #[error("Conflicting entry-point options: {0}")]
    ConfigConflict(String),

    #[error("Main function '{function}' not found in module '{module}'")]
    MainFunctionNotFound { module: String, function: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
