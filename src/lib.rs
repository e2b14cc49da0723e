//! # FIR Compact
//!
//! Компактор целых программ для плоского промежуточного представления (FIR):
//! вычисляет достижимое от корневых функций подмножество многомодульной
//! программы и собирает его в один самодостаточный модуль.
//!
//! ## Основные модули
//!
//! - [`fir`] - структуры промежуточного представления
//! - [`modules`] - резолвер, загрузчики и реестр модулей
//! - [`compact`] - политики корней, достижимость, замыкание по типам, сборка
//!
//! ## Пример использования
//!
//! ```rust,ignore
//! use fir_compact::{compact, CompactConfig, FileLoader, ModuleLoader};
//!
//! let mut loader = FileLoader::new();
//! let main = loader.load("main")?;
//!
//! let mut config = CompactConfig::new();
//! config.main_function = Some("main".to_string());
//!
//! let program = compact(&config, &mut loader, main)?;
//! ```

// === Основные модули ===
pub mod compact;
pub mod error;
pub mod fir;
pub mod modules;

// === Re-exports для удобства ===
pub use compact::{compact, compact_to_file, CompactConfig, RequirementRule, RuleSet};
pub use error::{FirError, FirResult};
pub use fir::{Expr, FuncDecl, OpDecl, Program, QName, TypeDecl};
pub use modules::{FileLoader, MemoryLoader, ModuleLoader, ModuleResolver};
