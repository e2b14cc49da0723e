//! Разрешение путей модулей.
//!
//! Отвечает за поиск файлов модулей FIR по имени: в локальных путях
//! поиска и в системной библиотеке скомпилированных модулей.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{FirError, FirResult};

/// Стратегия разрешения имён модулей.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Сначала локальные пути, потом библиотека
    LocalFirst,
    /// Сначала библиотека, потом локальные пути
    LibraryFirst,
    /// Только локальные пути
    LocalOnly,
    /// Только библиотека
    LibraryOnly,
}

impl Default for ResolveStrategy {
    fn default() -> Self {
        Self::LocalFirst
    }
}

/// Резолвер модулей.
#[derive(Debug)]
pub struct ModuleResolver {
    /// Пути поиска локальных модулей
    search_paths: Vec<PathBuf>,
    /// Путь к библиотеке скомпилированных модулей
    library_path: Option<PathBuf>,
    /// Стратегия разрешения
    strategy: ResolveStrategy,
    /// Кэш разрешённых путей
    cache: HashMap<String, PathBuf>,
    /// Расширения файлов модулей
    extensions: Vec<String>,
}

impl ModuleResolver {
    /// Создать новый резолвер.
    pub fn new() -> Self {
        Self::with_search_paths(vec![PathBuf::from(".")])
    }

    /// Создать резолвер с путями поиска.
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
            library_path: None,
            strategy: ResolveStrategy::default(),
            cache: HashMap::new(),
            extensions: vec!["fir".to_string(), "fir.json".to_string()],
        }
    }

    /// Путь к библиотеке по умолчанию (в директории данных пользователя).
    pub fn default_library_path() -> Option<PathBuf> {
        dirs_next::data_dir().map(|p| p.join("fir").join("lib"))
    }

    /// Установить путь к библиотеке.
    pub fn set_library_path(&mut self, path: PathBuf) {
        self.library_path = Some(path);
    }

    /// Добавить путь поиска.
    pub fn add_search_path(&mut self, path: PathBuf) {
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    /// Установить стратегию разрешения.
    pub fn set_strategy(&mut self, strategy: ResolveStrategy) {
        self.strategy = strategy;
    }

    /// Очистить кэш.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Разрешить имя модуля в путь к файлу.
    ///
    /// Успешные разрешения кэшируются: один и тот же модуль может
    /// запрашиваться несколько раз за прогон.
    pub fn resolve(&mut self, module_name: &str) -> FirResult<PathBuf> {
        if let Some(path) = self.cache.get(module_name) {
            return Ok(path.clone());
        }

        let result = match self.strategy {
            ResolveStrategy::LocalFirst => self
                .resolve_local(module_name)
                .or_else(|_| self.resolve_library(module_name)),
            ResolveStrategy::LibraryFirst => self
                .resolve_library(module_name)
                .or_else(|_| self.resolve_local(module_name)),
            ResolveStrategy::LocalOnly => self.resolve_local(module_name),
            ResolveStrategy::LibraryOnly => self.resolve_library(module_name),
        };

        if let Ok(ref path) = result {
            self.cache.insert(module_name.to_string(), path.clone());
        }

        result
    }

    /// Разрешить модуль в локальных путях поиска.
    fn resolve_local(&self, module_name: &str) -> FirResult<PathBuf> {
        for search_path in &self.search_paths {
            if let Some(path) = self.find_module_in_dir(search_path, module_name) {
                return Ok(path);
            }
        }

        Err(FirError::ModuleNotFound(module_name.to_string()))
    }

    /// Разрешить модуль в библиотеке.
    fn resolve_library(&self, module_name: &str) -> FirResult<PathBuf> {
        let library_path = self.library_path.as_ref().ok_or_else(|| {
            FirError::ModuleNotFound(format!("library not configured for: {}", module_name))
        })?;

        self.find_module_in_dir(library_path, module_name)
            .ok_or_else(|| FirError::ModuleNotFound(module_name.to_string()))
    }

    /// Найти файл модуля в директории.
    ///
    /// Для каждого расширения проверяются два варианта: `data/map.fir`
    /// и `data/map/mod.fir` (иерархическое имя "data.map" превращается
    /// в путь).
    fn find_module_in_dir(&self, dir: &Path, module_name: &str) -> Option<PathBuf> {
        let module_path = module_name.replace('.', "/");

        for ext in &self.extensions {
            let flat = dir.join(format!("{}.{}", module_path, ext));
            if flat.is_file() {
                return Some(flat);
            }
            let nested = dir.join(&module_path).join(format!("mod.{}", ext));
            if nested.is_file() {
                return Some(nested);
            }
        }

        None
    }

    /// Получить все пути поиска.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Получить путь к библиотеке.
    pub fn library_path(&self) -> Option<&PathBuf> {
        self.library_path.as_ref()
    }
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}
