//! Загрузчик модулей.
//!
//! Определяет интерфейс загрузки и две реализации: файловую (резолвер
//! путей + JSON на диске) и полностью в памяти (для встраивания и тестов).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{FirError, FirResult};
use crate::fir::{Program, QName, Rule};

use super::ModuleResolver;

/// Интерфейс загрузки модулей по имени.
///
/// Загрузчик вызывается из цикла достижимости по мере того, как
/// обнаруживаются ссылки на ещё не загруженные модули. Ошибка загрузки
/// фатальна для всего прогона.
pub trait ModuleLoader {
    /// Загрузить модуль по имени.
    fn load(&mut self, module_name: &str) -> FirResult<Program>;
}

/// Привязка примитивной функции к нативной реализации.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimBinding {
    /// Заменить правило функции внешней сущностью с данным именем
    External(String),
    /// Удалить объявление функции целиком
    Remove,
}

/// Файловый загрузчик: имя модуля -> путь -> JSON -> Program.
#[derive(Debug, Default)]
pub struct FileLoader {
    /// Резолвер путей
    resolver: ModuleResolver,
    /// Таблица привязок примитивов, применяется после чтения
    bindings: HashMap<QName, PrimBinding>,
}

impl FileLoader {
    /// Создать новый загрузчик.
    pub fn new() -> Self {
        Self::default()
    }

    /// Создать загрузчик с путями поиска.
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            resolver: ModuleResolver::with_search_paths(paths),
            bindings: HashMap::new(),
        }
    }

    /// Добавить путь поиска модулей.
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.resolver.add_search_path(path);
    }

    /// Установить путь к библиотеке.
    pub fn set_library_path(&mut self, path: PathBuf) {
        self.resolver.set_library_path(path);
    }

    /// Зарегистрировать привязку примитива.
    pub fn bind_primitive(&mut self, name: QName, binding: PrimBinding) {
        self.bindings.insert(name, binding);
    }

    /// Получить резолвер.
    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Получить резолвер (mutable).
    pub fn resolver_mut(&mut self) -> &mut ModuleResolver {
        &mut self.resolver
    }

    /// Применить привязки примитивов к свежезагруженной программе.
    fn apply_bindings(&self, program: &mut Program) {
        if self.bindings.is_empty() {
            return;
        }

        program.functions.retain(|func| {
            if matches!(self.bindings.get(&func.name), Some(PrimBinding::Remove)) {
                debug!("removing primitive '{}'", func.name);
                false
            } else {
                true
            }
        });

        for func in &mut program.functions {
            if let Some(PrimBinding::External(entity)) = self.bindings.get(&func.name) {
                debug!("binding '{}' to native entity '{}'", func.name, entity);
                func.rule = Rule::External(entity.clone());
            }
        }
    }
}

impl ModuleLoader for FileLoader {
    fn load(&mut self, module_name: &str) -> FirResult<Program> {
        let path = self.resolver.resolve(module_name)?;
        debug!("loading module '{}' from {}", module_name, path.display());

        let mut program = read_program(&path).map_err(|e| FirError::ModuleLoadError {
            module: module_name.to_string(),
            detail: e.to_string(),
        })?;

        // Файл обязан объявлять тот модуль, который у него запросили,
        // иначе реестр и очередь достижимости разойдутся
        if program.name != module_name {
            return Err(FirError::ModuleLoadError {
                module: module_name.to_string(),
                detail: format!(
                    "file {} declares module '{}'",
                    path.display(),
                    program.name
                ),
            });
        }

        self.apply_bindings(&mut program);
        Ok(program)
    }
}

/// Загрузчик модулей из памяти.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    programs: HashMap<String, Program>,
}

impl MemoryLoader {
    /// Создать пустой загрузчик.
    pub fn new() -> Self {
        Self::default()
    }

    /// Создать загрузчик из готового набора программ.
    pub fn with_programs(programs: Vec<Program>) -> Self {
        let mut loader = Self::new();
        for program in programs {
            loader.insert(program);
        }
        loader
    }

    /// Положить программу в загрузчик под её собственным именем.
    pub fn insert(&mut self, program: Program) {
        self.programs.insert(program.name.clone(), program);
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(&mut self, module_name: &str) -> FirResult<Program> {
        self.programs
            .get(module_name)
            .cloned()
            .ok_or_else(|| FirError::ModuleNotFound(module_name.to_string()))
    }
}

/// Прочитать программу из файла.
pub fn read_program(path: &Path) -> FirResult<Program> {
    let json = fs::read_to_string(path)
        .map_err(|e| FirError::IoError(format!("failed to read {}: {}", path.display(), e)))?;
    Program::from_json(&json)
}

/// Записать программу в файл в формате JSON.
pub fn write_program(program: &Program, path: &Path) -> FirResult<()> {
    let json = program.to_json()?;
    fs::write(path, json)
        .map_err(|e| FirError::IoError(format!("failed to write {}: {}", path.display(), e)))
}
