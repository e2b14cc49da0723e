//! Реестр загруженных модулей.

use std::collections::{HashMap, HashSet};

use crate::fir::{FuncDecl, Program, QName};

/// Реестр загруженных модулей и слитая таблица их функций.
///
/// Набор загруженных модулей в течение прогона только растёт;
/// выгрузки нет. Программы хранятся в порядке загрузки.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Имена загруженных модулей
    loaded: HashSet<String>,
    /// Программы в порядке загрузки
    programs: Vec<Program>,
    /// Таблица функций всех загруженных модулей
    functions: HashMap<QName, FuncDecl>,
}

impl ModuleRegistry {
    /// Создать новый реестр.
    pub fn new() -> Self {
        Self::default()
    }

    /// Зарегистрировать загруженную программу, влив её функции в таблицу.
    /// Повторная регистрация модуля с тем же именем игнорируется.
    pub fn register(&mut self, program: Program) {
        if !self.loaded.insert(program.name.clone()) {
            return;
        }
        for func in &program.functions {
            self.functions.insert(func.name.clone(), func.clone());
        }
        self.programs.push(program);
    }

    /// Проверить, загружен ли модуль.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    /// Найти функцию по квалифицированному имени.
    pub fn function(&self, name: &QName) -> Option<&FuncDecl> {
        self.functions.get(name)
    }

    /// Все загруженные программы в порядке загрузки.
    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    /// Забрать программы, потребив реестр.
    pub fn into_programs(self) -> Vec<Program> {
        self.programs
    }

    /// Количество загруженных модулей.
    pub fn count(&self) -> usize {
        self.programs.len()
    }
}
