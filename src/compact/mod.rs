//! Компактор FIR: вычисление достижимого подмножества целой программы.
//!
//! Берёт главный модуль и набор корневых функций, обходит граф вызовов
//! с дозагрузкой модулей по требованию, замыкает множество типов и
//! собирает одну слитую программу ровно из достижимых объявлений.
//!
//! Фазы:
//! 1. Выбор корней по политике из [`CompactConfig`].
//! 2. Неподвижная точка достижимости ([`reach`]) с учётом правил
//!    скрытых зависимостей ([`rules`]).
//! 3. Замыкание по типам ([`types`]) поверх всех загруженных объявлений.
//! 4. Сборка результата ([`assemble`]).

mod assemble;
mod reach;
pub mod rules;
mod types;

pub use rules::{default_rules, RequirementRule, RuleSet};

use std::path::Path;

use log::info;

use crate::error::{FirError, FirResult};
use crate::fir::{Program, QName, TypeDecl};
use crate::modules::{write_program, ModuleLoader};

use reach::Reachability;

/// Настройки компактирования.
#[derive(Debug, Clone, Default)]
pub struct CompactConfig {
    /// Печатать прогресс на stdout
    pub verbose: bool,
    /// Политика «единственная главная функция»: корень — одна функция
    /// главного модуля с данным именем
    pub main_function: Option<String>,
    /// Политика «только экспорты»: корни — все публичные функции
    /// главного модуля
    pub exports_only: bool,
    /// Политика «явный список корней»
    pub initial_functions: Option<Vec<QName>>,
    /// Пользовательские правила, добавляемые к правилам по умолчанию
    pub requirement_rules: Vec<RequirementRule>,
    /// Модули, загружаемые безусловно, ещё до обхода
    pub always_import_modules: Vec<String>,
}

impl CompactConfig {
    /// Конфигурация по умолчанию: политика «экспорты главного модуля
    /// и его прямых импортов».
    pub fn new() -> Self {
        Self::default()
    }
}

/// Проверить конфигурацию до каких-либо загрузок.
fn validate(config: &CompactConfig, main: &Program) -> FirResult<()> {
    if config.exports_only && config.initial_functions.is_some() {
        return Err(FirError::ConfigConflict(
            "exports-only and an explicit initial function list are mutually exclusive"
                .to_string(),
        ));
    }

    if let Some(ref function) = config.main_function {
        if !main.has_function(function) {
            return Err(FirError::MainFunctionNotFound {
                module: main.name.clone(),
                function: function.clone(),
            });
        }
    }

    Ok(())
}

/// Скомпактировать программу до достижимого подмножества.
///
/// Главный модуль передаётся уже загруженным; все остальные модули
/// подтягиваются через `loader` по мере обнаружения ссылок. Результат —
/// одна самодостаточная программа с именем главного модуля.
pub fn compact(
    config: &CompactConfig,
    loader: &mut dyn ModuleLoader,
    main: Program,
) -> FirResult<Program> {
    validate(config, &main)?;

    let main_name = main.name.clone();
    let main_imports = main.imports.clone();
    let main_exports = main.public_function_names();

    let rules = RuleSet::with_defaults(config.requirement_rules.clone());
    let mut engine = Reachability::new(rules, config.verbose);

    // Главный модуль считается загруженным с самого начала
    engine.preload(main);

    // Корни по выбранной политике; приоритет: главная функция,
    // только экспорты, явный список, умолчание
    let seeds: Vec<QName> = if let Some(ref function) = config.main_function {
        vec![QName::new(main_name.clone(), function.clone())]
    } else if config.exports_only {
        main_exports
    } else if let Some(ref functions) = config.initial_functions {
        functions.clone()
    } else {
        // Умолчание: экспорты главного модуля и его прямых импортов.
        // Импорты загружаются заранее, только чтобы узнать их экспорты.
        let mut seeds = main_exports;
        for import in &main_imports {
            if engine.is_loaded(import) {
                continue;
            }
            let program = loader.load(import)?;
            seeds.extend(program.public_function_names());
            engine.preload(program);
        }
        seeds
    };

    // Принудительные импорты: загружаются до обхода, чтобы их
    // обязательные по правилам функции попали в план
    for module in &config.always_import_modules {
        if engine.is_loaded(module) {
            continue;
        }
        let program = loader.load(module)?;
        engine.preload(program);
    }

    for seed in seeds {
        engine.seed(seed);
    }

    let outcome = engine.run(loader)?;

    // Замыкание по типам поверх объявлений всех загруженных модулей
    let decls: Vec<&TypeDecl> = outcome.programs.iter().flat_map(|p| &p.types).collect();
    let mut seed_types = types::expand_constructor_owners(&outcome.constructors, &decls);
    seed_types.extend(outcome.direct_types.iter().cloned());
    let kept_types = types::required_datatypes(seed_types, &decls);

    let modules_loaded = outcome.programs.len();
    let program = assemble::assemble(
        &main_name,
        &outcome.programs,
        outcome.functions,
        &kept_types,
    );

    info!(
        "compacted '{}': {} modules loaded, {} functions, {} types, {} operators kept",
        main_name,
        modules_loaded,
        program.functions.len(),
        program.types.len(),
        program.operators.len()
    );
    if config.verbose {
        println!(
            "Compacted '{}': {} modules loaded, {} functions, {} types, {} operators kept.",
            main_name,
            modules_loaded,
            program.functions.len(),
            program.types.len(),
            program.operators.len()
        );
    }

    Ok(program)
}

/// Скомпактировать программу и записать результат в файл.
pub fn compact_to_file(
    config: &CompactConfig,
    loader: &mut dyn ModuleLoader,
    main: Program,
    target: &Path,
) -> FirResult<()> {
    let program = compact(config, loader, main)?;
    write_program(&program, target)
}
