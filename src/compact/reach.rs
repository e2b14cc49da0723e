//! Движок достижимости: рабочий список с дозагрузкой модулей.
//!
//! Обходит граф вызовов в ширину, начиная с корневых функций. Когда
//! очередной элемент ссылается на ещё не загруженный модуль, модуль
//! подтягивается через загрузчик прямо посреди обхода, а элемент
//! возвращается в очередь. Обход заканчивается неподвижной точкой:
//! очередь пуста, новых имён не появляется.

use std::collections::{HashSet, VecDeque};

use log::debug;

use crate::error::FirResult;
use crate::fir::{FuncDecl, Program, QName};
use crate::modules::{ModuleLoader, ModuleRegistry};

use super::rules::RuleSet;

/// Результат фазы достижимости.
#[derive(Debug)]
pub(crate) struct ReachOutcome {
    /// Все загруженные программы в порядке загрузки
    pub programs: Vec<Program>,
    /// Достигнутые функции в порядке обработки
    pub functions: Vec<FuncDecl>,
    /// Достигнутые конструкторы
    pub constructors: HashSet<QName>,
    /// Имена типов из сигнатур достигнутых функций
    pub direct_types: HashSet<QName>,
}

/// Состояние обхода. Единственный владелец всех аккумуляторов:
/// очереди, множеств достигнутого и реестра загруженных модулей.
pub(crate) struct Reachability {
    rules: RuleSet,
    registry: ModuleRegistry,
    /// Функции, уже поставленные в план (защита от повторной обработки)
    reached_functions: HashSet<QName>,
    /// Имена, уже обработанные при выемке из очереди. Имя может стоять
    /// в очереди дважды: как ссылка на конструктор и как цель вызова
    processed: HashSet<QName>,
    /// Достигнутые конструкторы
    reached_constructors: HashSet<QName>,
    /// Имена типов, упомянутые в сигнатурах достигнутых функций
    direct_types: HashSet<QName>,
    /// Имена, ожидающие обработки; могут оказаться и не функциями
    worklist: VecDeque<QName>,
    /// Достигнутые объявления в порядке обработки
    collected: Vec<FuncDecl>,
    verbose: bool,
}

impl Reachability {
    /// Создать движок с набором правил.
    pub fn new(rules: RuleSet, verbose: bool) -> Self {
        Self {
            rules,
            registry: ModuleRegistry::new(),
            reached_functions: HashSet::new(),
            processed: HashSet::new(),
            reached_constructors: HashSet::new(),
            direct_types: HashSet::new(),
            worklist: VecDeque::new(),
            collected: Vec::new(),
            verbose,
        }
    }

    /// Зарегистрировать программу, которая уже есть на руках
    /// (главный модуль, принудительные импорты). Обязательные по правилам
    /// функции модуля встают в план, как при обычной загрузке.
    pub fn preload(&mut self, program: Program) {
        if self.registry.is_loaded(&program.name) {
            return;
        }
        let module = program.name.clone();
        self.registry.register(program);
        self.schedule_always_required(&module);
    }

    /// Загружен ли модуль.
    pub fn is_loaded(&self, module: &str) -> bool {
        self.registry.is_loaded(module)
    }

    /// Поставить корневую функцию в план обхода.
    pub fn seed(&mut self, name: QName) {
        self.schedule_function(name);
    }

    /// Запланировать функцию, если она ещё не достигнута.
    /// Вместе с ней планируются все влекомые правилами функции.
    fn schedule_function(&mut self, name: QName) {
        if !self.reached_functions.insert(name.clone()) {
            return;
        }
        self.worklist.push_back(name.clone());
        self.apply_implied(&name);
    }

    /// Применить правила Requires для только что достигнутой функции.
    fn apply_implied(&mut self, name: &QName) {
        for implied in self.rules.implied_by(name) {
            debug!("rule: '{}' requires '{}'", name, implied);
            self.schedule_function(implied);
        }
    }

    /// Учесть ссылку на конструктор. Имя попадает в очередь, чтобы
    /// модуль, объявляющий конструктор, был загружен к замыканию по типам.
    fn schedule_constructor(&mut self, name: QName) {
        if !self.reached_constructors.insert(name.clone()) {
            return;
        }
        if self.reached_functions.contains(&name) {
            return;
        }
        self.worklist.push_back(name);
    }

    /// Поставить в план функции, обязательные при загрузке модуля.
    fn schedule_always_required(&mut self, module: &str) {
        for function in self.rules.always_required_in(module) {
            debug!("rule: loading '{}' requires '{}'", module, function);
            self.schedule_function(function);
        }
    }

    /// Загрузить модуль и зарегистрировать его.
    fn load_module(&mut self, loader: &mut dyn ModuleLoader, module: &str) -> FirResult<()> {
        if self.verbose {
            println!("Loading module '{}'...", module);
        }
        let program = loader.load(module)?;
        self.registry.register(program);
        self.schedule_always_required(module);
        Ok(())
    }

    /// Прогнать рабочий список до неподвижной точки.
    pub fn run(mut self, loader: &mut dyn ModuleLoader) -> FirResult<ReachOutcome> {
        while let Some(name) = self.worklist.pop_front() {
            // Модуль имени должен быть загружен до поиска в таблице
            if !self.registry.is_loaded(&name.module) {
                self.load_module(loader, &name.module)?;
                self.worklist.push_back(name);
                continue;
            }

            let func = match self.registry.function(&name) {
                Some(func) => func.clone(),
                None => {
                    // Имени нет среди функций: считаем его ссылкой на
                    // конструктор, учтённой в замыкании по типам
                    debug!("'{}' is not a function, assuming a constructor reference", name);
                    continue;
                }
            };

            if !self.processed.insert(name.clone()) {
                continue;
            }

            // Имя могло встать в очередь как ссылка на конструктор и только
            // сейчас подтвердиться функцией; правила Requires срабатывают
            // при первом подтверждении
            if self.reached_functions.insert(name) {
                self.apply_implied(&func.name);
            }
            self.process(func);
        }

        Ok(ReachOutcome {
            programs: self.registry.into_programs(),
            functions: self.collected,
            constructors: self.reached_constructors,
            direct_types: self.direct_types,
        })
    }

    /// Обработать достигнутую функцию: вызовы, конструкторы, типы сигнатуры.
    fn process(&mut self, func: FuncDecl) {
        debug!("reached function '{}'", func.name);

        for target in func.called_functions() {
            self.schedule_function(target);
        }
        for cons in func.constructor_refs() {
            self.schedule_constructor(cons);
        }
        for ty in func.signature_type_names() {
            self.direct_types.insert(ty);
        }

        self.collected.push(func);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::rules::RequirementRule;
    use crate::fir::{Expr, Rule, TypeExpr, Visibility, PRELUDE};
    use crate::modules::MemoryLoader;

    fn qn(module: &str, name: &str) -> QName {
        QName::new(module, name)
    }

    fn func(name: QName, body: Expr) -> FuncDecl {
        FuncDecl {
            name,
            arity: 0,
            visibility: Visibility::Public,
            ty: TypeExpr::base(qn(PRELUDE, "Int")),
            rule: Rule::Rule {
                params: Vec::new(),
                body,
            },
        }
    }

    fn program(module: &str, functions: Vec<FuncDecl>) -> Program {
        Program {
            name: module.to_string(),
            imports: Vec::new(),
            types: Vec::new(),
            functions,
            operators: Vec::new(),
        }
    }

    fn function_names(outcome: &ReachOutcome) -> Vec<QName> {
        outcome.functions.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_transitive_calls_are_collected() {
        let main = program(
            "main",
            vec![
                func(qn("main", "f"), Expr::call(qn("main", "g"), vec![])),
                func(qn("main", "g"), Expr::call(qn("main", "h"), vec![])),
                func(qn("main", "h"), Expr::Var(0)),
                func(qn("main", "k"), Expr::Var(0)),
            ],
        );

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::new();
        let outcome = engine.run(&mut loader).unwrap();

        assert_eq!(
            function_names(&outcome),
            vec![qn("main", "f"), qn("main", "g"), qn("main", "h")]
        );
    }

    #[test]
    fn test_modules_load_on_demand_only() {
        let main = program(
            "main",
            vec![func(qn("main", "f"), Expr::call(qn("arith", "plus"), vec![]))],
        );
        let arith = program("arith", vec![func(qn("arith", "plus"), Expr::Var(0))]);
        let unused = program("data", vec![func(qn("data", "lookup"), Expr::Var(0))]);

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::with_programs(vec![arith, unused]);
        let outcome = engine.run(&mut loader).unwrap();

        let modules: Vec<&str> = outcome.programs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(modules, vec!["main", "arith"]);
        assert!(function_names(&outcome).contains(&qn("arith", "plus")));
    }

    #[test]
    fn test_missing_module_is_fatal() {
        let main = program(
            "main",
            vec![func(qn("main", "f"), Expr::call(qn("ghost", "g"), vec![]))],
        );

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::new();
        assert!(engine.run(&mut loader).is_err());
    }

    #[test]
    fn test_constructor_reference_loads_defining_module() {
        let main = program(
            "main",
            vec![func(
                qn("main", "f"),
                Expr::cons(qn("shapes", "Circle"), vec![Expr::Lit(crate::fir::Literal::Int(1))]),
            )],
        );
        // Модуль только с типами, без функций
        let shapes = program("shapes", vec![]);

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::with_programs(vec![shapes]);
        let outcome = engine.run(&mut loader).unwrap();

        let modules: Vec<&str> = outcome.programs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(modules, vec!["main", "shapes"]);
        assert!(outcome.constructors.contains(&qn("shapes", "Circle")));
        assert_eq!(function_names(&outcome), vec![qn("main", "f")]);
    }

    #[test]
    fn test_always_required_fires_on_load() {
        let main = program(
            "main",
            vec![func(qn("main", "f"), Expr::call(qn("arith", "plus"), vec![]))],
        );
        let arith = program(
            "arith",
            vec![
                func(qn("arith", "plus"), Expr::Var(0)),
                func(qn("arith", "initTables"), Expr::Var(0)),
            ],
        );

        let rules = RuleSet::new(vec![RequirementRule::always_required(
            "arith",
            qn("arith", "initTables"),
        )]);
        let mut engine = Reachability::new(rules, false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::with_programs(vec![arith]);
        let outcome = engine.run(&mut loader).unwrap();

        assert!(function_names(&outcome).contains(&qn("arith", "initTables")));
    }

    #[test]
    fn test_always_required_fires_on_preload() {
        let main = program(
            "main",
            vec![func(qn("main", "init"), Expr::Var(0))],
        );

        let rules = RuleSet::new(vec![RequirementRule::always_required(
            "main",
            qn("main", "init"),
        )]);
        let mut engine = Reachability::new(rules, false);
        engine.preload(main);

        let mut loader = MemoryLoader::new();
        let outcome = engine.run(&mut loader).unwrap();

        assert_eq!(function_names(&outcome), vec![qn("main", "init")]);
    }

    #[test]
    fn test_requires_rule_applies_to_seeds() {
        let main = program(
            "main",
            vec![
                func(qn("main", "f"), Expr::Var(0)),
                func(qn("main", "z"), Expr::Var(0)),
            ],
        );

        let rules = RuleSet::new(vec![RequirementRule::requires(
            qn("main", "f"),
            qn("main", "z"),
        )]);
        let mut engine = Reachability::new(rules, false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::new();
        let outcome = engine.run(&mut loader).unwrap();

        assert!(function_names(&outcome).contains(&qn("main", "z")));
    }

    #[test]
    fn test_requires_rules_chain() {
        let main = program(
            "main",
            vec![
                func(qn("main", "f"), Expr::Var(0)),
                func(qn("main", "a"), Expr::Var(0)),
                func(qn("main", "b"), Expr::Var(0)),
            ],
        );

        let rules = RuleSet::new(vec![
            RequirementRule::requires(qn("main", "f"), qn("main", "a")),
            RequirementRule::requires(qn("main", "a"), qn("main", "b")),
        ]);
        let mut engine = Reachability::new(rules, false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::new();
        let outcome = engine.run(&mut loader).unwrap();

        let names = function_names(&outcome);
        assert!(names.contains(&qn("main", "a")));
        assert!(names.contains(&qn("main", "b")));
    }

    #[test]
    fn test_unknown_name_is_dropped_silently() {
        let main = program("main", vec![]);

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "ghost"));

        let mut loader = MemoryLoader::new();
        let outcome = engine.run(&mut loader).unwrap();

        assert!(outcome.functions.is_empty());
    }

    #[test]
    fn test_signature_types_are_recorded() {
        let mut f = func(qn("main", "f"), Expr::Var(0));
        f.ty = TypeExpr::func(
            TypeExpr::base(qn("geo", "Shape")),
            TypeExpr::base(qn(PRELUDE, "Int")),
        );
        let main = program("main", vec![f]);

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::new();
        let outcome = engine.run(&mut loader).unwrap();

        assert!(outcome.direct_types.contains(&qn("geo", "Shape")));
        assert!(outcome.direct_types.contains(&qn(PRELUDE, "Int")));
    }

    #[test]
    fn test_name_queued_as_constructor_and_call_is_processed_once() {
        // f ссылается на m.mk как на конструктор, g вызывает m.mk как
        // функцию; имя стоит в очереди дважды, но обрабатывается один раз
        let main = program(
            "main",
            vec![
                func(
                    qn("main", "f"),
                    Expr::Or(
                        Box::new(Expr::cons(qn("m", "mk"), vec![])),
                        Box::new(Expr::call(qn("main", "g"), vec![])),
                    ),
                ),
                func(qn("main", "g"), Expr::call(qn("m", "mk"), vec![])),
            ],
        );
        let m = program("m", vec![func(qn("m", "mk"), Expr::Var(0))]);

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::with_programs(vec![m]);
        let outcome = engine.run(&mut loader).unwrap();

        assert_eq!(
            function_names(&outcome),
            vec![qn("main", "f"), qn("main", "g"), qn("m", "mk")]
        );
        assert!(outcome.constructors.contains(&qn("m", "mk")));
    }

    #[test]
    fn test_function_is_processed_once() {
        // f и g вызывают друг друга; по одной записи на функцию
        let main = program(
            "main",
            vec![
                func(qn("main", "f"), Expr::call(qn("main", "g"), vec![])),
                func(qn("main", "g"), Expr::call(qn("main", "f"), vec![])),
            ],
        );

        let mut engine = Reachability::new(RuleSet::new(vec![]), false);
        engine.preload(main);
        engine.seed(qn("main", "f"));

        let mut loader = MemoryLoader::new();
        let outcome = engine.run(&mut loader).unwrap();

        assert_eq!(
            function_names(&outcome),
            vec![qn("main", "f"), qn("main", "g")]
        );
    }
}
