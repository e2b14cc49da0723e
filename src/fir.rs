//! Основные структуры плоского промежуточного представления (FIR).
//!
//! FIR — представление целой программы на уровне функций: модуль состоит
//! из объявлений типов, функций и инфиксных операторов, тела функций
//! записаны деревом выражений без сахара. Все перекрёстные ссылки
//! (вызовы, конструкторы, типы) идут через квалифицированные имена.

use crate::error::{FirError, FirResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Индекс локальной переменной в теле функции.
pub type VarIndex = u32;

/// Индекс переменной типа.
pub type TVarIndex = u32;

/// Имя модуля рантайма. Его базовые типы переживают компактирование всегда.
pub const PRELUDE: &str = "prelude";

/// Квалифицированное имя: пара (модуль, локальное имя).
///
/// Порядок сравнения — сначала модуль, затем имя.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QName {
    pub module: String,
    pub name: String,
}

impl QName {
    /// Создать квалифицированное имя.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Видимость объявления за пределами своего модуля.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Экспортируется из модуля
    Public,
    /// Видно только внутри модуля
    Private,
}

/// Литеральное значение.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Целочисленный литерал
    Int(i64),
    /// Литерал с плавающей точкой
    Float(f64),
    /// Символьный литерал
    Char(char),
}

/// Выражение типа.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    /// Переменная типа
    Var(TVarIndex),
    /// Функциональный тип (аргумент -> результат)
    Func(Box<TypeExpr>, Box<TypeExpr>),
    /// Применение конструктора типов к аргументам
    Cons { name: QName, args: Vec<TypeExpr> },
}

impl TypeExpr {
    /// Конструктор типов без аргументов.
    pub fn base(name: QName) -> Self {
        TypeExpr::Cons {
            name,
            args: Vec::new(),
        }
    }

    /// Функциональный тип из двух частей.
    pub fn func(from: TypeExpr, to: TypeExpr) -> Self {
        TypeExpr::Func(Box::new(from), Box::new(to))
    }

    /// Имена всех конструкторов типов в выражении, без дублей.
    pub fn type_names(&self) -> Vec<QName> {
        let mut out = Vec::new();
        self.collect_type_names(&mut out);
        out
    }

    fn collect_type_names(&self, out: &mut Vec<QName>) {
        match self {
            TypeExpr::Var(_) => {}
            TypeExpr::Func(from, to) => {
                from.collect_type_names(out);
                to.collect_type_names(out);
            }
            TypeExpr::Cons { name, args } => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
                for arg in args {
                    arg.collect_type_names(out);
                }
            }
        }
    }
}

/// Вид комбинации — что именно применяется и насколько полно.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombKind {
    /// Полный вызов функции
    FuncCall,
    /// Частичное применение функции
    FuncPartCall,
    /// Полное применение конструктора
    ConsCall,
    /// Частичное применение конструктора
    ConsPartCall,
    /// Прочее применение (зависимостей не вносит)
    Other,
}

impl CombKind {
    /// Ссылается ли комбинация на функцию.
    pub fn is_function_call(self) -> bool {
        matches!(self, CombKind::FuncCall | CombKind::FuncPartCall)
    }

    /// Ссылается ли комбинация на конструктор данных.
    pub fn is_constructor_call(self) -> bool {
        matches!(self, CombKind::ConsCall | CombKind::ConsPartCall)
    }
}

/// Образец в ветке case. Образцы-конструкторы могут быть вложенными.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    /// Конструктор с образцами-аргументами
    Cons { name: QName, args: Vec<Pattern> },
    /// Литеральный образец
    Lit(Literal),
    /// Связывание переменной (всегда совпадает)
    Var(VarIndex),
}

impl Pattern {
    /// Собрать имена конструкторов образца, включая вложенные.
    fn collect_constructors(&self, out: &mut Vec<QName>) {
        match self {
            Pattern::Cons { name, args } => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
                for arg in args {
                    arg.collect_constructors(out);
                }
            }
            Pattern::Lit(_) | Pattern::Var(_) => {}
        }
    }
}

/// Ветка case-выражения: образец и тело.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub pattern: Pattern,
    pub body: Expr,
}

/// Выражение FIR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Ссылка на локальную переменную
    Var(VarIndex),
    /// Литерал
    Lit(Literal),
    /// Комбинация: применение функции или конструктора
    Comb {
        kind: CombKind,
        name: QName,
        args: Vec<Expr>,
    },
    /// Введение свободных (логических) переменных
    Free { vars: Vec<VarIndex>, body: Box<Expr> },
    /// Локальные связывания (возможно взаимно рекурсивные)
    Let {
        bindings: Vec<(VarIndex, Expr)>,
        body: Box<Expr>,
    },
    /// Недетерминированный выбор между двумя альтернативами
    Or(Box<Expr>, Box<Expr>),
    /// Сопоставление с образцом
    Case {
        subject: Box<Expr>,
        branches: Vec<Branch>,
    },
    /// Выражение с аннотацией типа
    Typed { expr: Box<Expr>, ty: TypeExpr },
}

impl Expr {
    /// Полный вызов функции.
    pub fn call(name: QName, args: Vec<Expr>) -> Self {
        Expr::Comb {
            kind: CombKind::FuncCall,
            name,
            args,
        }
    }

    /// Полное применение конструктора.
    pub fn cons(name: QName, args: Vec<Expr>) -> Self {
        Expr::Comb {
            kind: CombKind::ConsCall,
            name,
            args,
        }
    }

    /// Обойти выражение и все его подвыражения, включая тела веток case.
    /// Использует stacker для автоматического расширения стека при глубокой рекурсии.
    pub fn walk(&self, f: &mut dyn FnMut(&Expr)) {
        // Предотвращаем stack overflow при глубокой рекурсии
        // 256KB red zone, 8MB stack growth
        stacker::maybe_grow(256 * 1024, 8 * 1024 * 1024, || {
            f(self);
            match self {
                Expr::Var(_) | Expr::Lit(_) => {}
                Expr::Comb { args, .. } => {
                    for arg in args {
                        arg.walk(f);
                    }
                }
                Expr::Free { body, .. } => body.walk(f),
                Expr::Let { bindings, body } => {
                    for (_, bound) in bindings {
                        bound.walk(f);
                    }
                    body.walk(f);
                }
                Expr::Or(left, right) => {
                    left.walk(f);
                    right.walk(f);
                }
                Expr::Case { subject, branches } => {
                    subject.walk(f);
                    for branch in branches {
                        branch.body.walk(f);
                    }
                }
                Expr::Typed { expr, .. } => expr.walk(f),
            }
        })
    }
}

/// Правило функции: либо тело, либо пометка о внешней реализации.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rule {
    /// Обычное правило: параметры и тело
    Rule { params: Vec<VarIndex>, body: Expr },
    /// Внешняя (нативная) реализация, тело недоступно анализу
    External(String),
}

/// Объявление функции.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncDecl {
    pub name: QName,
    pub arity: u32,
    pub visibility: Visibility,
    /// Объявленный тип функции
    pub ty: TypeExpr,
    pub rule: Rule,
}

impl FuncDecl {
    /// Является ли функция внешней.
    pub fn is_external(&self) -> bool {
        matches!(self.rule, Rule::External(_))
    }

    /// Тело функции, если оно есть.
    pub fn body(&self) -> Option<&Expr> {
        match &self.rule {
            Rule::Rule { body, .. } => Some(body),
            Rule::External(_) => None,
        }
    }

    /// Имена функций, вызываемых из тела (полные и частичные вызовы), без дублей.
    /// Для внешних функций список пуст.
    pub fn called_functions(&self) -> Vec<QName> {
        let mut out = Vec::new();
        if let Some(body) = self.body() {
            body.walk(&mut |expr| {
                if let Expr::Comb { kind, name, .. } = expr {
                    if kind.is_function_call() && !out.contains(name) {
                        out.push(name.clone());
                    }
                }
            });
        }
        out
    }

    /// Имена конструкторов, упомянутых в теле: применения и образцы case.
    pub fn constructor_refs(&self) -> Vec<QName> {
        let mut out = Vec::new();
        if let Some(body) = self.body() {
            body.walk(&mut |expr| match expr {
                Expr::Comb { kind, name, .. } if kind.is_constructor_call() => {
                    if !out.contains(name) {
                        out.push(name.clone());
                    }
                }
                Expr::Case { branches, .. } => {
                    for branch in branches {
                        branch.pattern.collect_constructors(&mut out);
                    }
                }
                _ => {}
            });
        }
        out
    }

    /// Имена типов из объявленной сигнатуры функции.
    pub fn signature_type_names(&self) -> Vec<QName> {
        self.ty.type_names()
    }
}

/// Объявление конструктора данных.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsDecl {
    pub name: QName,
    pub arity: u32,
    pub visibility: Visibility,
    /// Типы полей конструктора
    pub fields: Vec<TypeExpr>,
}

/// Объявление типа: алгебраический тип данных или синоним.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDecl {
    /// Алгебраический тип данных со списком конструкторов
    Data {
        name: QName,
        visibility: Visibility,
        params: Vec<TVarIndex>,
        constructors: Vec<ConsDecl>,
    },
    /// Синоним типа с разворотом
    Synonym {
        name: QName,
        visibility: Visibility,
        params: Vec<TVarIndex>,
        expansion: TypeExpr,
    },
}

impl TypeDecl {
    /// Имя объявленного типа.
    pub fn name(&self) -> &QName {
        match self {
            TypeDecl::Data { name, .. } => name,
            TypeDecl::Synonym { name, .. } => name,
        }
    }

    /// Видимость объявления.
    pub fn visibility(&self) -> Visibility {
        match self {
            TypeDecl::Data { visibility, .. } => *visibility,
            TypeDecl::Synonym { visibility, .. } => *visibility,
        }
    }

    /// Имена типов, на которые объявление ссылается: поля конструкторов
    /// для типа данных, разворот для синонима. Без дублей.
    pub fn referenced_type_names(&self) -> Vec<QName> {
        let mut out = Vec::new();
        match self {
            TypeDecl::Data { constructors, .. } => {
                for cons in constructors {
                    for field in &cons.fields {
                        field.collect_type_names(&mut out);
                    }
                }
            }
            TypeDecl::Synonym { expansion, .. } => {
                expansion.collect_type_names(&mut out);
            }
        }
        out
    }
}

/// Фиксированность инфиксного оператора.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fixity {
    /// Левоассоциативный
    InfixL,
    /// Правоассоциативный
    InfixR,
    /// Неассоциативный
    Infix,
}

/// Объявление инфиксного оператора.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpDecl {
    /// Имя функции, к которой относится оператор
    pub name: QName,
    pub fixity: Fixity,
    pub precedence: u16,
}

/// Модуль FIR: объявления типов, функций и операторов плюс список импортов.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Имя модуля
    pub name: String,
    /// Имена модулей, импортируемых явно
    pub imports: Vec<String>,
    pub types: Vec<TypeDecl>,
    pub functions: Vec<FuncDecl>,
    pub operators: Vec<OpDecl>,
}

impl Program {
    /// Создать пустой модуль с именем.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Найти функцию по квалифицированному имени.
    pub fn function(&self, name: &QName) -> Option<&FuncDecl> {
        self.functions.iter().find(|f| &f.name == name)
    }

    /// Есть ли функция с данным локальным именем на верхнем уровне.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f.name.name == name)
    }

    /// Имена всех экспортируемых функций модуля.
    pub fn public_function_names(&self) -> Vec<QName> {
        self.functions
            .iter()
            .filter(|f| f.visibility == Visibility::Public)
            .map(|f| f.name.clone())
            .collect()
    }

    /// Сериализовать модуль в JSON.
    pub fn to_json(&self) -> FirResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FirError::SerializationError(e.to_string()))
    }

    /// Десериализовать модуль из JSON.
    pub fn from_json(json: &str) -> FirResult<Program> {
        serde_json::from_str(json).map_err(|e| FirError::SerializationError(e.to_string()))
    }
}

/// Базовые типы рантайма, сохраняемые компактором безусловно.
pub fn default_base_types() -> Vec<QName> {
    ["Unit", "Int", "Float", "Char", "Success", "IO"]
        .iter()
        .map(|name| QName::new(PRELUDE, *name))
        .collect()
}

// === Тесты ===
