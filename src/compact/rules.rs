//! Правила скрытых зависимостей.
//!
//! Часть зависимостей между функциями не видна в телах как вызовы:
//! их вносят более поздние проходы компиляции или рантайм. Правила
//! описывают такие связи декларативно, и движок достижимости учитывает
//! их наравне с явными вызовами.

use serde::{Deserialize, Serialize};

use crate::fir::{QName, PRELUDE};

/// Правило обязательного включения функции.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequirementRule {
    /// При загрузке модуля функция включается всегда, даже если её
    /// никто не вызывает
    AlwaysRequired { module: String, function: QName },
    /// Достижимость первой функции влечёт достижимость второй
    Requires { function: QName, implied: QName },
}

impl RequirementRule {
    /// Функция, обязательная при каждой загрузке модуля.
    pub fn always_required(module: impl Into<String>, function: QName) -> Self {
        RequirementRule::AlwaysRequired {
            module: module.into(),
            function,
        }
    }

    /// Скрытая зависимость между двумя функциями.
    pub fn requires(function: QName, implied: QName) -> Self {
        RequirementRule::Requires { function, implied }
    }
}

/// Набор правил с запросами, которые задаёт движок достижимости.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RequirementRule>,
}

impl RuleSet {
    /// Набор из явного списка правил.
    pub fn new(rules: Vec<RequirementRule>) -> Self {
        Self { rules }
    }

    /// Правила по умолчанию плюс пользовательские.
    pub fn with_defaults(extra: Vec<RequirementRule>) -> Self {
        let mut rules = default_rules();
        rules.extend(extra);
        Self { rules }
    }

    /// Функции, обязательные сразу после загрузки модуля.
    pub fn always_required_in(&self, module: &str) -> Vec<QName> {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                RequirementRule::AlwaysRequired {
                    module: m,
                    function,
                } if m == module => Some(function.clone()),
                _ => None,
            })
            .collect()
    }

    /// Функции, влекомые достижимостью данной.
    pub fn implied_by(&self, function: &QName) -> Vec<QName> {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                RequirementRule::Requires {
                    function: f,
                    implied,
                } if f == function => Some(implied.clone()),
                _ => None,
            })
            .collect()
    }

    /// Количество правил в наборе.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Пуст ли набор.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Скрытые зависимости, которые вносит рантаймовая поддержка языка.
pub fn default_rules() -> Vec<RequirementRule> {
    vec![
        // Частичные применения опускаются в вызовы apply
        RequirementRule::always_required(PRELUDE, QName::new(PRELUDE, "apply")),
        // Равенство и унификация опускаются в конъюнкцию ограничений
        RequirementRule::requires(QName::new(PRELUDE, "=="), QName::new(PRELUDE, "&")),
        RequirementRule::requires(QName::new(PRELUDE, "=:="), QName::new(PRELUDE, "&")),
        // Сокетный примитив подразумевает цикл приёма соединений
        RequirementRule::requires(QName::new("net", "listenOn"), QName::new("net", "serverLoop")),
    ]
}
