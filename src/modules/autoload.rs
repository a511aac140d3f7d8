//! Планы автозагрузки.
//!
//! План — упорядоченная последовательность шагов, которые вызывающий код
//! выполняет, чтобы инициализировать модуль. Порядок совпадает с порядком
//! объявлений, дубликаты не удаляются.

use std::fmt;

use log::trace;
use serde::Deserialize;

use super::module::ModuleRef;
use super::predicate::Predicate;
use crate::error::RegistryResult;

/// Имя шага однократного инициализатора.
pub const INITIALIZER_STEP: &str = "initializer";

/// Объявление автозагрузки в конфигурации.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AutoloadDeclaration {
    /// Просто имя метода
    Step(String),
    /// Метод с условием и необязательной альтернативой
    Conditional {
        method: String,
        condition: Predicate,
        #[serde(default)]
        otherwise: Option<String>,
    },
}

impl AutoloadDeclaration {
    pub fn step(method: impl Into<String>) -> Self {
        AutoloadDeclaration::Step(method.into())
    }

    pub fn conditional(
        method: impl Into<String>,
        condition: impl Into<Predicate>,
        otherwise: Option<&str>,
    ) -> Self {
        AutoloadDeclaration::Conditional {
            method: method.into(),
            condition: condition.into(),
            otherwise: otherwise.map(str::to_string),
        }
    }
}

impl From<&str> for AutoloadDeclaration {
    fn from(method: &str) -> Self {
        AutoloadDeclaration::step(method)
    }
}

impl From<String> for AutoloadDeclaration {
    fn from(method: String) -> Self {
        AutoloadDeclaration::Step(method)
    }
}

/// Шаг плана автозагрузки.
#[derive(Debug, Clone)]
pub enum AutoloadStep {
    /// Однократный инициализатор модуля
    Initializer,
    /// Вызов метода
    Method(String),
    /// Ветвление, которое решается при выполнении плана
    Deferred {
        method: String,
        condition: Predicate,
        otherwise: Option<String>,
    },
}

impl fmt::Display for AutoloadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutoloadStep::Initializer => write!(f, "{}", INITIALIZER_STEP),
            AutoloadStep::Method(name) => write!(f, "{}", name),
            AutoloadStep::Deferred {
                method, otherwise, ..
            } => match otherwise {
                Some(otherwise) => write!(f, "({}, ?, {})", method, otherwise),
                None => write!(f, "({}, ?)", method),
            },
        }
    }
}

/// Упорядоченный план автозагрузки.
#[derive(Debug, Clone, Default)]
pub struct AutoloadPlan {
    steps: Vec<AutoloadStep>,
}

impl AutoloadPlan {
    pub fn steps(&self) -> &[AutoloadStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Имена шагов для вывода.
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(ToString::to_string).collect()
    }

    /// Выполнить план на модуле.
    ///
    /// Отложенные условия вычисляются здесь, в момент выполнения.
    /// Возвращает имена действительно выполненных шагов.
    pub fn execute(&self, module: &ModuleRef) -> RegistryResult<Vec<String>> {
        let mut executed = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            trace!("Autoload {}: {}", module.path(), step);

            match step {
                AutoloadStep::Initializer => {
                    module.initialize(&[])?;
                    executed.push(INITIALIZER_STEP.to_string());
                }
                AutoloadStep::Method(name) => {
                    module.call(name, &[])?;
                    executed.push(name.clone());
                }
                AutoloadStep::Deferred {
                    method,
                    condition,
                    otherwise,
                } => {
                    let chosen = if condition.test() {
                        Some(method)
                    } else {
                        otherwise.as_ref()
                    };

                    if let Some(name) = chosen {
                        module.call(name, &[])?;
                        executed.push(name.clone());
                    }
                }
            }
        }

        Ok(executed)
    }
}

/// Построитель планов автозагрузки.
pub struct AutoloadPlanner;

impl AutoloadPlanner {
    /// Построить план.
    ///
    /// Для конструируемого компонента первым шагом всегда идёт
    /// инициализатор. Литеральное условие раскрывается сразу, отложенное
    /// попадает в план целиком.
    pub fn plan(constructible: bool, declarations: &[AutoloadDeclaration]) -> AutoloadPlan {
        let mut steps = Vec::with_capacity(declarations.len() + 1);

        if constructible {
            steps.push(AutoloadStep::Initializer);
        }

        for declaration in declarations {
            match declaration {
                AutoloadDeclaration::Step(method) => {
                    steps.push(AutoloadStep::Method(method.clone()));
                }
                AutoloadDeclaration::Conditional {
                    method,
                    condition: Predicate::Literal(holds),
                    otherwise,
                } => {
                    if *holds {
                        steps.push(AutoloadStep::Method(method.clone()));
                    } else if let Some(otherwise) = otherwise {
                        steps.push(AutoloadStep::Method(otherwise.clone()));
                    }
                }
                AutoloadDeclaration::Conditional {
                    method,
                    condition,
                    otherwise,
                } => {
                    steps.push(AutoloadStep::Deferred {
                        method: method.clone(),
                        condition: condition.clone(),
                        otherwise: otherwise.clone(),
                    });
                }
            }
        }

        AutoloadPlan { steps }
    }
}
