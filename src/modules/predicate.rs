//! Предикаты: булево значение или отложенная проверка без аргументов.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Deserializer};

/// Условие регистрации модуля или ветки автозагрузки.
#[derive(Clone)]
pub enum Predicate {
    /// Уже вычисленное значение
    Literal(bool),
    /// Проверка, вычисляемая в момент использования
    Deferred(Rc<dyn Fn() -> bool>),
}

impl Predicate {
    /// Создать отложенный предикат.
    pub fn deferred(test: impl Fn() -> bool + 'static) -> Self {
        Predicate::Deferred(Rc::new(test))
    }

    /// Вычислить предикат.
    pub fn test(&self) -> bool {
        match self {
            Predicate::Literal(value) => *value,
            Predicate::Deferred(test) => test(),
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Predicate::Deferred(_))
    }
}

/// Вычислить необязательный предикат: отсутствие условия означает `true`.
pub fn evaluate(predicate: Option<&Predicate>) -> bool {
    predicate.map_or(true, Predicate::test)
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Predicate::Literal(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Predicate::Deferred(_) => write!(f, "Deferred(<fn>)"),
        }
    }
}

// В JSON предикат может быть только литералом.
impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bool::deserialize(deserializer).map(Predicate::Literal)
    }
}
