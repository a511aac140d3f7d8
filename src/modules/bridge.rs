//! Мост наследования.
//!
//! Компонент может наследовать от обычного класса или от уже
//! зарегистрированного модуля. Во втором случае эффективным супертипом
//! становится компонент, из которого построен модуль, а конструктор
//! наследника должен один раз вызвать однократную инициализацию предка.
//!
//! Отношение наследования вычисляется один раз при регистрации и
//! описывается `Derivation`: упорядоченный список предков (от базового к
//! производному) и таблица разрешения методов. Конструирование идёт в две
//! фазы:
//!
//! 1. [`Derivation::init_ancestors`] — конструкторы всех предков, от
//!    базового к ближайшему, с производным модулем в роли получателя;
//! 2. [`Derivation::init_self`] — собственный конструктор компонента.
//!
//! Между конструированиями никакого состояния не остаётся, поэтому
//! многоуровневые цепочки ведут себя одинаково при любом числе уровней.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::trace;

use super::component::{Component, Extends, Method, StaticMember};
use super::module::ModuleRef;
use crate::error::{RegistryError, RegistryResult};
use crate::value::Value;

/// Как предок подключён к цепочке.
#[derive(Debug, Clone)]
pub enum Extension {
    /// Обычный класс: только структурное наследование
    Normal,
    /// Предок — зарегистрированный модуль
    Bridged(ModuleRef),
}

/// Предок в цепочке наследования.
#[derive(Debug, Clone)]
pub struct Ancestor {
    component: Rc<Component>,
    extension: Extension,
}

impl Ancestor {
    pub fn component(&self) -> &Rc<Component> {
        &self.component
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn is_bridged(&self) -> bool {
        matches!(self.extension, Extension::Bridged(_))
    }
}

/// Результат первой фазы конструирования; передаётся во вторую фазу.
#[derive(Debug, Clone, Default)]
pub struct AncestorInit {
    fired: Vec<String>,
}

/// Отчёт о конструировании: чьи конструкторы сработали и в каком порядке.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructionReport {
    pub fired: Vec<String>,
}

/// Описание отношения наследования компонента.
#[derive(Debug, Clone)]
pub struct Derivation {
    component: Rc<Component>,
    ancestors: Vec<Ancestor>,
}

impl Derivation {
    /// Вычислить цепочку наследования.
    ///
    /// Модуль-предок без привязанного компонента — ошибка: наследовать
    /// ещё нечего.
    pub fn derive(component: &Rc<Component>) -> RegistryResult<Self> {
        let mut ancestors = Vec::new();
        let mut current = component.extends().cloned();

        while let Some(extends) = current {
            let ancestor = match extends {
                Extends::Class(class) => Ancestor {
                    component: class,
                    extension: Extension::Normal,
                },
                Extends::Module(module) => {
                    let class = module
                        .component()
                        .ok_or_else(|| RegistryError::UnboundAncestor(module.path().to_string()))?;
                    trace!("{} bridges into module {}", component.label(), module.path());
                    Ancestor {
                        component: class,
                        extension: Extension::Bridged(module),
                    }
                }
            };
            current = ancestor.component.extends().cloned();
            ancestors.push(ancestor);
        }

        ancestors.reverse();

        Ok(Self {
            component: component.clone(),
            ancestors,
        })
    }

    pub fn component(&self) -> &Rc<Component> {
        &self.component
    }

    /// Предки от базового к ближайшему.
    pub fn ancestors(&self) -> &[Ancestor] {
        &self.ancestors
    }

    /// Есть ли в цепочке хоть один конструктор.
    pub fn is_constructible(&self) -> bool {
        self.component.constructor().is_some()
            || self
                .ancestors
                .iter()
                .any(|ancestor| ancestor.component.constructor().is_some())
    }

    /// Таблица разрешения методов: от базового предка к самому компоненту,
    /// более позднее определение перекрывает раннее.
    pub fn method_table(&self) -> BTreeMap<&str, &Method> {
        self.ancestors
            .iter()
            .map(|ancestor| &ancestor.component)
            .chain(std::iter::once(&self.component))
            .flat_map(|component| component.methods())
            .map(|(name, method)| (name.as_str(), method))
            .collect()
    }

    /// Статические члены всей цепочки, от базового предка к самому
    /// компоненту. У предка-модуля берутся статические члены его
    /// компонента. Самое производное определение побеждает.
    pub fn static_members(&self) -> Vec<(&str, &StaticMember)> {
        self.ancestors
            .iter()
            .map(|ancestor| &ancestor.component)
            .chain(std::iter::once(&self.component))
            .flat_map(|component| component.statics())
            .map(|(name, member)| (name.as_str(), member))
            .collect()
    }

    /// Первая фаза: конструкторы предков.
    pub fn init_ancestors(
        &self,
        receiver: &ModuleRef,
        args: &[Value],
    ) -> RegistryResult<AncestorInit> {
        let mut phase = AncestorInit::default();

        for ancestor in &self.ancestors {
            if let Some(constructor) = ancestor.component.constructor() {
                trace!(
                    "Constructing ancestor {} of {}",
                    ancestor.component.label(),
                    receiver.path()
                );
                constructor(receiver, args)?;
                phase.fired.push(ancestor.component.label().to_string());
            }
        }

        Ok(phase)
    }

    /// Вторая фаза: собственный конструктор.
    pub fn init_self(
        &self,
        receiver: &ModuleRef,
        args: &[Value],
        ancestors: AncestorInit,
    ) -> RegistryResult<ConstructionReport> {
        let mut fired = ancestors.fired;

        if let Some(constructor) = self.component.constructor() {
            constructor(receiver, args)?;
            fired.push(self.component.label().to_string());
        }

        Ok(ConstructionReport { fired })
    }

    /// Обе фазы подряд.
    pub fn construct(&self, receiver: &ModuleRef, args: &[Value]) -> RegistryResult<ConstructionReport> {
        let ancestors = self.init_ancestors(receiver, args)?;
        self.init_self(receiver, args, ancestors)
    }
}
