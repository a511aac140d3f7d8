//! Компоненты — шаблоны, из которых строятся модули.
//!
//! Компонент похож на класс: у него есть конструктор, таблица методов,
//! статические члены и, возможно, супертип. Конфигурация (`Configuration`)
//! служит маркером: компонент без неё экспортируется как есть и модулем
//! не становится.

use std::fmt;
use std::rc::Rc;

use log::debug;
use serde::Deserialize;

use super::autoload::AutoloadDeclaration;
use super::module::ModuleRef;
use super::predicate::{self, Predicate};
use crate::error::RegistryResult;
use crate::value::Value;

/// Метод экземпляра или статическая функция. Первый аргумент — получатель.
pub type Method = Rc<dyn Fn(&ModuleRef, &[Value]) -> RegistryResult<Value>>;

/// Конструктор компонента.
pub type Constructor = Rc<dyn Fn(&ModuleRef, &[Value]) -> RegistryResult<()>>;

/// Статический член компонента.
#[derive(Clone)]
pub enum StaticMember {
    /// Значение копируется в модуль как есть
    Value(Value),
    /// Функция привязывается к модулю
    Function(Method),
}

/// Супертип компонента.
#[derive(Clone)]
pub enum Extends {
    /// Обычный класс
    Class(Rc<Component>),
    /// Зарегистрированный модуль-синглтон
    Module(ModuleRef),
}

/// Конфигурация модуля.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Путь модуля (по умолчанию — имя компонента)
    pub name: Option<String>,
    /// Объявления автозагрузки
    pub autoload: Vec<AutoloadDeclaration>,
    /// Условие регистрации
    pub condition: Option<Predicate>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Конфигурация с явным путём.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_autoload<I, D>(mut self, declarations: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<AutoloadDeclaration>,
    {
        self.autoload = declarations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_condition(mut self, condition: impl Into<Predicate>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Шаблон модуля.
pub struct Component {
    name: Option<String>,
    constructor: Option<Constructor>,
    methods: Vec<(String, Method)>,
    statics: Vec<(String, StaticMember)>,
    extends: Option<Extends>,
    configuration: Option<Configuration>,
}

impl Component {
    /// Начать описание именованного компонента.
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder::new(Some(name.into()))
    }

    /// Начать описание безымянного компонента.
    pub fn anonymous() -> ComponentBuilder {
        ComponentBuilder::new(None)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Имя для логов и отчётов.
    pub fn label(&self) -> &str {
        self.name().unwrap_or("<anonymous>")
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    /// Таблица методов в порядке объявления.
    pub fn methods(&self) -> &[(String, Method)] {
        &self.methods
    }

    /// Собственные статические члены в порядке объявления.
    pub fn statics(&self) -> &[(String, StaticMember)] {
        &self.statics
    }

    pub fn extends(&self) -> Option<&Extends> {
        self.extends.as_ref()
    }

    /// Маркер конфигурации.
    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<&str> = self.methods.iter().map(|(name, _)| name.as_str()).collect();
        let statics: Vec<&str> = self.statics.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("constructible", &self.constructor.is_some())
            .field("methods", &methods)
            .field("statics", &statics)
            .field("configuration", &self.configuration)
            .finish()
    }
}

/// Построитель компонента.
pub struct ComponentBuilder {
    component: Component,
}

impl ComponentBuilder {
    fn new(name: Option<String>) -> Self {
        Self {
            component: Component {
                name,
                constructor: None,
                methods: Vec::new(),
                statics: Vec::new(),
                extends: None,
                configuration: None,
            },
        }
    }

    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&ModuleRef, &[Value]) -> RegistryResult<()> + 'static,
    {
        self.component.constructor = Some(Rc::new(constructor));
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&ModuleRef, &[Value]) -> RegistryResult<Value> + 'static,
    {
        self.component.methods.push((name.into(), Rc::new(method)));
        self
    }

    pub fn static_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.component
            .statics
            .push((name.into(), StaticMember::Value(value.into())));
        self
    }

    pub fn static_fn<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&ModuleRef, &[Value]) -> RegistryResult<Value> + 'static,
    {
        self.component
            .statics
            .push((name.into(), StaticMember::Function(Rc::new(function))));
        self
    }

    /// Наследовать от обычного класса.
    pub fn extends_class(mut self, class: Rc<Component>) -> Self {
        self.component.extends = Some(Extends::Class(class));
        self
    }

    /// Наследовать от зарегистрированного модуля.
    pub fn extends_module(mut self, module: ModuleRef) -> Self {
        self.component.extends = Some(Extends::Module(module));
        self
    }

    /// Прикрепить конфигурацию.
    ///
    /// Если условие конфигурации ложно, маркер не ставится и компонент
    /// остаётся обычным классом.
    pub fn configure(mut self, configuration: Configuration) -> Self {
        if predicate::evaluate(configuration.condition.as_ref()) {
            self.component.configuration = Some(configuration);
        } else {
            debug!(
                "Skipping registration of {}: condition is false",
                self.component.label()
            );
        }
        self
    }

    /// Зарегистрировать с конфигурацией по умолчанию.
    pub fn register(self) -> Self {
        self.configure(Configuration::default())
    }

    pub fn build(self) -> Rc<Component> {
        Rc::new(self.component)
    }
}
