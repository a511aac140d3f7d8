//! Модули-синглтоны.
//!
//! Модуль живёт столько же, сколько реестр, и однозначно определяется
//! своим путём. `ModuleRef` — разделяемая ссылка на модуль; две ссылки
//! равны, только если указывают на один и тот же модуль.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{debug, warn};

use super::autoload::AutoloadPlan;
use super::bridge::{ConstructionReport, Derivation};
use super::component::{Component, Method, StaticMember};
use super::path::Path;
use crate::error::{RegistryError, RegistryResult};
use crate::value::Value;

/// Метод, привязанный к модулю-получателю.
#[derive(Clone)]
pub struct BoundMethod {
    name: String,
    receiver: Weak<RefCell<Module>>,
    method: Method,
}

impl BoundMethod {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Вызвать метод с привязанным получателем.
    pub fn invoke(&self, args: &[Value]) -> RegistryResult<Value> {
        let receiver = self
            .receiver
            .upgrade()
            .map(ModuleRef)
            .ok_or_else(|| RegistryError::ReceiverDropped(self.name.clone()))?;
        (self.method)(&receiver, args)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<bound {}>", self.name)
    }
}

/// Статическое свойство модуля.
#[derive(Debug, Clone)]
pub enum BoundProperty {
    Value(Value),
    Function(BoundMethod),
}

/// Однократный инициализатор.
#[derive(Clone)]
pub(crate) struct Initializer {
    derivation: Rc<Derivation>,
}

/// Модуль-синглтон.
pub struct Module {
    path: Path,
    methods: BTreeMap<String, BoundMethod>,
    properties: BTreeMap<String, BoundProperty>,
    autoload_plan: AutoloadPlan,
    initializer: Option<Initializer>,
    component: Option<Rc<Component>>,
    fields: BTreeMap<String, Value>,
    initialized: bool,
}

impl Module {
    fn new(path: Path) -> Self {
        Self {
            path,
            methods: BTreeMap::new(),
            properties: BTreeMap::new(),
            autoload_plan: AutoloadPlan::default(),
            initializer: None,
            component: None,
            fields: BTreeMap::new(),
            initialized: false,
        }
    }
}

/// Разделяемая ссылка на модуль.
#[derive(Clone)]
pub struct ModuleRef(Rc<RefCell<Module>>);

impl ModuleRef {
    pub(crate) fn new(path: Path) -> Self {
        Self(Rc::new(RefCell::new(Module::new(path))))
    }

    pub fn path(&self) -> Path {
        self.0.borrow().path.clone()
    }

    /// Привязан ли к модулю компонент.
    pub fn is_bound(&self) -> bool {
        self.0.borrow().component.is_some()
    }

    /// Компонент, из которого построен модуль.
    pub fn component(&self) -> Option<Rc<Component>> {
        self.0.borrow().component.clone()
    }

    pub fn method(&self, name: &str) -> Option<BoundMethod> {
        self.0.borrow().methods.get(name).cloned()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.0.borrow().methods.contains_key(name)
    }

    pub fn method_names(&self) -> Vec<String> {
        self.0.borrow().methods.keys().cloned().collect()
    }

    /// Вызвать метод модуля.
    pub fn call(&self, name: &str, args: &[Value]) -> RegistryResult<Value> {
        // Заимствование отпускается до вызова: метод может менять модуль.
        let method = self.method(name).ok_or_else(|| RegistryError::MethodNotFound {
            module: self.path().to_string(),
            method: name.to_string(),
        })?;
        method.invoke(args)
    }

    pub fn property(&self, name: &str) -> Option<BoundProperty> {
        self.0.borrow().properties.get(name).cloned()
    }

    pub fn property_names(&self) -> Vec<String> {
        self.0.borrow().properties.keys().cloned().collect()
    }

    /// Вызвать статическую функцию модуля.
    pub fn call_property(&self, name: &str, args: &[Value]) -> RegistryResult<Value> {
        match self.property(name) {
            Some(BoundProperty::Function(function)) => function.invoke(args),
            Some(BoundProperty::Value(_)) => Err(RegistryError::NotCallable {
                module: self.path().to_string(),
                property: name.to_string(),
            }),
            None => Err(RegistryError::MethodNotFound {
                module: self.path().to_string(),
                method: name.to_string(),
            }),
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.borrow().fields.get(name).cloned()
    }

    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.borrow_mut().fields.insert(name.into(), value.into());
    }

    pub fn autoload_plan(&self) -> AutoloadPlan {
        self.0.borrow().autoload_plan.clone()
    }

    pub fn is_constructible(&self) -> bool {
        self.0.borrow().initializer.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.0.borrow().initialized
    }

    /// Запустить однократный инициализатор.
    pub fn initialize(&self, args: &[Value]) -> RegistryResult<ConstructionReport> {
        let initializer = {
            let mut module = self.0.borrow_mut();
            if module.initialized {
                return Err(RegistryError::AlreadyInitialized(module.path.to_string()));
            }
            let initializer = module.initializer.clone().ok_or_else(|| {
                RegistryError::MethodNotFound {
                    module: module.path.to_string(),
                    method: super::autoload::INITIALIZER_STEP.to_string(),
                }
            })?;
            module.initialized = true;
            initializer
        };

        debug!("Initializing module {}", self.path());
        let report = initializer.derivation.construct(self, args);
        if report.is_err() {
            // Неудачная инициализация не считается выполненной
            self.0.borrow_mut().initialized = false;
        }
        report
    }

    /// Выполнить план автозагрузки.
    pub fn run_autoload(&self) -> RegistryResult<Vec<String>> {
        let plan = self.autoload_plan();
        plan.execute(self)
    }

    pub fn ptr_eq(&self, other: &ModuleRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // === Заполнение модуля при привязке ===

    pub(crate) fn set_autoload_plan(&self, plan: AutoloadPlan) {
        self.0.borrow_mut().autoload_plan = plan;
    }

    pub(crate) fn set_initializer(&self, derivation: Rc<Derivation>) {
        self.0.borrow_mut().initializer = Some(Initializer { derivation });
    }

    pub(crate) fn bind_method(&self, name: &str, method: &Method) {
        let bound = self.bound(name, method);
        self.0.borrow_mut().methods.insert(name.to_string(), bound);
    }

    pub(crate) fn bind_static(&self, name: &str, member: &StaticMember) {
        let property = match member {
            StaticMember::Value(value) => BoundProperty::Value(value.clone()),
            StaticMember::Function(function) => BoundProperty::Function(self.bound(name, function)),
        };
        self.0.borrow_mut().properties.insert(name.to_string(), property);
    }

    /// Прикрепить обратную ссылку на компонент. Первая привязка побеждает.
    pub(crate) fn attach_component(&self, component: &Rc<Component>) -> bool {
        let mut module = self.0.borrow_mut();
        if let Some(existing) = &module.component {
            if !Rc::ptr_eq(existing, component) {
                warn!(
                    "Module {} is already bound to {}; keeping it, {} only adds members",
                    module.path,
                    existing.label(),
                    component.label()
                );
            }
            return false;
        }
        module.component = Some(component.clone());
        true
    }

    fn bound(&self, name: &str, method: &Method) -> BoundMethod {
        BoundMethod {
            name: name.to_string(),
            receiver: Rc::downgrade(&self.0),
            method: method.clone(),
        }
    }
}

impl PartialEq for ModuleRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ModuleRef {}

impl fmt::Debug for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(module) => f
                .debug_struct("Module")
                .field("path", &module.path.to_string())
                .field("bound", &module.component.is_some())
                .field("methods", &module.methods.keys().collect::<Vec<_>>())
                .field("autoload", &module.autoload_plan.step_names())
                .finish(),
            Err(_) => write!(f, "Module(<borrowed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::component::Component;

    fn module(name: &str) -> ModuleRef {
        ModuleRef::new(Path::parse(name).unwrap())
    }

    #[test]
    fn test_new_module_is_empty() {
        let module = module("app.Empty");
        assert!(!module.is_bound());
        assert!(!module.is_constructible());
        assert!(module.method_names().is_empty());
        assert!(module.autoload_plan().is_empty());
    }

    #[test]
    fn test_bound_method_uses_module_as_receiver() {
        let module = module("app.Counter");
        let method: Method = Rc::new(|this: &ModuleRef, args: &[Value]| {
            let step = args.first().and_then(Value::as_int).unwrap_or(1);
            let next = this.field("count").and_then(|v| v.as_int()).unwrap_or(0) + step;
            this.set_field("count", next);
            Ok(Value::Int(next))
        });
        module.bind_method("inc", &method);

        assert_eq!(module.call("inc", &[]).unwrap(), Value::Int(1));
        assert_eq!(module.call("inc", &[Value::Int(5)]).unwrap(), Value::Int(6));
        assert_eq!(module.field("count"), Some(Value::Int(6)));
    }

    #[test]
    fn test_missing_method() {
        let module = module("app.Nothing");
        let err = module.call("run", &[]).unwrap_err();
        assert!(matches!(err, RegistryError::MethodNotFound { .. }));
    }

    #[test]
    fn test_method_error_propagates() {
        let module = module("app.Failing");
        let method: Method = Rc::new(|_: &ModuleRef, _: &[Value]| {
            Err(RegistryError::Invocation("disk is full".to_string()))
        });
        module.bind_method("save", &method);

        assert_eq!(
            module.call("save", &[]).unwrap_err(),
            RegistryError::Invocation("disk is full".to_string())
        );
    }

    #[test]
    fn test_receiver_dropped() {
        let method: Method = Rc::new(|_: &ModuleRef, _: &[Value]| Ok(Value::Unit));
        let bound = {
            let module = module("app.Gone");
            module.bind_method("ping", &method);
            module.method("ping").unwrap()
        };

        assert_eq!(
            bound.invoke(&[]).unwrap_err(),
            RegistryError::ReceiverDropped("ping".to_string())
        );
    }

    #[test]
    fn test_failed_initializer_can_be_retried() {
        let attempts = Rc::new(std::cell::Cell::new(0));
        let counter = attempts.clone();
        let flaky = Component::builder("Flaky")
            .constructor(move |this, _| {
                counter.set(counter.get() + 1);
                this.set_field("attempt", counter.get() as i64);
                if counter.get() == 1 {
                    return Err(RegistryError::Invocation("boom".to_string()));
                }
                Ok(())
            })
            .build();
        let module = module("app.Flaky");
        module.set_initializer(Rc::new(Derivation::derive(&flaky).unwrap()));

        assert_eq!(
            module.initialize(&[]).unwrap_err(),
            RegistryError::Invocation("boom".to_string())
        );
        assert!(!module.is_initialized());

        let report = module.initialize(&[]).unwrap();
        assert_eq!(report.fired, ["Flaky"]);
        assert!(module.is_initialized());
        assert_eq!(module.field("attempt"), Some(Value::Int(2)));
        assert!(matches!(
            module.initialize(&[]),
            Err(RegistryError::AlreadyInitialized(_))
        ));
        assert_eq!(attempts.get(), 2);
    }

    #[test]
    fn test_static_value_is_not_callable() {
        let module = module("app.Config");
        module.bind_static("VERSION", &StaticMember::Value(Value::from("1.0")));

        assert!(matches!(
            module.property("VERSION"),
            Some(BoundProperty::Value(Value::String(_)))
        ));
        assert!(matches!(
            module.call_property("VERSION", &[]),
            Err(RegistryError::NotCallable { .. })
        ));
    }

    #[test]
    fn test_first_component_wins() {
        let module = module("app.Foo");
        let first = Component::builder("First").build();
        let second = Component::builder("Second").build();

        assert!(module.attach_component(&first));
        assert!(!module.attach_component(&second));
        assert_eq!(module.component().unwrap().name(), Some("First"));
    }

    #[test]
    fn test_identity() {
        let a = module("app.A");
        let also_a = a.clone();
        let other = module("app.A");

        assert_eq!(a, also_a);
        assert_ne!(a, other);
    }
}
