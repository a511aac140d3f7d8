//! Привязка компонентов к модулям.
//!
//! Каждый экспорт единицы либо становится модулем (если у компонента есть
//! маркер конфигурации), либо замораживается как обычный экспорт.

use std::rc::Rc;

use log::{debug, error};

use super::autoload::AutoloadPlanner;
use super::bridge::Derivation;
use super::component::{Component, Configuration};
use super::exports::{Export, Exports, ModuleAlias};
use super::module::ModuleRef;
use super::path::Path;
use super::registry::ModuleRegistry;
use crate::error::{RegistryError, RegistryResult};

/// Привязчик компонентов.
pub struct ComponentBinder<'r> {
    registry: &'r mut ModuleRegistry,
}

impl<'r> ComponentBinder<'r> {
    pub fn new(registry: &'r mut ModuleRegistry) -> Self {
        Self { registry }
    }

    /// Обработать все незамороженные экспорты.
    ///
    /// Ошибка одного экспорта не прерывает обработку остальных; ошибки
    /// логируются и возвращаются. Экспорт, который не удалось привязать,
    /// замораживается как обычный компонент.
    pub fn process(&mut self, exports: &mut Exports) -> Vec<RegistryError> {
        let mut errors = Vec::new();

        for (name, export) in exports.unfrozen() {
            let frozen = match export {
                Export::Component(component) => {
                    let bound = component
                        .configuration()
                        .map(|configuration| self.bind_export(&name, &component, configuration));

                    match bound {
                        Some(Ok(module)) => Export::Module(ModuleAlias::new(module.path())),
                        Some(Err(err)) => {
                            error!("Failed to bind export '{}': {}", name, err);
                            errors.push(err);
                            Export::Component(component)
                        }
                        None => Export::Component(component),
                    }
                }
                other => other,
            };
            exports.freeze(&name, frozen);
        }

        errors
    }

    /// Привязать компонент вне единицы.
    ///
    /// Компонент без маркера модулем не становится: `Ok(None)`.
    pub fn bind(&mut self, component: &Rc<Component>) -> RegistryResult<Option<ModuleRef>> {
        match component.configuration() {
            Some(configuration) => self
                .bind_export(component.label(), component, configuration)
                .map(Some),
            None => Ok(None),
        }
    }

    fn bind_export(
        &mut self,
        export_name: &str,
        component: &Rc<Component>,
        configuration: &Configuration,
    ) -> RegistryResult<ModuleRef> {
        let path = effective_path(export_name, component, configuration)?;
        let derivation = Rc::new(Derivation::derive(component)?);

        let module = self.registry.get_or_create(&path);
        debug!("Binding {} to module {}", component.label(), path);

        let constructible = derivation.is_constructible();
        module.set_autoload_plan(AutoloadPlanner::plan(constructible, &configuration.autoload));
        if constructible {
            module.set_initializer(derivation.clone());
        }

        for (name, method) in derivation.method_table() {
            module.bind_method(name, method);
        }

        for (name, member) in derivation.static_members() {
            module.bind_static(name, member);
        }

        module.attach_component(component);

        Ok(module)
    }
}

/// Путь модуля: явное имя из конфигурации или имя компонента.
fn effective_path(
    export_name: &str,
    component: &Component,
    configuration: &Configuration,
) -> RegistryResult<Path> {
    let name = configuration
        .name
        .as_deref()
        .or_else(|| component.name())
        .ok_or_else(|| RegistryError::UnresolvableName(export_name.to_string()))?;
    Path::parse(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::autoload::AutoloadDeclaration;
    use crate::value::Value;

    #[test]
    fn test_bind_named_component() {
        let mut registry = ModuleRegistry::new();
        let foo = Component::builder("Foo")
            .constructor(|_, _| Ok(()))
            .method("bar", |_, _| Ok(Value::from("bar")))
            .configure(Configuration::new().with_autoload(["bar"]))
            .build();

        let module = ComponentBinder::new(&mut registry).bind(&foo).unwrap().unwrap();

        assert_eq!(module.path().to_string(), "Foo");
        assert_eq!(module.autoload_plan().step_names(), ["initializer", "bar"]);
        assert!(module.has_method("bar"));
        assert_eq!(registry.require_module("Foo"), Some(module));
    }

    #[test]
    fn test_configured_name_wins() {
        let mut registry = ModuleRegistry::new();
        let foo = Component::builder("Foo")
            .configure(Configuration::named("app/core.Foo"))
            .build();

        let module = ComponentBinder::new(&mut registry).bind(&foo).unwrap().unwrap();
        assert_eq!(module.path().to_string(), "app.core.Foo");
        assert!(registry.require_module("Foo").is_none());
    }

    #[test]
    fn test_plain_component_is_not_bound() {
        let mut registry = ModuleRegistry::new();
        let plain = Component::builder("Plain").build();

        assert!(ComponentBinder::new(&mut registry).bind(&plain).unwrap().is_none());
        assert!(registry.require_module("Plain").is_none());
    }

    #[test]
    fn test_anonymous_component_error_does_not_stop_others() {
        let mut registry = ModuleRegistry::new();
        let mut exports = Exports::new();
        exports.insert("Nameless", Component::anonymous().register().build());
        exports.insert("Named", Component::builder("Named").register().build());
        exports.insert("answer", Value::Int(42));

        let errors = ComponentBinder::new(&mut registry).process(&mut exports);

        assert_eq!(errors, [RegistryError::UnresolvableName("Nameless".to_string())]);
        assert!(exports.module("Named", &registry).is_some());
        assert!(exports.is_frozen("answer"));
        assert!(exports.is_frozen("Nameless"));
        assert!(matches!(exports.get("Nameless"), Some(Export::Component(_))));
    }

    #[test]
    fn test_failed_export_is_not_reprocessed() {
        let mut registry = ModuleRegistry::new();
        let mut exports = Exports::new();
        exports.insert("Nameless", Component::anonymous().register().build());

        let mut binder = ComponentBinder::new(&mut registry);
        assert_eq!(binder.process(&mut exports).len(), 1);
        assert!(binder.process(&mut exports).is_empty());
        assert!(!exports.insert("Nameless", Value::Unit));
    }

    #[test]
    fn test_rebinding_is_additive() {
        let mut registry = ModuleRegistry::new();
        let first = Component::builder("Foo")
            .method("a", |_, _| Ok(Value::Int(1)))
            .method("b", |_, _| Ok(Value::Int(1)))
            .register()
            .build();
        let second = Component::anonymous()
            .method("b", |_, _| Ok(Value::Int(2)))
            .configure(Configuration::named("Foo").with_autoload([AutoloadDeclaration::step("b")]))
            .build();

        let mut binder = ComponentBinder::new(&mut registry);
        let module = binder.bind(&first).unwrap().unwrap();
        binder.bind(&second).unwrap();

        assert_eq!(module.call("a", &[]).unwrap(), Value::Int(1));
        assert_eq!(module.call("b", &[]).unwrap(), Value::Int(2));
        assert_eq!(module.autoload_plan().step_names(), ["b"]);
        assert_eq!(module.component().unwrap().name(), Some("Foo"));
    }
}
