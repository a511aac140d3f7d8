//! Манифесты компонентов в JSON.
//!
//! Манифест описывает компоненты декларативно: конфигурация, поля,
//! которые выставляет конструктор, методы, возвращающие константы,
//! статические значения и супертип.
//!
//! ```json
//! {
//!   "unit": "app",
//!   "components": [
//!     { "name": "Base", "fields": { "ready": true } },
//!     {
//!       "name": "Service",
//!       "extends": "Base",
//!       "configuration": { "name": "app.Service", "autoload": ["start"] },
//!       "methods": { "start": "started" },
//!       "statics": { "VERSION": "1.0" }
//!     }
//!   ]
//! }
//! ```
//!
//! `extends` ищется сначала среди обычных компонентов этого же манифеста,
//! затем среди зарегистрированных модулей.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::{RegistryError, RegistryResult};
use crate::modules::{Component, Configuration, ModuleLoader, UnitExports};
use crate::value::Value;

/// Единица по умолчанию для компонентов манифеста.
pub const DEFAULT_UNIT: &str = "manifest";

/// Описание одного компонента.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComponentSpec {
    /// Имя компонента (и имя экспорта)
    pub name: Option<String>,
    /// Конфигурация; без неё компонент остаётся обычным классом
    pub configuration: Option<Configuration>,
    /// Компонент конструируемый, даже если полей нет
    pub constructible: bool,
    /// Поля, которые выставляет конструктор
    pub fields: BTreeMap<String, Value>,
    /// Методы: имя -> возвращаемое значение
    pub methods: BTreeMap<String, Value>,
    /// Статические значения
    pub statics: BTreeMap<String, Value>,
    /// Супертип: обычный компонент манифеста или путь модуля
    pub extends: Option<String>,
}

/// Манифест компонентов.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Путь единицы, в которую попадут экспорты
    pub unit: Option<String>,
    pub components: Vec<ComponentSpec>,
}

impl Manifest {
    /// Разобрать манифест из строки.
    pub fn parse(source: &str) -> RegistryResult<Self> {
        serde_json::from_str(source).map_err(|e| RegistryError::ManifestError(e.to_string()))
    }

    /// Загрузить манифест из файла.
    pub fn load(path: &std::path::Path) -> RegistryResult<Self> {
        let source = fs::read_to_string(path).map_err(|e| {
            RegistryError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&source).map_err(|e| {
            RegistryError::ManifestError(format!("{}: {}", path.display(), e))
        })
    }

    /// Путь единицы манифеста.
    pub fn unit_path(&self) -> &str {
        self.unit.as_deref().unwrap_or(DEFAULT_UNIT)
    }

    /// Зарегистрировать компоненты в загрузчике.
    ///
    /// Компоненты обрабатываются по одному и в порядке объявления, так что
    /// компонент может наследовать от модуля, объявленного выше.
    pub fn install(&self, loader: &mut ModuleLoader) -> RegistryResult<UnitExports> {
        let unit = self.unit_path().to_string();
        let mut classes: HashMap<String, Rc<Component>> = HashMap::new();
        let mut exports = None;

        for (index, spec) in self.components.iter().enumerate() {
            let component = build_component(spec, &classes, loader)?;
            let export_name = spec
                .name
                .clone()
                .unwrap_or_else(|| format!("component{}", index));

            if component.configuration().is_none() {
                if let Some(name) = component.name() {
                    classes.insert(name.to_string(), component.clone());
                }
            }

            exports = Some(loader.define_unit_now(&unit, &[], move |_, exports, _| {
                exports.insert(export_name, component);
            })?);

            if let Some(err) = loader.last_errors().first() {
                return Err(err.clone());
            }
        }

        match exports {
            Some(exports) => Ok(exports),
            None => loader.define_unit_now(&unit, &[], |_, _, _| {}),
        }
    }
}

fn build_component(
    spec: &ComponentSpec,
    classes: &HashMap<String, Rc<Component>>,
    loader: &ModuleLoader,
) -> RegistryResult<Rc<Component>> {
    let mut builder = match &spec.name {
        Some(name) => Component::builder(name.clone()),
        None => Component::anonymous(),
    };

    if spec.constructible || !spec.fields.is_empty() {
        let fields = spec.fields.clone();
        builder = builder.constructor(move |this, _| {
            for (name, value) in &fields {
                this.set_field(name.clone(), value.clone());
            }
            Ok(())
        });
    }

    for (name, value) in &spec.methods {
        let value = value.clone();
        builder = builder.method(name.clone(), move |_, _| Ok(value.clone()));
    }

    for (name, value) in &spec.statics {
        builder = builder.static_value(name.clone(), value.clone());
    }

    if let Some(supertype) = &spec.extends {
        builder = match classes.get(supertype) {
            Some(class) => builder.extends_class(class.clone()),
            None => {
                let module = loader
                    .require_module(supertype)
                    .filter(|module| module.is_bound())
                    .ok_or_else(|| {
                        RegistryError::ManifestError(format!("unknown supertype '{}'", supertype))
                    })?;
                builder.extends_module(module)
            }
        };
    }

    if let Some(configuration) = &spec.configuration {
        builder = builder.configure(configuration.clone());
    }

    Ok(builder.build())
}
