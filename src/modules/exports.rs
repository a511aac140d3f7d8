//! Контейнер экспортов единицы.
//!
//! После обработки биндером каждое имя замораживается: запись в него
//! игнорируется. Экспорт-модуль хранится как псевдоним по пути и при
//! каждом чтении заново разрешается в живой модуль.

use std::fmt;
use std::rc::Rc;

use log::warn;

use super::component::Component;
use super::module::ModuleRef;
use super::path::Path;
use super::registry::ModuleRegistry;
use crate::value::Value;

/// Живой псевдоним модуля.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleAlias {
    path: Path,
}

impl ModuleAlias {
    pub fn new(path: Path) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Разрешить псевдоним в текущий модуль.
    pub fn resolve(&self, registry: &ModuleRegistry) -> Option<ModuleRef> {
        registry.lookup(&self.path)
    }
}

/// Экспортируемое значение.
#[derive(Clone)]
pub enum Export {
    /// Данные
    Value(Value),
    /// Компонент (модулем станет, только если у него есть маркер)
    Component(Rc<Component>),
    /// Псевдоним зарегистрированного модуля
    Module(ModuleAlias),
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Export::Component(component) => write!(f, "Component({})", component.label()),
            Export::Module(alias) => write!(f, "Module({})", alias.path()),
        }
    }
}

impl From<Value> for Export {
    fn from(value: Value) -> Self {
        Export::Value(value)
    }
}

impl From<Rc<Component>> for Export {
    fn from(component: Rc<Component>) -> Self {
        Export::Component(component)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    export: Export,
    frozen: bool,
}

/// Экспорты единицы в порядке добавления.
#[derive(Debug, Clone, Default)]
pub struct Exports {
    entries: Vec<Entry>,
}

impl Exports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Записать экспорт. Запись в замороженное имя игнорируется.
    pub fn insert(&mut self, name: impl Into<String>, export: impl Into<Export>) -> bool {
        let name = name.into();
        let export = export.into();

        match self.entries.iter().position(|entry| entry.name == name) {
            Some(index) if self.entries[index].frozen => {
                warn!("Ignoring write to frozen export '{}'", name);
                false
            }
            Some(index) => {
                self.entries[index].export = export;
                true
            }
            None => {
                self.entries.push(Entry {
                    name,
                    export,
                    frozen: false,
                });
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.export)
    }

    /// Прочитать экспорт-значение.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            Export::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Прочитать экспорт-модуль через живой псевдоним.
    pub fn module(&self, name: &str, registry: &ModuleRegistry) -> Option<ModuleRef> {
        match self.get(name)? {
            Export::Module(alias) => alias.resolve(registry),
            _ => None,
        }
    }

    pub fn is_frozen(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.name == name && entry.frozen)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Незамороженные экспорты в порядке добавления.
    pub(crate) fn unfrozen(&self) -> Vec<(String, Export)> {
        self.entries
            .iter()
            .filter(|entry| !entry.frozen)
            .map(|entry| (entry.name.clone(), entry.export.clone()))
            .collect()
    }

    /// Заменить значение и заморозить имя.
    pub(crate) fn freeze(&mut self, name: &str, export: Export) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.name == name) {
            entry.export = export;
            entry.frozen = true;
        }
    }
}
