//! Реестр модулей.
//!
//! Реестр создаётся один раз при старте, живёт до конца процесса и
//! передаётся явно — глобального состояния нет.

use log::debug;

use super::module::ModuleRef;
use super::path::Path;
use super::tree::PathTree;
use crate::error::{RegistryError, RegistryResult};
use crate::value::Value;

/// Реестр модулей, адресуемых путями.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Дерево пространств имён
    tree: PathTree,
}

impl ModuleRegistry {
    /// Создать новый реестр.
    pub fn new() -> Self {
        Self::default()
    }

    /// Получить модуль по пути, создав его при необходимости.
    pub fn get_or_create(&mut self, path: &Path) -> ModuleRef {
        let module = self.tree.get_or_create(path);
        debug!("Resolved module {} for writing", path);
        module
    }

    /// Найти модуль по пути, ничего не создавая.
    pub fn lookup(&self, path: &Path) -> Option<ModuleRef> {
        self.tree.lookup(path)
    }

    /// Найти модуль по имени вида `app.ui.Button` или `app/ui/Button`.
    pub fn require_module(&self, name: &str) -> Option<ModuleRef> {
        let path = Path::parse(name).ok()?;
        self.lookup(&path)
    }

    /// Проверить, привязан ли к пути компонент.
    pub fn is_loaded(&self, name: &str) -> bool {
        self.require_module(name)
            .map(|module| module.is_bound())
            .unwrap_or(false)
    }

    /// Все модули с привязанными компонентами.
    pub fn modules(&self) -> Vec<ModuleRef> {
        self.tree
            .modules()
            .into_iter()
            .filter(ModuleRef::is_bound)
            .collect()
    }

    /// Пути всех модулей с привязанными компонентами.
    pub fn paths(&self) -> Vec<Path> {
        self.modules().iter().map(ModuleRef::path).collect()
    }

    /// Количество модулей с привязанными компонентами.
    pub fn count(&self) -> usize {
        self.modules().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Дерево пространств имён.
    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    /// Вызвать метод модуля по имени.
    pub fn call(&self, module_name: &str, method: &str, args: &[Value]) -> RegistryResult<Value> {
        let module = self
            .require_module(module_name)
            .ok_or_else(|| RegistryError::ModuleNotFound(module_name.to_string()))?;
        module.call(method, args)
    }
}
