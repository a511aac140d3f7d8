//! Загрузчик единиц.
//!
//! Единица — именованный блок кода с упорядоченными импортами, который
//! заполняет контейнер экспортов. Объявленные единицы ставятся в очередь и
//! выполняются строго в порядке объявления (FIFO) при вызове
//! [`ModuleLoader::run_pending`]; после тела единицы её экспорты
//! обрабатывает [`ComponentBinder`].
//!
//! Импорт единицы, которая ещё не выполнялась, приходит в тело как
//! [`Import::Pending`]. Повторного разрешения нет: тело само решает, что
//! делать с отсутствующим импортом.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use log::{debug, info};

use super::binder::ComponentBinder;
use super::exports::Exports;
use super::module::ModuleRef;
use super::path::Path;
use super::registry::ModuleRegistry;
use crate::error::{RegistryError, RegistryResult};

/// Разделяемый контейнер экспортов единицы.
pub type UnitExports = Rc<RefCell<Exports>>;

/// Тело единицы.
pub type UnitBody = Box<dyn FnOnce(&UnitScope<'_>, &mut Exports, &[Import])>;

/// Разрешённый импорт.
#[derive(Debug, Clone)]
pub enum Import {
    /// Единица уже выполнялась
    Ready(UnitExports),
    /// Единица ещё не определена
    Pending(Path),
}

impl Import {
    pub fn exports(&self) -> Option<&UnitExports> {
        match self {
            Import::Ready(exports) => Some(exports),
            Import::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Import::Pending(_))
    }
}

/// Доступ к загрузчику из тела единицы.
pub struct UnitScope<'a> {
    loader: &'a ModuleLoader,
}

impl UnitScope<'_> {
    /// Экспорты другой единицы (возможно, заполненные частично).
    pub fn require_unit(&self, path: &str) -> Option<UnitExports> {
        self.loader.require_unit(path)
    }

    /// Модуль по пути.
    pub fn require_module(&self, name: &str) -> Option<ModuleRef> {
        self.loader.require_module(name)
    }

    pub fn registry(&self) -> &ModuleRegistry {
        self.loader.registry()
    }
}

struct PendingUnit {
    path: Path,
    imports: Vec<Path>,
    body: UnitBody,
}

/// Загрузчик единиц, владеющий реестром модулей.
pub struct ModuleLoader {
    /// Реестр модулей
    registry: ModuleRegistry,
    /// Контейнеры экспортов по пути единицы
    units: HashMap<Path, UnitExports>,
    /// Очередь отложенных единиц
    pending: VecDeque<PendingUnit>,
    /// Ошибки привязки последней выполненной единицы
    last_errors: Vec<RegistryError>,
}

impl ModuleLoader {
    /// Создать новый загрузчик.
    pub fn new() -> Self {
        Self::with_registry(ModuleRegistry::new())
    }

    /// Создать загрузчик поверх существующего реестра.
    pub fn with_registry(registry: ModuleRegistry) -> Self {
        Self {
            registry,
            units: HashMap::new(),
            pending: VecDeque::new(),
            last_errors: Vec::new(),
        }
    }

    /// Объявить единицу; она выполнится при следующем `run_pending`.
    pub fn define_unit<F>(&mut self, path: &str, imports: &[&str], body: F) -> RegistryResult<()>
    where
        F: FnOnce(&UnitScope<'_>, &mut Exports, &[Import]) + 'static,
    {
        let unit = Self::pending_unit(path, imports, Box::new(body))?;
        debug!("Queued unit {} ({} imports)", unit.path, unit.imports.len());
        self.pending.push_back(unit);
        Ok(())
    }

    /// Выполнить единицу немедленно.
    pub fn define_unit_now<F>(
        &mut self,
        path: &str,
        imports: &[&str],
        body: F,
    ) -> RegistryResult<UnitExports>
    where
        F: FnOnce(&UnitScope<'_>, &mut Exports, &[Import]) + 'static,
    {
        let unit = Self::pending_unit(path, imports, Box::new(body))?;
        Ok(self.run_unit(unit))
    }

    /// Выполнить все отложенные единицы в порядке объявления.
    ///
    /// Возвращает число выполненных единиц.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Some(unit) = self.pending.pop_front() {
            self.run_unit(unit);
            count += 1;
        }
        count
    }

    /// Число единиц в очереди.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Экспорты единицы по пути.
    pub fn require_unit(&self, path: &str) -> Option<UnitExports> {
        let path = Path::parse(path).ok()?;
        self.units.get(&path).cloned()
    }

    /// Модуль по пути.
    pub fn require_module(&self, name: &str) -> Option<ModuleRef> {
        self.registry.require_module(name)
    }

    /// Ошибки привязки последней выполненной единицы.
    pub fn last_errors(&self) -> &[RegistryError] {
        &self.last_errors
    }

    /// Получить реестр модулей.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Получить реестр модулей (mutable).
    pub fn registry_mut(&mut self) -> &mut ModuleRegistry {
        &mut self.registry
    }

    fn pending_unit(path: &str, imports: &[&str], body: UnitBody) -> RegistryResult<PendingUnit> {
        let path = Path::parse(path)?;
        let imports = imports
            .iter()
            .map(|import| Path::parse(import))
            .collect::<RegistryResult<Vec<_>>>()?;
        Ok(PendingUnit {
            path,
            imports,
            body,
        })
    }

    fn run_unit(&mut self, unit: PendingUnit) -> UnitExports {
        let PendingUnit {
            path,
            imports,
            body,
        } = unit;

        let exports = self.units.entry(path.clone()).or_default().clone();
        let imports: Vec<Import> = imports
            .into_iter()
            .map(|import| match self.units.get(&import) {
                Some(exports) => Import::Ready(exports.clone()),
                None => {
                    debug!("Unit {} imports {} before it is defined", path, import);
                    Import::Pending(import)
                }
            })
            .collect();

        // Тело работает с копией: общий контейнер остаётся доступным для
        // чтения через `require_unit` и импорты, в том числе самой единице.
        let mut container = exports.borrow().clone();
        {
            let scope = UnitScope { loader: &*self };
            body(&scope, &mut container, &imports);
        }
        *exports.borrow_mut() = container;

        let errors = ComponentBinder::new(&mut self.registry).process(&mut exports.borrow_mut());
        info!(
            "Unit {} processed: {} exports, {} binding errors",
            path,
            exports.borrow().len(),
            errors.len()
        );
        self.last_errors = errors;

        exports
    }
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("registry", &self.registry)
            .field("units", &self.units.keys().collect::<Vec<_>>())
            .field("pending", &self.pending.len())
            .finish()
    }
}
