//! # modreg
//!
//! Реестр модулей-синглтонов для компонентов.
//!
//! ## Основные модули
//!
//! - [`modules`] - Пути, дерево пространств имён, реестр, привязка компонентов
//! - [`manifest`] - Декларативное описание компонентов в JSON
//! - [`value`] - Значения полей, аргументов и статических членов
//! - [`error`] - Типы ошибок
//!
//! ## Пример
//!
//! ```rust
//! use modreg::{Component, Configuration, ModuleRegistry, ComponentBinder, Value};
//!
//! let mut registry = ModuleRegistry::new();
//! let clock = Component::builder("Clock")
//!     .method("now", |_, _| Ok(Value::Int(0)))
//!     .configure(Configuration::named("sys.Clock"))
//!     .build();
//!
//! ComponentBinder::new(&mut registry).bind(&clock).unwrap();
//!
//! assert!(registry.is_loaded("sys/Clock"));
//! assert_eq!(registry.call("sys.Clock", "now", &[]).unwrap(), Value::Int(0));
//! ```

pub mod error;
pub mod manifest;
pub mod modules;
pub mod value;

// === Re-exports для удобства ===
pub use error::{RegistryError, RegistryResult};
pub use manifest::{ComponentSpec, Manifest};
pub use modules::{
    AutoloadDeclaration, AutoloadPlan, Component, ComponentBinder, Configuration, Derivation,
    Export, Exports, ModuleLoader, ModuleRef, ModuleRegistry, Path, Predicate,
};
pub use value::Value;
