//! Система модулей-синглтонов.
//!
//! Компоненты (шаблоны, похожие на классы) превращаются в долгоживущие
//! модули, адресуемые путём через точку или слэш.
//!
//! ## Пример
//!
//! ```
//! use modreg::modules::{Component, Configuration, ModuleLoader};
//! use modreg::Value;
//!
//! let mut loader = ModuleLoader::new();
//! loader
//!     .define_unit("units/greeter", &[], |_, exports, _| {
//!         let greeter = Component::builder("Greeter")
//!             .constructor(|this, _| {
//!                 this.set_field("greeting", "hello");
//!                 Ok(())
//!             })
//!             .method("greet", |this, _| Ok(this.field("greeting").unwrap_or_default()))
//!             .configure(Configuration::named("app.Greeter").with_autoload(["greet"]))
//!             .build();
//!         exports.insert("Greeter", greeter);
//!     })
//!     .unwrap();
//! loader.run_pending();
//!
//! let greeter = loader.require_module("app.Greeter").unwrap();
//! assert_eq!(greeter.run_autoload().unwrap(), ["initializer", "greet"]);
//! assert_eq!(greeter.call("greet", &[]).unwrap(), Value::from("hello"));
//! ```

mod autoload;
mod binder;
mod bridge;
mod component;
mod exports;
mod loader;
mod module;
mod path;
mod predicate;
mod registry;
mod tree;

pub use autoload::{AutoloadDeclaration, AutoloadPlan, AutoloadPlanner, AutoloadStep, INITIALIZER_STEP};
pub use binder::ComponentBinder;
pub use bridge::{Ancestor, AncestorInit, ConstructionReport, Derivation, Extension};
pub use component::{
    Component, ComponentBuilder, Configuration, Constructor, Extends, Method, StaticMember,
};
pub use exports::{Export, Exports, ModuleAlias};
pub use loader::{Import, ModuleLoader, UnitBody, UnitExports, UnitScope};
pub use module::{BoundMethod, BoundProperty, ModuleRef};
pub use path::Path;
pub use predicate::{evaluate, Predicate};
pub use registry::ModuleRegistry;
pub use tree::{NamespaceNode, PathTree};
