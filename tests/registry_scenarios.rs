//! Сценарии реестра модулей целиком: единицы, привязка, наследование.

use std::cell::RefCell;
use std::rc::Rc;

use modreg::modules::{
    AutoloadDeclaration, AutoloadStep, BoundProperty, Component, ComponentBinder, Configuration,
    ModuleLoader, ModuleRegistry, Path, Predicate,
};
use modreg::{RegistryError, Value};

fn bind(registry: &mut ModuleRegistry, component: &Rc<Component>) -> modreg::ModuleRef {
    ComponentBinder::new(registry)
        .bind(component)
        .unwrap()
        .unwrap()
}

#[test]
fn test_singleton_per_path() {
    let mut registry = ModuleRegistry::new();

    for name in ["a", "a.b", "app/ui/Button", "x.y.z.w"] {
        let path = Path::parse(name).unwrap();
        let first = registry.get_or_create(&path);
        let second = registry.get_or_create(&path);
        assert_eq!(first, second, "path {}", name);
    }

    let dotted = registry.get_or_create(&Path::parse("app.ui.Button").unwrap());
    let slashed = registry.require_module("app/ui/Button").unwrap();
    assert_eq!(dotted, slashed);
}

#[test]
fn test_live_alias_reflects_later_population() {
    let mut loader = ModuleLoader::new();
    let exports = loader
        .define_unit_now("units/store", &[], |_, exports, _| {
            let store = Component::builder("Store")
                .method("get", |_, _| Ok(Value::Int(1)))
                .configure(Configuration::named("app.Store"))
                .build();
            exports.insert("Store", store);
        })
        .unwrap();

    let before = exports
        .borrow()
        .module("Store", loader.registry())
        .unwrap();
    assert!(!before.has_method("put"));

    let extension = Component::anonymous()
        .method("put", |_, _| Ok(Value::Unit))
        .configure(Configuration::named("app.Store"))
        .build();
    ComponentBinder::new(loader.registry_mut())
        .bind(&extension)
        .unwrap();

    let after = exports
        .borrow()
        .module("Store", loader.registry())
        .unwrap();
    assert_eq!(before, after);
    assert!(after.has_method("put"));
    assert!(before.has_method("put"));
}

#[test]
fn test_autoload_ordering() {
    let declarations = |condition: bool| {
        vec![
            AutoloadDeclaration::step("a"),
            AutoloadDeclaration::conditional("b", condition, Some("c")),
            AutoloadDeclaration::step("d"),
        ]
    };

    let mut registry = ModuleRegistry::new();
    let constructible = Component::builder("WithInit")
        .constructor(|_, _| Ok(()))
        .configure(Configuration::new().with_autoload(declarations(true)))
        .build();
    let plain = Component::builder("NoInit")
        .configure(Configuration::new().with_autoload(declarations(false)))
        .build();

    let with_init = bind(&mut registry, &constructible);
    let no_init = bind(&mut registry, &plain);

    assert_eq!(
        with_init.autoload_plan().step_names(),
        ["initializer", "a", "b", "d"]
    );
    assert_eq!(no_init.autoload_plan().step_names(), ["a", "c", "d"]);
}

#[test]
fn test_deferred_condition_is_kept_in_plan() {
    let flag = Rc::new(RefCell::new(false));
    let condition_flag = flag.clone();
    let calls = Rc::new(RefCell::new(Vec::new()));

    let mut builder = Component::builder("Feature");
    for name in ["enable", "fallback"] {
        let calls = calls.clone();
        builder = builder.method(name, move |_, _| {
            calls.borrow_mut().push(name);
            Ok(Value::Unit)
        });
    }
    let feature = builder
        .configure(Configuration::new().with_autoload([AutoloadDeclaration::conditional(
            "enable",
            Predicate::deferred(move || *condition_flag.borrow()),
            Some("fallback"),
        )]))
        .build();

    let mut registry = ModuleRegistry::new();
    let module = bind(&mut registry, &feature);

    let plan = module.autoload_plan();
    assert_eq!(plan.len(), 1);
    match &plan.steps()[0] {
        AutoloadStep::Deferred {
            method,
            condition,
            otherwise,
        } => {
            assert_eq!(method, "enable");
            assert!(condition.is_deferred());
            assert_eq!(otherwise.as_deref(), Some("fallback"));
        }
        other => panic!("expected deferred step, got {:?}", other),
    }

    assert_eq!(module.run_autoload().unwrap(), ["fallback"]);
    *flag.borrow_mut() = true;
    assert_eq!(module.run_autoload().unwrap(), ["enable"]);
    assert_eq!(*calls.borrow(), ["fallback", "enable"]);
}

#[test]
fn test_false_condition_skips_registration() {
    let mut loader = ModuleLoader::new();
    let exports = loader
        .define_unit_now("units/debug", &[], |_, exports, _| {
            let overlay = Component::builder("DebugOverlay")
                .configure(Configuration::named("app.DebugOverlay").with_condition(false))
                .build();
            exports.insert("DebugOverlay", overlay);
        })
        .unwrap();

    assert!(loader.last_errors().is_empty());
    assert!(loader.require_module("app.DebugOverlay").is_none());
    assert!(loader.require_module("DebugOverlay").is_none());

    let exports = exports.borrow();
    assert!(exports.is_frozen("DebugOverlay"));
    assert!(exports.module("DebugOverlay", loader.registry()).is_none());
}

#[test]
fn test_chained_construction_fires_once() {
    let counts = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let counting = |label: &'static str| {
        let counts = counts.clone();
        move |_: &modreg::ModuleRef, _: &[Value]| {
            counts.borrow_mut().push(label);
            Ok::<(), RegistryError>(())
        }
    };

    let mut registry = ModuleRegistry::new();
    let a = bind(
        &mut registry,
        &Component::builder("A")
            .constructor(counting("A"))
            .configure(Configuration::named("chain.A"))
            .build(),
    );
    let b = bind(
        &mut registry,
        &Component::builder("B")
            .constructor(counting("B"))
            .extends_module(a)
            .configure(Configuration::named("chain.B"))
            .build(),
    );
    let c = bind(
        &mut registry,
        &Component::builder("C")
            .constructor(counting("C"))
            .extends_module(b)
            .configure(Configuration::named("chain.C"))
            .build(),
    );

    let report = c.initialize(&[]).unwrap();
    assert_eq!(report.fired, ["A", "B", "C"]);
    assert_eq!(*counts.borrow(), ["A", "B", "C"]);

    let err = c.initialize(&[]).unwrap_err();
    assert_eq!(err, RegistryError::AlreadyInitialized("chain.C".to_string()));
    assert_eq!(counts.borrow().len(), 3);
}

#[test]
fn test_static_inheritance_walk() {
    let grandparent = Component::builder("Grandparent")
        .static_value("KIND", "grandparent")
        .static_value("ROOT", true)
        .build();
    let parent = Component::builder("Parent")
        .static_value("KIND", "parent")
        .static_fn("describe", |this, _| Ok(Value::from(this.path().to_string())))
        .extends_class(grandparent)
        .build();
    let child = Component::builder("Child")
        .extends_class(parent)
        .configure(Configuration::named("app.Child"))
        .build();

    let mut registry = ModuleRegistry::new();
    let module = bind(&mut registry, &child);

    assert_eq!(module.property_names(), ["KIND", "ROOT", "describe"]);
    assert!(matches!(
        module.property("KIND"),
        Some(BoundProperty::Value(Value::String(ref kind))) if kind == "parent"
    ));
    assert!(matches!(
        module.property("ROOT"),
        Some(BoundProperty::Value(Value::Bool(true)))
    ));
    assert_eq!(
        module.call_property("describe", &[]).unwrap(),
        Value::from("app.Child")
    );
}

#[test]
fn test_foo_scenario() {
    let mut loader = ModuleLoader::new();
    loader
        .define_unit("units/foo", &[], |_, exports, _| {
            let foo = Component::builder("Foo")
                .constructor(|this, _| {
                    this.set_field("ready", true);
                    Ok(())
                })
                .method("bar", |this, _| Ok(this.field("ready").unwrap_or_default()))
                .configure(Configuration::new().with_autoload(["bar"]))
                .build();
            exports.insert("Foo", foo);
        })
        .unwrap();

    assert!(loader.require_module("Foo").is_none());
    loader.run_pending();

    let foo = loader.require_module("Foo").unwrap();
    assert_eq!(foo.autoload_plan().step_names(), ["initializer", "bar"]);
    assert!(foo.method_names().contains(&"bar".to_string()));
    assert_eq!(foo.run_autoload().unwrap(), ["initializer", "bar"]);
    assert_eq!(foo.call("bar", &[]).unwrap(), Value::Bool(true));
}

#[test]
fn test_statics_inherited_through_module_ancestor() {
    let mut registry = ModuleRegistry::new();
    let a = bind(
        &mut registry,
        &Component::builder("A")
            .static_value("FROM_A", 1)
            .static_value("NAME", "a")
            .configure(Configuration::named("p.A"))
            .build(),
    );
    let b = bind(
        &mut registry,
        &Component::builder("B")
            .static_value("NAME", "b")
            .extends_module(a)
            .configure(Configuration::named("p.B"))
            .build(),
    );

    assert_eq!(b.property_names(), ["FROM_A", "NAME"]);
    assert!(matches!(
        b.property("NAME"),
        Some(BoundProperty::Value(Value::String(ref name))) if name == "b"
    ));
}
