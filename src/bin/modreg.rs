//! modreg CLI - загрузка манифеста компонентов и вывод реестра.
//!
//! Использование:
//!   modreg <manifest.json>         - зарегистрировать компоненты и показать модули
//!   modreg <manifest.json> --run   - то же, плюс выполнить планы автозагрузки
//!   modreg --help                  - справка

use std::env;
use std::path::Path;
use std::process;

use log::info;

use modreg::modules::{BoundProperty, Derivation};
use modreg::{Manifest, ModuleLoader, ModuleRef, RegistryResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = r#"
modreg - singleton module registry

USAGE:
    modreg <manifest.json>          Register components and list modules
    modreg <manifest.json> --run    Also run every module's autoload plan
    modreg --help, -h               Show this help
    modreg --version, -v            Show version

ENVIRONMENT:
    RUST_LOG=debug                  Show binding and autoload details

MANIFEST:
    {
      "unit": "app",
      "components": [
        { "name": "Base", "fields": { "ready": true } },
        {
          "name": "Service",
          "extends": "Base",
          "configuration": { "name": "app.Service", "autoload": ["start"] },
          "methods": { "start": "started" }
        }
      ]
    }
"#;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    match args.len() {
        2 => match args[1].as_str() {
            "--help" | "-h" => {
                println!("{}", HELP);
            }
            "--version" | "-v" => {
                println!("modreg {}", VERSION);
            }
            file => run_manifest(file, false),
        },
        3 => {
            if args[2] == "--run" || args[2] == "-r" {
                run_manifest(&args[1], true);
            } else {
                eprintln!("Unknown option: {}", args[2]);
                eprintln!("Use --help for usage information.");
                process::exit(1);
            }
        }
        1 => {
            eprintln!("Missing manifest file.");
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
        _ => {
            eprintln!("Too many arguments.");
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    }
}

/// Загрузить манифест и показать реестр.
fn run_manifest(file: &str, run_autoload: bool) {
    if let Err(e) = load_and_report(file, run_autoload) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn load_and_report(file: &str, run_autoload: bool) -> RegistryResult<()> {
    let manifest = Manifest::load(Path::new(file))?;
    let mut loader = ModuleLoader::new();
    manifest.install(&mut loader)?;

    let modules = loader.registry().modules();
    info!("Loaded {} modules from {}", modules.len(), file);

    for module in &modules {
        print_module(module);
    }

    if run_autoload {
        println!();
        for module in &modules {
            let executed = module.run_autoload()?;
            println!("{}: ran [{}]", module.path(), executed.join(", "));
        }
    }

    Ok(())
}

fn print_module(module: &ModuleRef) {
    let component = module
        .component()
        .map(|component| component.label().to_string())
        .unwrap_or_default();

    println!("{} ({})", module.path(), component);

    if let Some(derivation) = module.component().and_then(|c| Derivation::derive(&c).ok()) {
        let chain: Vec<String> = derivation
            .ancestors()
            .iter()
            .map(|ancestor| {
                let label = ancestor.component().label();
                if ancestor.is_bridged() {
                    format!("{} (module)", label)
                } else {
                    label.to_string()
                }
            })
            .collect();
        if !chain.is_empty() {
            println!("  extends:  [{}]", chain.join(", "));
        }
    }
    println!("  autoload: [{}]", module.autoload_plan().step_names().join(", "));
    println!("  methods:  [{}]", module.method_names().join(", "));

    for name in module.property_names() {
        match module.property(&name) {
            Some(BoundProperty::Value(value)) => println!("  static {} = {}", name, value),
            Some(BoundProperty::Function(_)) => println!("  static {}()", name),
            None => {}
        }
    }
}
