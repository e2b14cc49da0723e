//! FIR Compact CLI - компактирование программ FIR.
//!
//! Использование:
//!   fircompact <module>            - скомпактировать модуль с политикой по умолчанию
//!   fircompact <module> -m main    - оставить только достижимое из функции main
//!   fircompact --help              - справка

use std::env;
use std::path::PathBuf;
use std::process;

use fir_compact::compact::{compact_to_file, CompactConfig};
use fir_compact::fir::QName;
use fir_compact::modules::{FileLoader, ModuleLoader, ModuleResolver};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = r#"
FIR Compact - whole-program reachability compactor

USAGE:
    fircompact <module> [options]

OPTIONS:
    -o, --output <file>      Output file (default: <module>.compact.fir)
    -m, --main <function>    Keep only what the given main function needs
    -e, --exports            Keep only what the main module's exports need
    -f, --function <mod.fn>  Add an explicit root function (repeatable)
    -i, --import <module>    Always load the given module (repeatable)
    -p, --path <dir>         Add a module search path (repeatable)
        --lib <dir>          Library directory with compiled modules
    -v, --verbose            Print progress while compacting
        --version            Show version
    -h, --help               Show this help

EXAMPLES:
    fircompact main -m main
    fircompact server -e -o server.min.fir
    fircompact app -f app.start -f app.shutdown -p build/fir
"#;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("No module given.");
        eprintln!("Use --help for usage information.");
        process::exit(1);
    }

    let mut module: Option<String> = None;
    let mut output: Option<PathBuf> = None;
    let mut search_paths: Vec<PathBuf> = Vec::new();
    let mut library: Option<PathBuf> = None;
    let mut initial_functions: Vec<QName> = Vec::new();
    let mut config = CompactConfig::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!("{}", HELP);
                return;
            }
            "--version" => {
                println!("fircompact {}", VERSION);
                return;
            }
            "--verbose" | "-v" => config.verbose = true,
            "--exports" | "-e" => config.exports_only = true,
            "--main" | "-m" => {
                config.main_function = Some(next_value(&args, &mut i, "--main"));
            }
            "--function" | "-f" => {
                let spec = next_value(&args, &mut i, "--function");
                match parse_qname(&spec) {
                    Some(name) => initial_functions.push(name),
                    None => {
                        eprintln!("Invalid function name '{}', expected module.function", spec);
                        process::exit(1);
                    }
                }
            }
            "--import" | "-i" => {
                let name = next_value(&args, &mut i, "--import");
                config.always_import_modules.push(name);
            }
            "--path" | "-p" => {
                search_paths.push(PathBuf::from(next_value(&args, &mut i, "--path")));
            }
            "--lib" => {
                library = Some(PathBuf::from(next_value(&args, &mut i, "--lib")));
            }
            "--output" | "-o" => {
                output = Some(PathBuf::from(next_value(&args, &mut i, "--output")));
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown option: {}", arg);
                eprintln!("Use --help for usage information.");
                process::exit(1);
            }
            arg => {
                if module.is_some() {
                    eprintln!("Too many arguments.");
                    eprintln!("Use --help for usage information.");
                    process::exit(1);
                }
                module = Some(arg.to_string());
            }
        }
        i += 1;
    }

    let module = match module {
        Some(module) => module,
        None => {
            eprintln!("No module given.");
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    };

    if !initial_functions.is_empty() {
        config.initial_functions = Some(initial_functions);
    }

    // Загрузчик: локальные пути поиска плюс библиотека
    if search_paths.is_empty() {
        search_paths.push(PathBuf::from("."));
    }
    let mut loader = FileLoader::with_search_paths(search_paths);
    if let Some(path) = library.or_else(ModuleResolver::default_library_path) {
        loader.set_library_path(path);
    }

    let main_program = match loader.load(&module) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let target = output.unwrap_or_else(|| PathBuf::from(format!("{}.compact.fir", module)));

    match compact_to_file(&config, &mut loader, main_program, &target) {
        Ok(()) => println!("Wrote {}", target.display()),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Значение, следующее за флагом.
fn next_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Missing value for {}", flag);
            process::exit(1);
        }
    }
}

/// Разобрать "module.function" в квалифицированное имя.
/// Имя модуля само может содержать точки, делим по последней.
fn parse_qname(spec: &str) -> Option<QName> {
    let (module, name) = spec.rsplit_once('.')?;
    if module.is_empty() || name.is_empty() {
        return None;
    }
    Some(QName::new(module, name))
}
