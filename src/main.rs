/// Rays - Application Bootstrap CLI
use rays::application::{AppConfig, Application};
use rays::bootstrap::{Framework, FrameworkConfig, LoadResult, SourceLoader};
use rays::faults::install_panic_hook;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, Level};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework unit imported before the application attaches.
const CORE_EXCEPTION: &str = "system.base.RException";

fn print_usage() {
    eprintln!("Rays v{}", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    rays [OPTIONS] <CONFIG>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -h, --help             Print this help message");
    eprintln!("    -V, --version          Print version information");
    eprintln!("    -v, --verbose          Log every loaded unit");
    eprintln!("    --system <DIR>         Framework root directory (default: .)");
    eprintln!("    --defaults <FILE>      Framework default config layered under <CONFIG>");
    eprintln!("    --import <NAME>        Import a logical name (repeatable)");
    eprintln!("    --class <NAME>         Require a class (repeatable)");
    eprintln!("    --module <ID>          Load a module (repeatable)");
    eprintln!();
    eprintln!("ARGUMENTS:");
    eprintln!("    <CONFIG>               Application config file (TOML)");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("    rays --system demos/rays demos/blog/app.toml");
    eprintln!("    rays --system demos/rays --class SiteController --module blog demos/blog/app.toml");
}

fn print_version() {
    println!("Rays {}", VERSION);
}

#[derive(Default)]
struct Options {
    config: Option<PathBuf>,
    system: Option<PathBuf>,
    defaults: Option<PathBuf>,
    imports: Vec<String>,
    classes: Vec<String>,
    modules: Vec<String>,
    verbose: bool,
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();
    let mut i = 1;

    fn value(args: &[String], i: usize, flag: &str) -> Result<String, String> {
        args.get(i)
            .cloned()
            .ok_or_else(|| format!("Missing value after {}", flag))
    }

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-V" | "--version" => {
                print_version();
                process::exit(0);
            }
            "-v" | "--verbose" => {
                options.verbose = true;
            }
            flag @ ("--system" | "--defaults" | "--import" | "--class" | "--module") => {
                i += 1;
                let value = value(&args, i, flag)?;
                match flag {
                    "--system" => options.system = Some(PathBuf::from(value)),
                    "--defaults" => options.defaults = Some(PathBuf::from(value)),
                    "--import" => options.imports.push(value),
                    "--class" => options.classes.push(value),
                    _ => options.modules.push(value),
                }
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => {
                if options.config.is_some() {
                    return Err("Multiple config files specified".to_string());
                }
                options.config = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn load_config(options: &Options, path: &Path) -> Result<AppConfig, String> {
    let config = AppConfig::load_layered(options.defaults.as_deref(), path)
        .map_err(|e| e.to_string())?;
    let config_dir = path.parent().unwrap_or(Path::new("."));
    Ok(config.rebase(config_dir))
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn boot(framework: &mut Framework, options: &Options) -> LoadResult<()> {
    framework.import_configured()?;
    framework.auto_imports(&options.imports)?;
    for class in &options.classes {
        framework.require_class(class)?;
    }
    for module in &options.modules {
        framework.load_module(module)?;
    }
    Ok(())
}

fn main() {
    let options = match parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    let Some(config_path) = options.config.clone() else {
        eprintln!("Error: Missing config file");
        eprintln!();
        print_usage();
        process::exit(1);
    };

    let config = match load_config(&options, &config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    init_logging(options.verbose || config.debug);

    let root = options.system.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut framework = Framework::new(FrameworkConfig::new(root), SourceLoader::new());
    install_panic_hook(framework.faults());

    if let Err(e) = framework.import(CORE_EXCEPTION) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    framework.attach(Application::new(config));

    if let Err(e) = boot(&mut framework, &options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    for file in framework.symbols().loaded_files() {
        println!("{}", file.display());
    }
    info!(
        target: "rays::bootstrap",
        units = framework.symbols().loaded_files().len(),
        elapsed_ms = framework.elapsed().as_millis() as u64,
        "Bootstrap complete"
    );
}
