use std::env;
use std::fs::File;
use std::io::BufReader;
use std::process;

use tracing_subscriber::{fmt, EnvFilter};

use wasmstack::parser::decode_named;
use wasmstack::runtime::{create_vm, VmConfig};

const USAGE: &str = "usage: wasmstack [options] <file.wasm>

options:
  -d          dump decoded sections
  -v          validate the module
  -x          execute the start function
  -f NAME     start function name (default: main)
  -p VALUE    preload an i32 onto the data stack (repeatable)
  -c FILE     read the interpreter configuration from a JSON file
  -V          verbose logging";

#[derive(Default)]
struct Options {
    dump: bool,
    validate: bool,
    execute: bool,
    verbose: bool,
    start_function: Option<String>,
    preload: Vec<i32>,
    config_path: Option<String>,
    path: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "-d" => options.dump = true,
            "-v" => options.validate = true,
            "-x" => options.execute = true,
            "-V" => options.verbose = true,
            "-f" => options.start_function = Some(value("-f")?),
            "-c" => options.config_path = Some(value("-c")?),
            "-p" => {
                let raw = value("-p")?;
                let parsed = raw
                    .parse::<i32>()
                    .map_err(|e| format!("bad preload value \"{raw}\": {e}"))?;
                options.preload.push(parsed);
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            _ if options.path.is_some() => return Err("only one module file may be given".to_string()),
            _ => options.path = Some(arg),
        }
    }
    Ok(options)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(options: Options) -> Result<(), String> {
    let path = options.path.ok_or(USAGE)?;

    let file = File::open(&path).map_err(|e| format!("couldn't open {path}: {e}"))?;
    let module = decode_named(&path, BufReader::new(file)).map_err(|e| format!("{path}: {e}"))?;

    if options.dump {
        print!("{module}");
    }

    if options.validate {
        let errors = module.validate_all();
        if !errors.is_empty() {
            let report: Vec<String> = errors.iter().map(|e| format!("  {e}")).collect();
            return Err(format!("{path}: validation failed\n{}", report.join("\n")));
        }
        println!("{path}: valid");
    }

    if options.execute {
        let mut config = match &options.config_path {
            Some(config_path) => VmConfig::from_file(config_path).map_err(|e| format!("{config_path}: {e}"))?,
            None => VmConfig::new("main"),
        };
        if let Some(name) = options.start_function {
            config.start_function_name = name;
        }
        if !options.preload.is_empty() {
            config.initial_stack_values = options.preload;
        }

        let vm = create_vm(&config).map_err(|e| e.to_string())?;
        let result = vm.execute(&module, &config).map_err(|e| format!("{path}: {e}"))?;
        let values: Vec<String> = result.values.iter().map(ToString::to_string).collect();
        println!(
            "{}: [{}] ({} instructions)",
            config.start_function_name,
            values.join(", "),
            result.instructions_executed
        );
    }

    Ok(())
}

fn main() {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            process::exit(2);
        }
    };
    init_logging(options.verbose);

    if let Err(e) = run(options) {
        eprintln!("{e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Options, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let options = args(&["-x", "-f", "add", "-p", "2", "-p", "-3", "m.wasm"]).unwrap();
        assert!(options.execute);
        assert!(!options.dump);
        assert_eq!(options.start_function.as_deref(), Some("add"));
        assert_eq!(options.preload, vec![2, -3]);
        assert_eq!(options.path.as_deref(), Some("m.wasm"));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["-f"]).is_err());
        assert!(args(&["-p", "x"]).is_err());
        assert!(args(&["-q"]).is_err());
        assert!(args(&["a.wasm", "b.wasm"]).is_err());
    }
}
