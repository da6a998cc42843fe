// ABOUTME: Jyro command-line runner and REPL

use clap::Parser;
use jyro::builtins::network::HttpGet;
use jyro::config::{self, ExecutionOptions, NetworkConfig};
use jyro::highlighter::JyroHelper;
use jyro::{CancellationToken, DirScriptResolver, Engine, Value};
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Jyro script runner with resource-bounded execution
#[derive(Parser, Debug)]
#[command(name = "jyro")]
#[command(version = config::VERSION)]
#[command(about = "An embeddable scripting language for safe data transformation")]
#[command(long_about = "Runs Jyro scripts against a JSON data root under strict resource bounds")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// JSON file providing the initial Data root (default: empty object)
    #[arg(long = "data", value_name = "FILE")]
    data: Option<PathBuf>,

    /// Directory of .jyro scripts reachable through CallScript
    #[arg(long = "scripts-dir", value_name = "PATH")]
    scripts_dir: Option<PathBuf>,

    /// Maximum wall-clock time in milliseconds
    #[arg(long = "max-wall-ms", value_name = "MS", default_value = "5000")]
    max_wall_ms: u64,

    /// Maximum executed statements
    #[arg(long = "max-statements", value_name = "N", default_value = "100000")]
    max_statements: u64,

    /// Maximum total loop iterations
    #[arg(long = "max-loops", value_name = "N", default_value = "100000")]
    max_loops: u64,

    /// Maximum function-call depth
    #[arg(long = "max-call-depth", value_name = "N", default_value = "64")]
    max_call_depth: u32,

    /// Maximum nested CallScript depth
    #[arg(long = "max-script-depth", value_name = "N", default_value = "8")]
    max_script_depth: u32,

    /// Enable the HttpGet function
    #[arg(long = "allow-network")]
    allow_network: bool,

    /// Add an allowed network host (can be repeated; empty = all)
    #[arg(long = "net-allow", value_name = "HOST", action = clap::ArgAction::Append)]
    net_hosts: Vec<String>,

    /// Print execution metadata to stderr after the run
    #[arg(long = "print-metadata")]
    print_metadata: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let options = ExecutionOptions::default()
        .with_max_wall_time(Duration::from_millis(args.max_wall_ms))
        .with_max_statements(args.max_statements)
        .with_max_loop_iterations(args.max_loops)
        .with_max_call_depth(args.max_call_depth)
        .with_max_script_call_depth(args.max_script_depth);

    let mut engine = Engine::new().with_options(options);

    if let Some(dir) = &args.scripts_dir {
        let resolver = DirScriptResolver::open(dir)
            .map_err(|e| format!("cannot open scripts dir {}: {}", dir.display(), e))?;
        engine = engine.with_resolver(Arc::new(resolver));
    }

    if args.allow_network {
        engine.register_function(Arc::new(HttpGet::new(NetworkConfig {
            enabled: true,
            allowed_hosts: args.net_hosts.clone(),
        })));
    }

    let data = match &args.data {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))?;
            Value::from_json(&json)
        }
        None => Value::Object(Default::default()),
    };

    match &args.script {
        Some(path) => run_script(&engine, path, data, args.print_metadata),
        None => run_repl(&engine, data),
    }
}

fn run_script(
    engine: &Engine,
    path: &PathBuf,
    data: Value,
    print_metadata: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;

    let cancel = CancellationToken::new();
    let result = engine.execute_with_cancellation(&source, data, &cancel);

    let provider = engine.options().message_provider.clone();
    for line in result.format_diagnostics(provider.as_ref()) {
        eprintln!("{}", line);
    }
    if print_metadata {
        eprintln!("{}", serde_json::to_string_pretty(&result.metadata)?);
    }

    println!("{}", serde_json::to_string_pretty(&result.data.to_json())?);

    if result.success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

fn run_repl(engine: &Engine, mut data: Value) -> Result<(), Box<dyn std::error::Error>> {
    let initial = data.clone();

    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(rl_config)
        .map_err(|e| format!("failed to initialize REPL: {}", e))?;
    rl.set_helper(Some(JyroHelper::new()));

    let history_file = ".jyro_history";
    let _ = rl.load_history(history_file);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    let provider = engine.options().message_provider.clone();
    loop {
        match rl.readline("jyro> ") {
            Ok(line) => {
                let trimmed = line.trim();
                match trimmed {
                    "" => continue,
                    "quit" | "exit" => break,
                    "help" => {
                        let skin = termimad::MadSkin::default();
                        skin.print_text(&jyro::help::render_catalog(engine.registry()));
                        continue;
                    }
                    "data" => {
                        println!("{}", serde_json::to_string_pretty(&data.to_json())?);
                        continue;
                    }
                    "reset" => {
                        data = initial.clone();
                        println!("Data reset");
                        continue;
                    }
                    _ => {}
                }

                // Each line is a whole script; Data persists between lines,
                // variables do not.
                let result = engine.execute(trimmed, data.clone());
                for message in result.format_diagnostics(provider.as_ref()) {
                    eprintln!("{}", message);
                }
                if result.success {
                    data = result.data;
                    println!("{}", serde_json::to_string(&data.to_json())?);
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("REPL error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
