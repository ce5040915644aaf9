//! CLI entry point: wires CLI args -> sandbox -> global environment ->
//! builtin/stdlib registration -> script evaluation -> process exit code.
//! Non-interactive only; a line-editing REPL front-end is out of scope.

use clap::Parser;
use lispy::bdd;
use lispy::builtins::{register_builtins, set_sandbox_storage};
use lispy::config::{FsConfig, ModuleConfig, NetConfig};
use lispy::env::Environment;
use lispy::eval::eval;
use lispy::help::populate_builtin_help;
use lispy::modules;
use lispy::sandbox::Sandbox;
use lispy::stdlib::register_stdlib;
use std::path::PathBuf;
use std::process::ExitCode;

/// LisPy: a Clojure-flavored Lisp interpreter with promises, a module
/// loader, and a BDD test harness.
#[derive(Parser, Debug)]
#[command(name = "lispy")]
#[command(version = lispy::config::VERSION)]
#[command(about = "Runs a LisPy script")]
struct CliArgs {
    /// Script file to execute
    #[arg(value_name = "FILE")]
    script: PathBuf,

    /// Add allowed filesystem path for slurp/spit (repeatable)
    #[arg(long = "fs-sandbox", value_name = "PATH", action = clap::ArgAction::Append)]
    fs_paths: Vec<PathBuf>,

    /// Maximum file size in bytes for slurp/spit
    #[arg(long = "max-file-size", value_name = "BYTES", default_value = "10485760")]
    max_file_size: usize,

    /// Enable network I/O (http-get/http-post/...)
    #[arg(long = "allow-network")]
    allow_network: bool,

    /// Add allowed network address (repeatable)
    #[arg(long = "net-allow", value_name = "ADDR", action = clap::ArgAction::Append)]
    net_addresses: Vec<String>,

    /// Add a module load path, searched in order (repeatable)
    #[arg(long = "module-path", value_name = "DIR", action = clap::ArgAction::Append)]
    module_paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let fs_config = build_fs_config(&args);
    let net_config = build_net_config(&args);

    let sandbox = match Sandbox::new(fs_config, net_config) {
        Ok(sandbox) => sandbox,
        Err(e) => {
            eprintln!("Error: failed to initialize sandbox: {}", e);
            return ExitCode::FAILURE;
        }
    };
    set_sandbox_storage(sandbox);

    modules::configure(build_module_config(&args));

    let env = Environment::new();
    register_builtins(&env);
    register_stdlib(&env);
    populate_builtin_help();

    let source = match std::fs::read_to_string(&args.script) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: cannot read script file {}: {}", args.script.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let forms = match lispy::parser::parse_all(&source) {
        Ok(forms) => forms,
        Err(e) => {
            eprintln!("Parse error: {}", e.0);
            return ExitCode::FAILURE;
        }
    };

    for form in &forms {
        if let Err(e) = eval(form, &env) {
            eprintln!("Error: {}", e.message());
            return ExitCode::FAILURE;
        }
    }

    if !bdd::results().is_empty() {
        print_bdd_summary();
        if bdd_has_failures() {
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

fn build_fs_config(args: &CliArgs) -> FsConfig {
    if args.fs_paths.is_empty() {
        FsConfig::default()
    } else {
        FsConfig {
            allowed_paths: args.fs_paths.clone(),
            max_file_size: args.max_file_size,
        }
    }
}

fn build_net_config(args: &CliArgs) -> NetConfig {
    NetConfig {
        enabled: args.allow_network,
        allowed_addresses: args.net_addresses.clone(),
    }
}

fn build_module_config(args: &CliArgs) -> ModuleConfig {
    if args.module_paths.is_empty() {
        ModuleConfig::default()
    } else {
        ModuleConfig {
            load_paths: args.module_paths.clone(),
            extension: "lpy".to_string(),
        }
    }
}

fn bdd_has_failures() -> bool {
    bdd::results()
        .iter()
        .flat_map(|f| f.scenarios.iter())
        .flat_map(|s| s.steps.iter())
        .any(|step| step.status != "passed")
}

/// Prints a feature/scenario/step tree: indented Given/When/Then lines with
/// a pass/fail marker, then a one-line totals summary.
fn print_bdd_summary() {
    let features = bdd::results();
    let mut total_scenarios = 0usize;
    let mut failed_scenarios = 0usize;

    println!();
    for feature in &features {
        println!("Feature: {}", feature.description);
        for scenario in &feature.scenarios {
            total_scenarios += 1;
            let scenario_failed = scenario.steps.iter().any(|s| s.status != "passed");
            if scenario_failed {
                failed_scenarios += 1;
            }
            println!("  Scenario: {}", scenario.description);
            for step in &scenario.steps {
                let marker = if step.status == "passed" { "✓" } else { "✗" };
                println!("    {} {}: {}", marker, step.keyword, step.description);
                if let Some(details) = &step.details {
                    println!("        {}", details);
                }
            }
        }
    }
    println!(
        "\n{} scenario(s), {} failed",
        total_scenarios, failed_scenarios
    );
}
