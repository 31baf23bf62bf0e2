use std::process;

use anyhow::Result;
use clap::{ArgMatches, Command};

const BIN_NAME: &str = "renamer";

fn main() -> Result<()> {
    let args = clap::command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("install").about("Install renamer binary locally"))
        .subcommand(
            Command::new("run")
                .about("Build and run renamer with arguments")
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .arg(clap::Arg::new("args")
                    .help("Arguments to pass to renamer")
                    .action(clap::ArgAction::Append)
                    .num_args(0..))
        )
        .subcommand(
            Command::new("test")
                .about("Test Operations")
                .subcommand(Command::new("all").about("Run all tests for the entire project"))
                .subcommand(Command::new("core").about("Run tests for renamer-core"))
                .subcommand(Command::new("bin").about("Run tests for renamer-bin"))
                .subcommand(Command::new("integration").about("Run CLI smoke tests")),
        )
        .get_matches();

    match args.subcommand() {
        Some(("install", _args)) => install(),
        Some(("run", args)) => run(args),
        Some(("test", args)) => handle_test_commands(args),
        Some((command, _)) => anyhow::bail!("Unexpected command: {command}"),
        None => anyhow::bail!("Expected subcommand"),
    }
}

fn cargo(args: &[&str], failure: &str) -> Result<()> {
    let status = process::Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{failure}");
    }
    Ok(())
}

fn install() -> Result<()> {
    println!("Installing {BIN_NAME}...");
    cargo(&["install", "--path", "crates/renamer-bin"], "Failed to install renamer")?;
    println!("✓ {BIN_NAME} installed successfully");
    Ok(())
}

fn run(args: &ArgMatches) -> Result<()> {
    let run_args: Vec<&str> = args
        .get_many::<String>("args")
        .map_or(Vec::new(), |vals| vals.map(String::as_str).collect());

    let mut command = vec!["run", "--bin", BIN_NAME, "--"];
    command.extend(run_args);
    cargo(&command, "Failed to run renamer")
}

fn handle_test_commands(args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("all", _args)) => test_all(),
        Some(("core", _args)) => test_core(),
        Some(("bin", _args)) => test_bin(),
        Some(("integration", _args)) => test_integration(),
        _ => {
            println!("Available test commands:");
            println!("  all          - Run all tests for the entire project");
            println!("  core         - Run tests for renamer-core");
            println!("  bin          - Run tests for renamer-bin");
            println!("  integration  - Run CLI smoke tests");
            Ok(())
        }
    }
}

fn test_all() -> Result<()> {
    println!("🧪 Running all tests for the renamer project...\n");

    let suites: [(&str, fn() -> Result<()>); 4] = [
        ("renamer-core", test_core),
        ("renamer-bin", test_bin),
        ("documentation", test_docs),
        ("integration", test_integration),
    ];

    let mut failed = Vec::new();
    for (name, suite) in suites {
        match suite() {
            Ok(()) => println!("✅ {name} tests passed\n"),
            Err(e) => {
                println!("❌ {name} tests failed: {e}\n");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Test suite failed: {}", failed.join(", "));
    }
    println!("🎉 All tests passed successfully!");
    Ok(())
}

fn test_core() -> Result<()> {
    println!("🧪 Running renamer-core tests...");
    cargo(&["test", "--package", "renamer-core"], "Core tests failed")
}

fn test_bin() -> Result<()> {
    println!("🧪 Running renamer-bin tests...");
    cargo(&["test", "--package", "renamer-bin"], "Binary tests failed")
}

fn test_docs() -> Result<()> {
    println!("📖 Running documentation tests...");
    cargo(&["test", "--doc", "--package", "renamer-core"], "Documentation tests failed")
}

fn test_integration() -> Result<()> {
    println!("🔗 Running CLI smoke tests...");
    cargo(&["build", "--bin", BIN_NAME], "Failed to build renamer binary")?;
    cargo(&["run", "--bin", BIN_NAME, "--", "--help"], "CLI help command failed")?;
    cargo(&["run", "--bin", BIN_NAME, "--", "--version"], "CLI version command failed")?;
    cargo(
        &["run", "--bin", BIN_NAME, "--", "rule", "add-prefix", "x_"],
        "CLI rule command failed",
    )
}
