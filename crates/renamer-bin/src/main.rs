mod cli;
mod collect;
mod confirm;

use anyhow::{Context, Result};
use cli::{Cli, Commands, FormatArgs, ModeArg, RuleKind};
use renamer_core::{
    apply_mapping, apply_mapping_with, persist, rename_no_clobber, ApplySummary, Mapping, Mode,
    Renamer,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    setup_logging(&cli)?;

    info!("Starting renamer");

    match cli.command {
        Commands::Run {
            path,
            pattern,
            recursive,
            rule_file,
            rule,
            dry_run,
            process_extension,
            output,
            plan,
            interactive,
        } => {
            let options = RunOptions {
                dry_run,
                process_extension,
                output,
                plan,
                interactive,
            };
            handle_run_command(path, pattern, recursive, rule_file, rule, &cli.formats, options)?;
        }
        Commands::Apply {
            mapping,
            mode,
            dry_run,
            output,
            interactive,
        } => {
            handle_apply_command(mapping, mode, dry_run, output, interactive)?;
        }
        Commands::Rule { kind, append } => {
            handle_rule_command(&kind, append)?;
        }
    }

    info!("Renamer completed successfully");
    Ok(())
}

struct RunOptions {
    dry_run: bool,
    process_extension: bool,
    output: Option<PathBuf>,
    plan: Option<PathBuf>,
    interactive: bool,
}

fn handle_run_command(
    paths: Vec<PathBuf>,
    pattern: Option<String>,
    recursive: bool,
    rule_file: Option<PathBuf>,
    rule: Option<String>,
    formats: &FormatArgs,
    options: RunOptions,
) -> Result<()> {
    let rules_json = match (rule_file, rule) {
        (Some(file), _) => fs::read_to_string(&file)
            .with_context(|| format!("Failed to read rule file: {:?}", file))?,
        (None, Some(inline)) => inline,
        (None, None) => anyhow::bail!("No rules given; use --rule or --rule-file"),
    };

    let files = collect::collect_files(&paths, pattern.as_deref(), recursive)?;
    if files.is_empty() {
        anyhow::bail!("No files to rename in {:?}", paths);
    }

    let mut renamer = Renamer::new();
    renamer.set_date_formats(formats.to_formats());
    renamer
        .load_rules(&rules_json)
        .context("Failed to parse rules")?;
    if renamer.rules().is_empty() {
        anyhow::bail!("The rule list is empty");
    }
    for (id, error) in renamer.chain().validate() {
        warn!("Rule {} is invalid: {}", id, error);
    }

    renamer.add_files(files);
    renamer.set_dry_run(options.dry_run);
    renamer.set_process_extension(options.process_extension);

    info!("Files: {}", renamer.files().len());
    info!("Rules: {}", renamer.rules().len());
    info!("Interactive mode: {}", options.interactive);

    if options.dry_run {
        warn!("Dry run mode - no changes will be made");
    }

    let results = if options.interactive && !options.dry_run {
        renamer.apply_batch_with(confirm_then_rename)
    } else {
        renamer.apply_batch()
    };

    if let Some(plan) = &options.plan {
        persist::save_plan(plan, renamer.mappings())
            .with_context(|| format!("Failed to write plan: {:?}", plan))?;
        info!("Plan written to {:?}", plan);
    }

    report(&results, options.output.as_deref())
}

fn handle_apply_command(
    mapping: PathBuf,
    mode: Option<ModeArg>,
    dry_run: bool,
    output: Option<PathBuf>,
    interactive: bool,
) -> Result<()> {
    let mode = mode.map(Mode::from).unwrap_or_else(|| default_mode(&mapping));
    let mappings = persist::load_mappings(&mapping)
        .with_context(|| format!("Failed to load mappings: {:?}", mapping))?;

    info!("Applying {:?} in {} mode", mapping, mode);
    info!("Interactive mode: {}", interactive);

    if dry_run {
        warn!("Dry run mode - no changes will be made");
    }

    let results = if interactive && !dry_run {
        apply_mapping_with(&mappings, mode, dry_run, confirm_then_rename)
    } else {
        apply_mapping(&mappings, mode, dry_run)
    };

    report(&results, output.as_deref())
}

/// Saved results are usually replayed to retry failures. A CSV plan has no status, so it is
/// applied as a fresh batch.
fn default_mode(mapping: &Path) -> Mode {
    let is_plan = mapping
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_plan {
        Mode::Normal
    } else {
        Mode::ErrorRetry
    }
}

fn handle_rule_command(kind: &RuleKind, append: Option<PathBuf>) -> Result<()> {
    let rule = kind.build();

    match append {
        Some(file) => {
            let mut rules = if file.exists() {
                let data = fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read rule file: {:?}", file))?;
                persist::rules_from_json(&data)
                    .with_context(|| format!("Failed to parse rule file: {:?}", file))?
            } else {
                Vec::new()
            };
            info!("Appending rule '{}' to {:?}", rule.name, file);
            rules.push(rule);
            fs::write(&file, persist::rules_to_json(&rules)?)
                .with_context(|| format!("Failed to write rule file: {:?}", file))?;
            println!("Rule file now holds {} rule(s)", rules.len());
        }
        None => println!("{}", persist::rules_to_json(&[rule])?),
    }

    Ok(())
}

fn confirm_then_rename(from: &Path, to: &Path) -> io::Result<()> {
    match confirm::show_rename_and_confirm(from, to) {
        Ok(true) => rename_no_clobber(from, to),
        Ok(false) => Err(io::Error::new(io::ErrorKind::Interrupted, "skipped by user")),
        Err(e) => Err(io::Error::other(e.to_string())),
    }
}

fn report(results: &[Mapping], output: Option<&Path>) -> Result<()> {
    for mapping in results {
        eprintln!("{}", confirm::describe(mapping));
    }
    println!("{}", persist::mappings_to_json(results)?);

    if let Some(output) = output {
        persist::save_mappings(output, results)
            .with_context(|| format!("Failed to write results: {:?}", output))?;
        info!("Results written to {:?}", output);
    }

    let summary = ApplySummary::from_results(results);
    info!(
        "Batch summary: {} entries, {} succeeded, {} failed, {} pending",
        summary.total, summary.succeeded, summary.failed, summary.pending
    );
    eprintln!("Rename complete!");
    eprintln!("  Entries: {}", summary.total);
    eprintln!("  Succeeded: {}", summary.succeeded);
    eprintln!("  Failed: {}", summary.failed);
    eprintln!("  Pending: {}", summary.pending);

    if summary.has_failures() {
        warn!("{} rename(s) failed; retry with `renamer apply --mode error`", summary.failed);
    }

    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact()
        )
        .with(filter)
        .init();

    Ok(())
}
