//! Reference table effects CLI
//!
//! Lists comparison rules, compares two versions of a reference table for a
//! dataset, and decides whether a reference update requires reprocessing.
//!
//! Usage:
//!   reftab rules [--instrument I]
//!   reftab compare --instrument I --filekind K [--param k=v]... OLD NEW
//!   reftab decide --dataset ID --instrument I --filekind K \
//!       --old-reference R1 --new-reference R2 [--old-context C1] \
//!       --new-context C2 --references DIR [--param k=v]...

mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use logging::LogFormat;
use reftab_effects::{
    Config, DatasetParameters, Decision, DecisionReason, DifferencingEngine, DifferencingResult,
    FileTableLoader, ReferenceCache, ReferenceUpdate, ReprocessingDecision, RuleRegistry, Verdict,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Reference table effects
#[derive(Parser, Debug)]
#[command(name = "reftab")]
#[command(
    author,
    version,
    about = "Decide whether reference table changes affect datasets"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "REFTAB_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List comparison rules and their mode fields
    Rules {
        /// Only show rules for this instrument
        #[arg(short, long)]
        instrument: Option<String>,
    },
    /// Compare two table files for a dataset's mode
    Compare(CompareArgs),
    /// Decide whether a reference update requires reprocessing
    Decide(DecideArgs),
}

#[derive(clap::Args, Debug)]
struct ParamArgs {
    /// Dataset parameter as KEY=VALUE (repeatable; overrides --params)
    #[arg(short, long = "param", value_parser = parse_param)]
    param: Vec<(String, String)>,

    /// JSON object of dataset parameters
    #[arg(long = "params")]
    params_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct CompareArgs {
    #[arg(long)]
    instrument: String,

    #[arg(long)]
    filekind: String,

    #[command(flatten)]
    params: ParamArgs,

    /// Old version of the table
    old: PathBuf,

    /// New version of the table
    new: PathBuf,
}

#[derive(clap::Args, Debug)]
struct DecideArgs {
    #[arg(long)]
    dataset: String,

    #[arg(long)]
    instrument: String,

    #[arg(long)]
    filekind: String,

    #[arg(long)]
    old_reference: String,

    #[arg(long)]
    new_reference: String,

    /// Context of the old assignment; omit when there is none
    #[arg(long)]
    old_context: Option<String>,

    #[arg(long)]
    new_context: String,

    /// Directory holding the reference files
    #[arg(long)]
    references: PathBuf,

    #[command(flatten)]
    params: ParamArgs,
}

/// Failure of a command, split by exit status.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Bad invocation or configuration
    #[error("{0:#}")]
    Usage(anyhow::Error),
    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Failed(err)
    }
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Failed(_) => 1,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, args.log_format);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{RED}{BOLD}error:{RESET} {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref()).map_err(CliError::Usage)?;
    let registry = config.build_registry().map_err(CliError::Usage)?;
    debug!("Registry holds {} rule(s)", registry.len());

    match &args.command {
        Command::Rules { instrument } => {
            print_rules(&registry, instrument.as_deref(), args.output);
            Ok(())
        }
        Command::Compare(compare) => {
            let params = collect_params(&compare.params).map_err(CliError::Usage)?;
            let rule = registry
                .lookup(&compare.instrument, &compare.filekind)
                .map_err(|e| CliError::Usage(e.into()))?;
            let result = DifferencingEngine::new(FileTableLoader)
                .evaluate_files(rule, &params, &compare.old, &compare.new)
                .context("Comparison failed")?;
            print_comparison(rule.name(), &result, args.output);
            Ok(())
        }
        Command::Decide(decide) => {
            let params = collect_params(&decide.params).map_err(CliError::Usage)?;
            let update = ReferenceUpdate {
                instrument: decide.instrument.clone(),
                filekind: decide.filekind.clone(),
                old_reference: decide.old_reference.clone(),
                new_reference: decide.new_reference.clone(),
            };
            let decision =
                ReprocessingDecision::new(&registry, ReferenceCache::new(&decide.references))
                    .with_meaningless_references(&config.meaningless_references);
            let outcome = decision.decide_detailed(
                &decide.dataset,
                &params,
                decide.old_context.as_deref(),
                &decide.new_context,
                &update,
            );
            print_decision(&decide.dataset, &update, &outcome, args.output);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Invalid configuration {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn collect_params(args: &ParamArgs) -> anyhow::Result<DatasetParameters> {
    let mut params = match &args.params_file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON {}", path.display()))?;
            DatasetParameters::from_json(&value)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?
        }
        None => DatasetParameters::new(),
    };
    for (key, value) in &args.param {
        params.insert(key.clone(), value.clone());
    }
    Ok(params)
}

#[derive(Serialize)]
struct RuleEntry<'a> {
    key: &'a str,
    #[serde(flatten)]
    rule: &'a reftab_effects::RuleSpec,
}

fn print_rules(registry: &RuleRegistry, instrument: Option<&str>, output: OutputFormat) {
    let prefix = instrument.map(|i| format!("{}_", i.to_lowercase()));
    let entries: Vec<RuleEntry> = registry
        .entries()
        .filter(|(key, _)| prefix.as_deref().map_or(true, |p| key.starts_with(p)))
        .map(|(key, rule)| RuleEntry { key, rule })
        .collect();

    if output == OutputFormat::Json {
        print_json(&entries);
        return;
    }

    println!("{BOLD}{CYAN}Comparison rules{RESET}");
    println!("{DIM}━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━{RESET}");
    for entry in &entries {
        let fields = if entry.rule.is_match_all() {
            format!("{YELLOW}(all rows){RESET}")
        } else {
            entry.rule.field_names().collect::<Vec<_>>().join(", ")
        };
        println!(
            "  {CYAN}{:<18}{RESET} {BOLD}{:<14}{RESET} {DIM}[{RESET}{fields}{DIM}]{RESET}",
            entry.key,
            entry.rule.name()
        );
    }
    println!();
    println!("  {DIM}Rules:{RESET} {BOLD}{}{RESET}", entries.len());
}

fn print_comparison(rule: &str, result: &DifferencingResult, output: OutputFormat) {
    if output == OutputFormat::Json {
        #[derive(Serialize)]
        struct Comparison<'a> {
            rule: &'a str,
            different: bool,
            #[serde(flatten)]
            result: &'a DifferencingResult,
        }
        print_json(&Comparison {
            rule,
            different: result.is_different(),
            result,
        });
        return;
    }

    let status = match &result.verdict {
        Verdict::Same => format!("{GREEN}{BOLD}SAME{RESET}"),
        Verdict::Different => format!("{RED}{BOLD}DIFFERENT{RESET}"),
        _ => format!("{YELLOW}{BOLD}DIFFERENT{RESET} {DIM}(undetermined){RESET}"),
    };
    println!("{status} {DIM}rule{RESET} {CYAN}{rule}{RESET}");
    println!("  {}", result.message);
}

fn print_decision(
    dataset: &str,
    update: &ReferenceUpdate,
    decision: &Decision,
    output: OutputFormat,
) {
    if output == OutputFormat::Json {
        #[derive(Serialize)]
        struct Report<'a> {
            dataset: &'a str,
            #[serde(flatten)]
            update: &'a ReferenceUpdate,
            #[serde(flatten)]
            decision: &'a Decision,
        }
        print_json(&Report {
            dataset,
            update,
            decision,
        });
        return;
    }

    let status = if decision.reprocess {
        format!("{YELLOW}{BOLD}REPROCESS{RESET}")
    } else {
        format!("{GREEN}{BOLD}UNAFFECTED{RESET}")
    };
    println!(
        "{status} {BOLD}{dataset}{RESET} {DIM}{} {}:{RESET} {} {DIM}->{RESET} {}",
        update.instrument, update.filekind, update.old_reference, update.new_reference
    );
    println!("  {GREEN}->{RESET} {}", describe_reason(&decision.reason));
}

fn describe_reason(reason: &DecisionReason) -> String {
    match reason {
        DecisionReason::SingleContext => "No old context to compare against.".to_string(),
        DecisionReason::PlaceholderTransition { old_reference } => {
            format!("Previously assigned {old_reference}; now has a real reference.")
        }
        DecisionReason::UnknownRule { message }
        | DecisionReason::ContextFailure { message }
        | DecisionReason::TableFailure { message } => message.clone(),
        DecisionReason::Evaluated { rule, result } => format!("{rule}: {}", result.message),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(output) => println!("{output}"),
        Err(e) => eprintln!("{RED}error:{RESET} failed to render JSON: {e}"),
    }
}
