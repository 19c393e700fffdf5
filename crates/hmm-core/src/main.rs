//! HMM Belief Filter - command line driver
//!
//! The main entry point for hmm-core, handling:
//! - Model loading from files, presets, or the environment
//! - Replaying step scripts through the filter
//! - Model checks (validation and malformed rows)
//! - Preset listings, the definition schema, and shell completions

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use hmm_common::{format_error_human, Error, OutputFormat, StructuredError, SCHEMA_VERSION};
use hmm_config::{
    list_presets, load_model, model_issues, LoadOptions, LoadedModel, ModelDefinition, PresetName,
    DEFAULT_TOLERANCE, MODEL_SCHEMA_VERSION,
};
use hmm_core::exit_codes::ExitCode;
use hmm_core::log_event;
use hmm_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogLevel, Stage,
};
use hmm_core::{build_model, parse_script, run_script, FilterTrace, MalformedRow, Step};
use serde::Serialize;

/// HMM Belief Filter - track a belief over hidden states from actions and perceptions
#[derive(Parser)]
#[command(name = "hmm-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a model, replay steps, and print the belief trace
    Run(RunArgs),

    /// Validate a model definition and report malformed rows
    Check(CheckArgs),

    /// List built-in presets
    Presets,

    /// Print the JSON schema of model definition files
    Schema,

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

/// Where the model comes from.
#[derive(Args, Debug)]
struct ModelArgs {
    /// Model definition file (JSON, TOML, or YAML)
    #[arg(long, short = 'm', conflicts_with = "preset")]
    model: Option<PathBuf>,

    /// Built-in preset (umbrella, door)
    #[arg(long)]
    preset: Option<PresetName>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    source: ModelArgs,

    /// Step to apply: wait, act:<action>, or perceive:<perception> (repeatable)
    #[arg(long = "step", short = 's', value_name = "STEP")]
    steps: Vec<String>,

    /// File with one step per line, applied before any --step
    #[arg(long)]
    script: Option<PathBuf>,

    /// Skip semantic validation of the definition
    #[arg(long)]
    skip_validation: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    source: ModelArgs,

    /// Tolerance for probability row sums
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Help and version requests are not failures.
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = (cli.global.verbose > 0 || cli.global.quiet)
        .then(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    init_logging(&LogConfig::from_env(cli_level, None));

    let exit_code = match &cli.command {
        Commands::Run(args) => run_filter(&cli.global, args),
        Commands::Check(args) => run_check(&cli.global, args),
        Commands::Presets => run_presets(&cli.global),
        Commands::Schema => run_schema(&cli.global),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "hmm-core", &mut std::io::stdout());
            ExitCode::Clean
        }
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// run
// ============================================================================

fn run_filter(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "Starting run command"
    );

    match filter(&ctx, args) {
        Ok((loaded, trace)) => {
            log_event!(
                ctx,
                INFO,
                event_names::RUN_FINISHED,
                Stage::Report,
                "Run finished",
                steps = trace.steps.len()
            );
            output_trace(global, &ctx, &loaded, &trace)
        }
        Err(err) => {
            log_event!(
                ctx,
                INFO,
                event_names::FILTER_FAILED,
                Stage::Filter,
                err.to_string(),
                code = err.code()
            );
            output_error(global, &ctx, &err)
        }
    }
}

fn filter(ctx: &LogContext, args: &RunArgs) -> hmm_common::Result<(LoadedModel, FilterTrace)> {
    let steps = collect_steps(args)?;
    let loaded = load(ctx, &args.source, !args.skip_validation, DEFAULT_TOLERANCE)?;
    let mut model = build_model(&loaded.definition)?;

    log_event!(
        ctx,
        DEBUG,
        event_names::FILTER_STARTED,
        Stage::Filter,
        "Replaying steps",
        steps = steps.len()
    );
    let trace = run_script(&mut model, &steps)?;
    log_event!(
        ctx,
        INFO,
        event_names::FILTER_FINISHED,
        Stage::Filter,
        "Steps applied",
        log_evidence = trace.log_evidence
    );

    Ok((loaded, trace))
}

/// Script steps first, then `--step` flags in order.
fn collect_steps(args: &RunArgs) -> hmm_common::Result<Vec<Step>> {
    let mut steps = match &args.script {
        Some(path) => parse_script(&std::fs::read_to_string(path)?)?,
        None => Vec::new(),
    };
    for raw in &args.steps {
        steps.push(raw.parse()?);
    }
    Ok(steps)
}

fn load(
    ctx: &LogContext,
    source: &ModelArgs,
    validate: bool,
    tolerance: f64,
) -> hmm_common::Result<LoadedModel> {
    let options = LoadOptions {
        model_path: source.model.clone(),
        preset: source.preset,
        validate,
        tolerance,
    };

    match load_model(&options) {
        Ok(loaded) => {
            log_event!(
                ctx,
                INFO,
                event_names::MODEL_LOADED,
                Stage::Load,
                "Model loaded",
                model = loaded.snapshot.model_name.as_str(),
                source = loaded.snapshot.source.as_str(),
                hash = loaded.snapshot.short_id()
            );
            Ok(loaded)
        }
        Err(err) => {
            log_event!(
                ctx,
                INFO,
                event_names::MODEL_INVALID,
                Stage::Validate,
                err.to_string(),
                code = err.code()
            );
            Err(err.into())
        }
    }
}

fn output_trace(
    global: &GlobalOpts,
    ctx: &LogContext,
    loaded: &LoadedModel,
    trace: &FilterTrace,
) -> ExitCode {
    match global.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "model": loaded.snapshot,
                "trace": trace,
            });
            print_json(&output, true)
        }
        OutputFormat::Jsonl => {
            for record in &trace.steps {
                let code = print_json(record, false);
                if !code.is_success() {
                    return code;
                }
            }
            let summary = serde_json::json!({
                "run_id": ctx.run_id,
                "final_belief": trace.final_belief,
                "most_likely": trace.most_likely().map(|(state, _)| state),
                "log_evidence": trace.log_evidence,
            });
            print_json(&summary, false)
        }
        OutputFormat::Summary => {
            println!(
                "[{}] {}: {} steps, {}, log evidence {:.4}",
                ctx.run_id,
                loaded.definition.display_name(),
                trace.steps.len(),
                describe_most_likely(trace),
                trace.log_evidence
            );
            ExitCode::Clean
        }
        OutputFormat::Exitcode => ExitCode::Clean,
        OutputFormat::Md => {
            println!("# Belief trace: {}", loaded.definition.display_name());
            println!();
            println!(
                "Model: {} (hash {})",
                loaded.snapshot.source,
                loaded.snapshot.short_id()
            );
            println!();
            println!("| # | Step | Most likely | P | Entropy | Log evidence |");
            println!("|---|------|-------------|---|---------|--------------|");
            let (state, p) = match trace.initial_belief.most_likely() {
                Some((state, p)) => (state.to_string(), p),
                None => ("-".to_string(), 0.0),
            };
            println!(
                "| 0 | start | {} | {:.4} | {:.4} | 0.0000 |",
                state,
                p,
                trace.initial_belief.entropy()
            );
            for record in &trace.steps {
                println!(
                    "| {} | {} | {} | {:.4} | {:.4} | {:.4} |",
                    record.index,
                    record.step,
                    record
                        .most_likely
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "-".to_string()),
                    record.probability,
                    record.entropy,
                    record.log_evidence
                );
            }
            println!();
            println!("## Final belief");
            println!();
            println!("| State | P |");
            println!("|-------|---|");
            for (state, mass) in trace.final_belief.iter() {
                println!("| {} | {:.6} |", state, mass);
            }
            ExitCode::Clean
        }
    }
}

fn describe_most_likely(trace: &FilterTrace) -> String {
    match trace.most_likely() {
        Some((state, p)) => format!("most likely {} ({:.4})", state, p),
        None => "empty belief".to_string(),
    }
}

// ============================================================================
// check
// ============================================================================

#[derive(Debug, Serialize)]
struct Issue {
    code: u32,
    message: String,
}

fn run_check(global: &GlobalOpts, args: &CheckArgs) -> ExitCode {
    let ctx = LogContext::new(generate_run_id());

    let loaded = match load(&ctx, &args.source, false, args.tolerance) {
        Ok(loaded) => loaded,
        Err(err) => return output_error(global, &ctx, &err),
    };

    let mut issues: Vec<Issue> = model_issues(&loaded.definition, args.tolerance)
        .into_iter()
        .map(|e| Issue {
            code: e.code(),
            message: e.to_string(),
        })
        .collect();

    let malformed: Vec<MalformedRow> = match build_model(&loaded.definition) {
        Ok(model) => model.malformed_rows(args.tolerance),
        Err(err) => {
            // Unresolvable ids are already listed by validation.
            if issues.is_empty() {
                issues.push(Issue {
                    code: err.code(),
                    message: err.to_string(),
                });
            }
            Vec::new()
        }
    };

    let ok = issues.is_empty() && malformed.is_empty();
    if ok {
        log_event!(
            ctx,
            INFO,
            event_names::RUN_FINISHED,
            Stage::Validate,
            "Model is valid"
        );
    } else {
        log_event!(
            ctx,
            INFO,
            event_names::MODEL_INVALID,
            Stage::Validate,
            "Model has issues",
            issues = issues.len(),
            malformed_rows = malformed.len()
        );
    }

    let code = match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let output = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": if ok { "ok" } else { "invalid" },
                "model": loaded.snapshot,
                "tolerance": args.tolerance,
                "issues": issues,
                "malformed_rows": malformed,
            });
            print_json(&output, global.format == OutputFormat::Json)
        }
        OutputFormat::Summary => {
            println!(
                "[{}] {}: {} ({} issues, {} malformed rows)",
                ctx.run_id,
                loaded.definition.display_name(),
                if ok { "ok" } else { "invalid" },
                issues.len(),
                malformed.len()
            );
            ExitCode::Clean
        }
        OutputFormat::Exitcode => ExitCode::Clean,
        OutputFormat::Md => {
            println!("# Model check: {}", loaded.definition.display_name());
            println!();
            println!("Source: {}", loaded.snapshot.source);
            println!();
            if ok {
                println!("No issues found.");
            }
            for issue in &issues {
                println!("- [{}] {}", issue.code, issue.message);
            }
            for row in &malformed {
                println!(
                    "- {:?} row {} sums to {:.6}",
                    row.table, row.row, row.sum
                );
            }
            ExitCode::Clean
        }
    };

    if !code.is_success() || ok {
        code
    } else {
        ExitCode::ConfigError
    }
}

// ============================================================================
// presets, schema, version
// ============================================================================

fn run_presets(global: &GlobalOpts) -> ExitCode {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let output = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "presets": presets,
            });
            print_json(&output, global.format == OutputFormat::Json)
        }
        OutputFormat::Summary => {
            for preset in &presets {
                println!("{}: {}", preset.name.as_str(), preset.description);
            }
            ExitCode::Clean
        }
        OutputFormat::Exitcode => ExitCode::Clean,
        OutputFormat::Md => {
            println!("# Presets");
            println!();
            println!("| Name | States | Actions | Perceptions | Description |");
            println!("|------|--------|---------|-------------|-------------|");
            for preset in &presets {
                println!(
                    "| {} | {} | {} | {} | {} |",
                    preset.name.as_str(),
                    preset.states.join(", "),
                    preset.actions.join(", "),
                    preset.perceptions.join(", "),
                    preset.description
                );
            }
            ExitCode::Clean
        }
    }
}

fn run_schema(global: &GlobalOpts) -> ExitCode {
    match global.format {
        OutputFormat::Exitcode => ExitCode::Clean,
        OutputFormat::Jsonl => print_json(&ModelDefinition::json_schema(), false),
        _ => print_json(&ModelDefinition::json_schema(), true),
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "model_schema_version": MODEL_SCHEMA_VERSION,
        "hmm_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            print_json(&version_info, global.format == OutputFormat::Json);
        }
        OutputFormat::Exitcode => {}
        _ => {
            println!("hmm-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
            println!("model schema version: {}", MODEL_SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Output helpers
// ============================================================================

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> ExitCode {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(err) => {
            eprintln!("failed to serialize output: {}", err);
            ExitCode::InternalError
        }
    }
}

/// Report an error on stderr in the requested format.
fn output_error(global: &GlobalOpts, ctx: &LogContext, error: &Error) -> ExitCode {
    let exit_code = ExitCode::from(error);
    let structured = StructuredError::from(error);

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": exit_code.code_name(),
                "error": structured,
            });
            let rendered = if global.format == OutputFormat::Json {
                serde_json::to_string_pretty(&response)
            } else {
                serde_json::to_string(&response)
            };
            eprintln!("{}", rendered.unwrap_or_else(|_| structured.to_json()));
        }
        OutputFormat::Summary => {
            eprintln!("[{}] error: {}", ctx.run_id, error);
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            eprintln!("{}", format_error_human(error));
        }
    }

    exit_code
}
