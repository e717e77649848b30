use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use miette::{IntoDiagnostic, Result};
use pipecheck::{
    LockstepConfig, ReturnCode, RunConfig, SequenceKind, SequenceSpec, Test, run_lockstep,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pipecheck", version, about = "Verify the single-cycle pipeline stage")]
struct Cli {
    /// Log every driven item and sampled transaction
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a sequence list through the full test bench
    Run(RunArgs),
    /// Stress the stage with random controls, checked every cycle
    Lockstep(LockstepArgs),
    /// List the available sequences and their default counts
    List,
}

#[derive(clap::Args)]
struct RunArgs {
    /// TOML run configuration; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Sequence to run, as KIND or KIND:COUNT; repeatable, runs in order
    #[arg(long = "sequence", value_name = "KIND[:COUNT]")]
    sequences: Vec<SequenceSpec>,

    /// Dump a VCD waveform to this file
    #[arg(long)]
    vcd: Option<PathBuf>,

    #[arg(long)]
    timeout_ps: Option<u64>,

    /// Print a progress indicator on stderr
    #[arg(long)]
    progress: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct LockstepArgs {
    #[arg(long, default_value_t = pipecheck::lockstep::DEFAULT_LOCKSTEP_SEED)]
    seed: u64,

    #[arg(long, default_value_t = pipecheck::lockstep::DEFAULT_LOCKSTEP_CYCLES)]
    cycles: u64,

    /// Print a progress indicator on stderr
    #[arg(long)]
    progress: bool,

    #[arg(long)]
    json: bool,
}

const LOCKSTEP_CYCLES_PER_TIC: u32 = 1_000;

fn run(args: RunArgs) -> Result<ReturnCode> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path).into_diagnostic()?,
        None => RunConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if !args.sequences.is_empty() {
        config.sequences = args.sequences;
    }
    if let Some(vcd) = args.vcd {
        config.vcd = Some(vcd);
    }
    if let Some(timeout) = args.timeout_ps {
        config.timeout_ps = timeout;
    }
    config.progress |= args.progress;

    info!("seed: {:#x}", config.seed);
    let mut test = Test::builder().with_config(config).build().into_diagnostic()?;
    if let Err(e) = test.run() {
        if args.json {
            println!("{}", test.summary().to_json().into_diagnostic()?);
        }
        return Err(e).into_diagnostic();
    }
    let summary = test.report();
    if args.json {
        println!("{}", summary.to_json().into_diagnostic()?);
    }
    Ok(summary.return_code)
}

fn lockstep(args: LockstepArgs) -> Result<ReturnCode> {
    let config = LockstepConfig {
        seed: args.seed,
        cycles: args.cycles,
        progress: args.progress.then_some(LOCKSTEP_CYCLES_PER_TIC),
        ..LockstepConfig::default()
    };
    let report = run_lockstep(&config).into_diagnostic()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?);
    }
    Ok(if report.is_pass() {
        ReturnCode::Success
    } else {
        ReturnCode::TestFail
    })
}

fn list() -> ReturnCode {
    for kind in SequenceKind::value_variants() {
        if let Some(value) = kind.to_possible_value() {
            println!("{:<32} {:>6}", value.get_name(), kind.default_count());
        }
    }
    ReturnCode::Success
}

/// Errors end the process as fatal.
fn exit_status(outcome: Result<ReturnCode>) -> ReturnCode {
    outcome.unwrap_or_else(|report| {
        eprintln!("{report:?}");
        ReturnCode::Fatal
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let outcome = match cli.command {
        Command::Run(args) => run(args),
        Command::Lockstep(args) => lockstep(args),
        Command::List => Ok(list()),
    };
    ExitCode::from(exit_status(outcome).code())
}
