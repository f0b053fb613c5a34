use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use strata_core::prelude::*;
use strata_utils::{
    info, init_logging, init_logging_to_dir, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard,
};

mod demo;
mod defaults;

/// Inspect and exercise a layered debugger target stack.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(version)]
#[command(about = "Inspect and exercise a layered debugger target stack", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,
    /// Write logs to a dated file in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Architecture used by the base layer (arm64 or x86_64); overrides STRATA_ARCH
    #[arg(long, global = true)]
    arch: Option<Architecture>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// List the operation catalog
    Catalog
    {
        /// Only show operations with this fallback policy
        #[arg(long, value_enum)]
        policy: Option<Policy>,
    },
    /// Show the descriptor of one operation
    Describe
    {
        /// Operation name, e.g. insert_breakpoint
        op: String,
    },
    /// Dispatch every operation on a stack holding only the base layer
    Defaults,
    /// Run the layering scenarios against in-memory layers
    Demo,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy
{
    Forward,
    TerminalDefault,
    SearchStack,
}

impl From<Policy> for Fallback
{
    fn from(policy: Policy) -> Self
    {
        match policy {
            Policy::Forward => Fallback::Forward,
            Policy::TerminalDefault => Fallback::TerminalDefault,
            Policy::SearchStack => Fallback::SearchStack,
        }
    }
}

fn main()
{
    let cli = Cli::parse();

    // Held until exit so buffered file output is flushed
    let _guard = match start_logging(&cli) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn start_logging(cli: &Cli) -> Result<LoggingGuard, LoggingError>
{
    match (&cli.log_dir, cli.log_level) {
        (Some(dir), level) => init_logging_to_dir(dir, level),
        (None, Some(level)) => init_logging_with_level(level, LogFormat::default()),
        (None, None) => init_logging(),
    }
}

fn base_config(arch: Option<Architecture>) -> StrataResult<BaseConfig>
{
    match arch {
        Some(arch) => Ok(BaseConfig::with_arch(arch)),
        None => BaseConfig::from_env(),
    }
}

fn run_command(cli: Cli) -> StrataResult<()>
{
    match cli.command {
        Commands::Catalog { policy } => {
            print_catalog(policy.map(Fallback::from));
            Ok(())
        }
        Commands::Describe { op } => {
            let op = Op::from_name(&op).ok_or_else(|| StrataError::InvalidArgument(format!("unknown operation: {op}")))?;
            print_descriptor(op.descriptor());
            Ok(())
        }
        Commands::Defaults => {
            let config = base_config(cli.arch)?;
            info!("Listing base layer answers for {}", config.arch);
            defaults::run(&config);
            Ok(())
        }
        Commands::Demo => {
            let config = base_config(cli.arch)?;
            info!("Running demo scenarios for {}", config.arch);
            demo::attach_scenario(&config)?;
            println!();
            demo::breakpoint_scenario(&config)
        }
    }
}

fn print_catalog(policy: Option<Fallback>)
{
    println!("{:<32} {:<17} {:<12} {}", "OPERATION", "POLICY", "BASE", "RETURNS");
    for entry in CATALOG.iter().filter(|entry| policy.map_or(true, |p| entry.fallback == p)) {
        println!(
            "{:<32} {:<17} {:<12} {}",
            entry.name,
            entry.fallback.to_string(),
            entry.default.to_string(),
            entry.returns
        );
    }
}

fn print_descriptor(entry: &OpDescriptor)
{
    println!("{}", entry.name);
    println!("  Parameters: {}", entry.params.join(", "));
    println!("  Returns:    {}", entry.returns);
    println!("  Policy:     {}", entry.fallback);
    println!("  Base:       {}", entry.default);
}
