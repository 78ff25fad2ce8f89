mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::Path;
use std::process;

use emi_core::CalculatorConfig;

use commands::loan::{ComputeArgs, DownPaymentArgs};
use commands::session::SessionArgs;

/// EMI and down-payment calculator
#[derive(Parser)]
#[command(
    name = "emi",
    version,
    about = "EMI and down-payment calculator",
    long_about = "Compute the equated monthly installment for a loan, solve the down payment \
                  for a target installment, or replay a sequence of slider events through \
                  the linked down-payment / EMI session."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Calculator config file (.json, .yaml or .yml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the EMI for a principal and down payment
    Compute(ComputeArgs),
    /// Solve the down payment that yields a target EMI
    DownPayment(DownPaymentArgs),
    /// Replay slider events through a loan session
    Session(SessionArgs),
    /// List the configured tenure options
    Tenures,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: Option<&str>) -> Result<CalculatorConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(CalculatorConfig::from_path(Path::new(p))?),
        None => Ok(CalculatorConfig::default()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    log::debug!("using config {:?}", config);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compute(args) => commands::loan::run_compute(args, &config),
        Commands::DownPayment(args) => commands::loan::run_down_payment(args, &config),
        Commands::Session(args) => commands::session::run_session(args, &config),
        Commands::Tenures => commands::loan::run_tenures(&config),
        Commands::Version => {
            println!("emi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
