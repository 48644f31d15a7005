mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::irr::IrrArgs;
use commands::loan::{BalanceArgs, LoanArgs, ScheduleArgs};
use commands::metrics::MetricsArgs;
use commands::partners::PartnersArgs;
use commands::scenarios::ScenariosArgs;
use commands::tax::{TaxArgs, TaxCompareArgs};

/// Real-estate investment calculations
#[derive(Parser)]
#[command(
    name = "propcalc",
    version,
    about = "Real-estate investment calculations",
    long_about = "A CLI for buy-to-let and co-investment analysis with decimal precision. \
                  Supports mortgage amortization, IRR, yield metrics, rental-vs-sale \
                  scenarios, partner allocation and Portuguese/Dutch property taxes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Policy file (JSON or YAML) overriding rating bands, defaults and tax tables
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log engine diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly annuity payment of a fixed-rate loan
    Payment(LoanArgs),
    /// Outstanding loan balance after a number of payments
    Balance(BalanceArgs),
    /// Month-by-month (or yearly) repayment plan
    Schedule(ScheduleArgs),
    /// Internal rate of return of annual cash flows
    Irr(IrrArgs),
    /// Yields, DSCR, cash-on-cash and break-even occupancy for one year
    Metrics(MetricsArgs),
    /// Compare long-term rental, short-stay rental and sale
    Scenarios(ScenariosArgs),
    /// Split equity, rent, exit value and IRR among co-owners
    Partners(PartnersArgs),
    /// Transfer, recurring and rental income tax in one jurisdiction
    Tax(TaxArgs),
    /// Side-by-side taxes across jurisdictions
    TaxCompare(TaxCompareArgs),
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

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let policy = match config::load_policy(cli.config.as_deref()) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Balance(args) => commands::loan::run_balance(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Irr(args) => commands::irr::run_irr(args, &policy),
        Commands::Metrics(args) => commands::metrics::run_metrics(args, &policy),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args, &policy),
        Commands::Partners(args) => commands::partners::run_partners(args, &policy),
        Commands::Tax(args) => commands::tax::run_tax(args, &policy),
        Commands::TaxCompare(args) => commands::tax::run_tax_compare(args, &policy),
        Commands::Version => {
            println!("propcalc {}", env!("CARGO_PKG_VERSION"));
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
