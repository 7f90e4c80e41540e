pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "helioflow",
    about = "Helioflow operator CLI",
    long_about = "Operate Helioflow migrations, demo fixtures, step catalog inspection, and readiness checks.",
    after_help = "Examples:\n  helioflow migrate\n  helioflow seed\n  helioflow catalog\n  helioflow doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo step catalog and a sample lead with an initialized timeline")]
    Seed,
    #[command(about = "List the step catalog in order with role assignments")]
    Catalog,
    #[command(about = "Validate config, database connectivity, and step catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Catalog => commands::catalog::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
