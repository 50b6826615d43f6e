pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "navigator",
    about = "Navigator operator CLI",
    long_about = "Operate the Navigator equipment assistant: migrations, demo data, config inspection, readiness checks, and offline recommendations.",
    after_help = "Examples:\n  navigator doctor --json\n  navigator seed\n  navigator recommend \"uplights for a wedding\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo equipment, orders, and jobs into the configured database")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LLM readiness, and DB connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run the recommendation pipeline for one prompt without starting the server")]
    Recommend {
        #[arg(required = true, help = "What the event needs, in plain words")]
        prompt: Vec<String>,
        #[arg(long, help = "JSON file holding earlier conversation messages")]
        history: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            let (passed, output) = commands::doctor::run(json);
            commands::CommandResult { exit_code: if passed { 0 } else { 1 }, output }
        }
        Command::Recommend { prompt, history } => {
            commands::recommend::run(&prompt.join(" "), history.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
