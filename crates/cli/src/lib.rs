pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "shopbot",
    about = "Shopbot operator CLI",
    long_about = "Inspect chatbot configuration, check readiness, and ask the shop assistant questions from the terminal.",
    after_help = "Examples:\n  shopbot doctor --json\n  shopbot config\n  shopbot ask \"Kādi produkti jums ir?\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Resolve one chat message against the configured catalog")]
    Ask {
        #[arg(help = "Message text as a shopper would type it")]
        message: String,
        #[arg(long, help = "JSON file with prior messages ([{\"role\":\"user\",\"content\":\"...\"}])")]
        history_file: Option<PathBuf>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, inference credential mode, templates, and catalog")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { message, history_file } => {
            commands::ask::run(&message, history_file.as_deref())
        }
        Command::Config => commands::CommandResult::report(commands::config::run()),
        Command::Doctor { json } => commands::CommandResult::report(commands::doctor::run(json)),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
