pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "chowbot",
    about = "Chowbot operator CLI",
    long_about = "Inspect chowbot configuration, check provider readiness, and ask the agent one-off questions without a chat connection.",
    after_help = "Examples:\n  chowbot doctor --json\n  chowbot config\n  chowbot ask \"台南火車站附近的牛肉湯\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, provider credentials, and storage readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Send one message through the agent and print the reply")]
    Ask {
        #[arg(help = "Message text, as a chat user would type it")]
        text: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::CommandResult::text(commands::config::run()),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Ask { text } => commands::ask::run(&text),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
