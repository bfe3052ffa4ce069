use clap::Parser;
use std::process::ExitCode;

use mail_triage_lib::commands::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    mail_triage_lib::init_tracing();

    let cli = Cli::parse();
    match commands::execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
