use baseline_verifier::cli;
use colored::*;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse the command line and process the command
    match cli::run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
