use clap::Parser;
use jinn_inventory_lib::cli::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides the verbosity flags
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    match jinn_inventory_lib::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("[main] {} error: {}", e.error_type(), e);
            ExitCode::FAILURE
        }
    }
}
