mod app;
mod color;
mod data;
mod error;
mod normalize;
mod plots;
mod runner;
mod stats;

use std::process::ExitCode;

use clap::Parser;

use app::Cli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match app::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
