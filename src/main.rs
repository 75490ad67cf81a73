mod cli;
mod config;
mod git;
mod logging;
mod report;
mod sequencer;

use std::process;

use clap::Parser;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli::run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
