mod app;
mod cli;
mod display;
mod input;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    if cli.headless {
        app::run_headless(&cli)
    } else {
        app::run(&cli)
    }
}
