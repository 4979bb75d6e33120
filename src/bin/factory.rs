//! Factory solver executable.
//!
//! Reads one JSON factory description and writes one JSON plan document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use factory_planner::factory::solve_factory;
use factory_planner::models::FactoryInput;

#[derive(Parser)]
#[command(name = "factory")]
#[command(about = "Minimum-machine production planner for factory maps")]
struct Cli {
    /// Input document; reads standard input when omitted
    input: Option<PathBuf>,

    /// Pretty-print the output document
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    factory_planner::logging::init();
    let cli = Cli::parse();

    factory_planner::shell::run::<FactoryInput, _, _>(cli.input.as_deref(), cli.pretty, |input| {
        solve_factory(input)
    })
}
