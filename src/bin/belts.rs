//! Belts solver executable.
//!
//! Reads one JSON belt-network description and writes one JSON routing
//! document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use factory_planner::belts::solve_belts;
use factory_planner::models::BeltsInput;

#[derive(Parser)]
#[command(name = "belts")]
#[command(about = "Belt-network routing feasibility solver")]
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

    factory_planner::shell::run::<BeltsInput, _, _>(cli.input.as_deref(), cli.pretty, |input| {
        solve_belts(input)
    })
}
