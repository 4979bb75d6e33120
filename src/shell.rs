//! One-document-in, one-document-out shell shared by the executables.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SolverResult;

/// Read the input document from `path`, or from standard input when no path
/// is given.
pub fn read_document(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read standard input")?;
            Ok(buffer)
        }
    }
}

/// Parse the input document, run the solver, and print the output document
/// on stdout. Solver verdicts (including infeasibility) succeed; malformed
/// input and solver failures bubble up for a non-zero exit.
pub fn run<I, O, F>(path: Option<&Path>, pretty: bool, solve: F) -> Result<()>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(&I) -> SolverResult<O>,
{
    let raw = read_document(path)?;
    let input: I = serde_json::from_str(&raw).context("invalid input: malformed document")?;
    let output = solve(&input)?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{rendered}");
    Ok(())
}
