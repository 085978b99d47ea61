// src/cli/dataset.rs
// Offline prompt tooling: print an encoded prompt, render a training set

use anyhow::Result;
use std::path::Path;

use crate::dataset::{read_examples, write_rendered};
use crate::prompt;

pub fn run_prompt(instruction: &str, input: Option<&str>) {
    println!("{}", prompt::encode(instruction, input));
}

pub fn run_dataset(input: &Path, output: &Path) -> Result<()> {
    let examples = read_examples(input)?;
    let written = write_rendered(&examples, output)?;
    println!("Rendered {} examples to {}", written, output.display());
    Ok(())
}
