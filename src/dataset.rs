// src/dataset.rs
// Instruction-tuning examples rendered with the training-side prompt template

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::prompt::encode_training_example;

/// One record of a dolly-style instruction dataset
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TrainingExample {
    pub instruction: String,
    #[serde(default)]
    pub input: String,
    pub output: String,
}

impl TrainingExample {
    /// Full prompt text including the answer
    pub fn render(&self) -> String {
        encode_training_example(&self.instruction, Some(&self.input), &self.output)
    }
}

#[derive(Serialize)]
struct RenderedLine<'a> {
    text: &'a str,
}

/// Accepts a JSON array or one JSON object per line
pub fn parse_examples(content: &str) -> Result<Vec<TrainingExample>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON array of examples");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid example on line {}", i + 1))
        })
        .collect()
}

pub fn read_examples(path: &Path) -> Result<Vec<TrainingExample>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let examples = parse_examples(&content)?;
    debug!(path = %path.display(), count = examples.len(), "Loaded training examples");
    Ok(examples)
}

/// Write one `{"text": ...}` line per example; returns the count written
pub fn write_rendered(examples: &[TrainingExample], path: &Path) -> Result<usize> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    for example in examples {
        let text = example.render();
        serde_json::to_writer(&mut writer, &RenderedLine { text: &text })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    info!(path = %path.display(), count = examples.len(), "Wrote rendered dataset");
    Ok(examples.len())
}
