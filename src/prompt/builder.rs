// src/prompt/builder.rs
// Renders instructions into the single-line template the model was tuned on

use super::{ANSWER_LABEL, INPUT_LABEL, INSTRUCTION_LABEL, escape_newlines};

/// Encode an instruction (and optional input) into an inference prompt.
///
/// The answer section is left empty for the model to complete. An empty or
/// missing `context` drops the input section entirely. Nothing is validated
/// here: an empty instruction still yields a well-formed template.
pub fn encode(instruction: &str, context: Option<&str>) -> String {
    render(instruction, context, "")
}

/// Encode a complete training example, answer section included.
///
/// This is the text the external trainer tokenizes, so it must stay in sync
/// with [`encode`]: the inference prompt is always a prefix of it.
pub fn encode_training_example(instruction: &str, input: Option<&str>, output: &str) -> String {
    render(instruction, input, output)
}

fn render(instruction: &str, input: Option<&str>, answer: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str(INSTRUCTION_LABEL);
    prompt.push('\n');
    prompt.push_str(instruction);
    prompt.push_str("\n\n");

    if let Some(input) = input.filter(|i| !i.is_empty()) {
        prompt.push_str(INPUT_LABEL);
        prompt.push('\n');
        prompt.push_str(input);
        prompt.push_str("\n\n");
    }

    prompt.push_str(ANSWER_LABEL);
    prompt.push('\n');
    prompt.push_str(answer);

    escape_newlines(&prompt)
}
