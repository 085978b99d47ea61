// src/prompt/mod.rs
// Instruction prompt protocol: fixed section labels and the <NL> newline convention

pub mod builder;
pub mod decoder;

pub use builder::{encode, encode_training_example};
pub use decoder::{DecodeFailure, decode};

/// Header introducing the task description
pub const INSTRUCTION_LABEL: &str = "### 指示:";

/// Header introducing the optional auxiliary input
pub const INPUT_LABEL: &str = "### 入力:";

/// Header the model fills in with its answer
pub const ANSWER_LABEL: &str = "### 回答:";

/// Stand-in for a literal newline inside single-line prompts
pub const NEWLINE_SENTINEL: &str = "<NL>";

/// Replace every `\n` with the `<NL>` sentinel.
///
/// Text that already contains `<NL>` literally is not protected; after a
/// round trip those occurrences come back as real newlines.
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', NEWLINE_SENTINEL)
}

/// Inverse of [`escape_newlines`]
pub fn restore_newlines(text: &str) -> String {
    text.replace(NEWLINE_SENTINEL, "\n")
}
