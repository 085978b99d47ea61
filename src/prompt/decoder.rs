// src/prompt/decoder.rs
// Extracts the answer section from a raw completion

use thiserror::Error;

use super::restore_newlines;
use crate::llm::{Token, render_tokens};

/// Why a completion could not be turned into an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    /// No end-of-sequence token within the generation budget
    #[error("no end-of-sequence token in completion")]
    Incomplete,

    /// The model did not reproduce the answer header
    #[error("answer label not found in completion")]
    TemplateMismatch,
}

impl DecodeFailure {
    /// Fixed message shown to the user in place of an answer
    pub fn fallback_message(&self) -> &'static str {
        match self {
            DecodeFailure::Incomplete => "申し訳ありません。応答の生成が完了しませんでした。",
            DecodeFailure::TemplateMismatch => "申し訳ありません。適切な応答を生成できませんでした。",
        }
    }

    /// Machine-readable status reported alongside the fallback message
    pub fn status(&self) -> &'static str {
        match self {
            DecodeFailure::Incomplete => "incomplete",
            DecodeFailure::TemplateMismatch => "template_mismatch",
        }
    }
}

/// Decode a raw token sequence into the answer text.
///
/// Only the first `eos_token_id` and the first `answer_label` count; anything
/// after the end-of-sequence token is discarded unseen. The answer is the text
/// following the label with `<NL>` restored and surrounding whitespace trimmed.
pub fn decode(tokens: &[Token], eos_token_id: u32, answer_label: &str) -> Result<String, DecodeFailure> {
    let eos_index = tokens
        .iter()
        .position(|t| t.id == eos_token_id)
        .ok_or(DecodeFailure::Incomplete)?;

    let rendered = render_tokens(&tokens[..eos_index]);

    let label_at = rendered
        .find(answer_label)
        .ok_or(DecodeFailure::TemplateMismatch)?;

    let answer = &rendered[label_at + answer_label.len()..];
    Ok(restore_newlines(answer).trim().to_string())
}
