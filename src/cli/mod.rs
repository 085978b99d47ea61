// src/cli/mod.rs
// CLI module for rinna-chat commands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod chat;
pub mod dataset;
pub mod serve;

pub use chat::run_chat;
pub use dataset::{run_dataset, run_prompt};
pub use serve::run_serve;

use crate::config::Overrides;

#[derive(Parser)]
#[command(name = "rinna-chat")]
#[command(about = "Chat API for rinna japanese-gpt-neox-3.6b with a LoRA adapter")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Settings shared by every command; each one wins over the config file
#[derive(Args, Debug, Default)]
pub struct ModelArgs {
    /// Bind host for the HTTP API
    #[arg(long, global = true, env = "RINNA_HOST")]
    pub host: Option<String>,

    /// Bind port for the HTTP API
    #[arg(long, global = true, env = "RINNA_PORT")]
    pub port: Option<u16>,

    /// Base URL of the text-generation-inference server
    #[arg(long, global = true, env = "RINNA_GENERATOR_URL")]
    pub generator_url: Option<String>,

    /// Base model name
    #[arg(long, global = true, env = "RINNA_MODEL_NAME")]
    pub model_name: Option<String>,

    /// LoRA adapter directory
    #[arg(long, global = true, env = "RINNA_ADAPTER_PATH")]
    pub adapter_path: Option<PathBuf>,

    /// End-of-sequence token id
    #[arg(long, global = true, env = "RINNA_EOS_TOKEN_ID")]
    pub eos_token_id: Option<u32>,
}

impl ModelArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            generator_url: self.generator_url.clone(),
            model_name: self.model_name.clone(),
            adapter_path: self.adapter_path.clone(),
            eos_token_id: self.eos_token_id,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP chat API (default)
    Serve,

    /// Interactive chat in the terminal
    Chat,

    /// Print the prompt that would be sent for an instruction
    Prompt {
        /// Instruction text
        #[arg(index = 1)]
        instruction: String,

        /// Optional auxiliary input
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Render training examples to {"text": ...} JSONL
    Dataset {
        /// JSON array or JSONL file of {instruction, input, output}
        #[arg(index = 1)]
        input: PathBuf,

        /// Output JSONL path
        #[arg(index = 2)]
        output: PathBuf,
    },
}
