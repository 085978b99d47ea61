// src/cli/chat.rs
// Interactive terminal chat against the generation server

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;

use super::serve::build_service;
use crate::config::Settings;
use crate::llm::GenerationParams;
use crate::services::{LoadPolicy, load_model};

/// Inputs that end the session
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".rinna-chat")
        .join("chat_history")
}

pub fn is_quit(line: &str) -> bool {
    QUIT_WORDS.contains(&line.trim().to_lowercase().as_str())
}

pub async fn run_chat(settings: Settings) -> Result<()> {
    let (service, client) = build_service(&settings)?;

    println!("Loading {} (adapter: {})...", service.model_name(), service.adapter_name());
    load_model(&service, client, LoadPolicy::from_settings(&settings)).await?;

    let mut editor = DefaultEditor::new()?;
    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
    }

    println!("Type a question (quit, exit, q or Ctrl+D to leave)");
    println!();

    let params = GenerationParams::default();
    loop {
        let line = match editor.readline("質問: ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_quit(trimmed) {
            break;
        }
        editor.add_history_entry(trimmed)?;

        match service.respond(trimmed, None, &params).await {
            Ok(reply) => println!("回答: {}\n", reply.text),
            Err(e) => eprintln!("エラー: {}\n", e),
        }
    }

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = editor.save_history(&history_path);
    println!("Goodbye!");
    Ok(())
}
