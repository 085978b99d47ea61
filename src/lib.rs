// src/lib.rs

pub mod api;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod llm;
pub mod prompt;
pub mod services;
