// src/core/mod.rs — Retry loop, adapters and benchmark bookkeeping

pub mod bank;
pub mod benchmark;
pub mod cost;
pub mod generator;
pub mod markdown;
pub mod orchestrator;
pub mod prompts;
pub mod types;
pub mod validator;
