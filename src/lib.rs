// src/lib.rs — Library root for codegen-bench

pub mod cli;
pub mod core;
pub mod evaluator;
pub mod infra;
pub mod provider;
