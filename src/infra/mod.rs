// src/infra/mod.rs — Infrastructure layer

pub mod config;
pub mod errors;
pub mod logger;
pub mod paths;
