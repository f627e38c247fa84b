// src/core/prompts.rs — Instruction templates for the generator and validator

use minijinja::{context, Environment, UndefinedBehavior};

use crate::infra::errors::BenchError;

const GENERATION: &str = include_str!("templates/generation.md");
const VALIDATION: &str = include_str!("templates/validation.md");

/// Compiled prompt templates. Cheap to share behind a reference.
pub struct PromptTemplates {
    env: Environment<'static>,
}

impl PromptTemplates {
    pub fn new() -> Result<Self, BenchError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template("generation", GENERATION)?;
        env.add_template("validation", VALIDATION)?;
        Ok(Self { env })
    }

    pub fn generation(&self, requirement: &str, function: Option<&str>) -> Result<String, BenchError> {
        let tmpl = self.env.get_template("generation")?;
        Ok(tmpl.render(context! { requirement => requirement, function => function })?)
    }

    pub fn validation(&self, requirement: &str, code: &str) -> Result<String, BenchError> {
        let tmpl = self.env.get_template("validation")?;
        Ok(tmpl.render(context! { requirement => requirement, code => code })?)
    }
}
