// src/core/bank.rs — Prompt bank loading (JSON or TOML)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::core::types::PromptSpec;
use crate::infra::errors::BenchError;

/// An ordered set of benchmark prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptBank {
    #[serde(default)]
    pub prompts: Vec<PromptSpec>,
}

/// Accepted file shapes: `{"prompts": [...]}` or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum BankFile {
    Wrapped(PromptBank),
    List(Vec<PromptSpec>),
}

impl From<BankFile> for PromptBank {
    fn from(file: BankFile) -> Self {
        match file {
            BankFile::Wrapped(bank) => bank,
            BankFile::List(prompts) => PromptBank { prompts },
        }
    }
}

impl PromptBank {
    /// Load a bank, picking the format from the extension. Anything other
    /// than `.toml` is read as JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let bank = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };
        tracing::debug!(path = %path.display(), prompts = bank.len(), "loaded prompt bank");
        Ok(bank)
    }

    pub fn from_json_str(content: &str) -> Result<Self, BenchError> {
        let file: BankFile = serde_json::from_str(content)
            .map_err(|e| BenchError::Config(format!("invalid prompt bank JSON: {e}")))?;
        PromptBank::from(file).normalized()
    }

    /// TOML has no null, so expected values of `None` need the JSON form.
    pub fn from_toml_str(content: &str) -> Result<Self, BenchError> {
        let bank: PromptBank = toml::from_str(content)
            .map_err(|e| BenchError::Config(format!("invalid prompt bank TOML: {e}")))?;
        bank.normalized()
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Assign positional ids where missing and reject malformed entries.
    fn normalized(mut self) -> Result<Self, BenchError> {
        let mut seen = HashSet::new();
        for (i, spec) in self.prompts.iter_mut().enumerate() {
            if spec.id.trim().is_empty() {
                spec.id = (i + 1).to_string();
            }
            if spec.prompt.trim().is_empty() {
                return Err(BenchError::Config(format!("prompt '{}' has empty text", spec.id)));
            }
            if spec.test_cases.iter().any(|c| c.function.trim().is_empty()) {
                return Err(BenchError::Config(format!(
                    "prompt '{}' has a test case without a function name",
                    spec.id
                )));
            }
            if !seen.insert(spec.id.clone()) {
                return Err(BenchError::Config(format!("duplicate prompt id '{}'", spec.id)));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::io::Write;

    #[test]
    fn test_json_wrapped() {
        let bank = PromptBank::from_json_str(
            r#"{"prompts": [
                {"id": "double", "prompt": "Write f(x) returning 2x", "function": "f",
                 "test_cases": [{"function": "f", "input": 5, "expected": 10}]},
                {"prompt": "Write is_even(n)",
                 "test_cases": [{"function": "is_even", "input": 3, "expected": false}]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.prompts[0].id, "double");
        assert_eq!(bank.prompts[1].id, "2");
        assert_eq!(bank.prompts[1].test_cases[0].expected, json!(false));
    }

    #[test]
    fn test_json_bare_list() {
        let bank = PromptBank::from_json_str(r#"[{"prompt": "Say hi"}]"#).unwrap();
        assert_eq!(bank.prompts[0].id, "1");
        assert!(bank.prompts[0].test_cases.is_empty());
    }

    #[test]
    fn test_json_null_expected() {
        let bank = PromptBank::from_json_str(
            r#"[{"prompt": "Find x", "test_cases": [{"function": "find", "input": [[], 1], "expected": null}]}]"#,
        )
        .unwrap();
        assert_eq!(bank.prompts[0].test_cases[0].expected, Value::Null);
        assert_eq!(bank.prompts[0].test_cases[0].input, json!([[], 1]));
    }

    #[test]
    fn test_toml_bank() {
        let bank = PromptBank::from_toml_str(
            r#"
[[prompts]]
id = "add"
prompt = "Write add(a, b)"
function = "add"

[[prompts.test_cases]]
function = "add"
input = [2, 3]
expected = 5
"#,
        )
        .unwrap();
        assert_eq!(bank.prompts[0].function.as_deref(), Some("add"));
        assert_eq!(bank.prompts[0].test_cases[0].input, json!([2, 3]));
        assert_eq!(bank.prompts[0].test_cases[0].expected, json!(5));
    }

    #[test]
    fn test_rejects_duplicates_and_blanks() {
        let dup = r#"[{"id": "a", "prompt": "x"}, {"id": "a", "prompt": "y"}]"#;
        assert!(PromptBank::from_json_str(dup)
            .unwrap_err()
            .to_string()
            .contains("duplicate"));

        let blank = r#"[{"prompt": "   "}]"#;
        assert!(PromptBank::from_json_str(blank).is_err());

        let nameless = r#"[{"prompt": "x", "test_cases": [{"function": "", "input": 1, "expected": 1}]}]"#;
        assert!(PromptBank::from_json_str(nameless).is_err());
    }

    #[test]
    fn test_load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("bank.json");
        std::fs::write(&json_path, r#"{"prompts": [{"prompt": "a"}]}"#).unwrap();
        assert_eq!(PromptBank::load(&json_path).unwrap().len(), 1);

        let toml_path = dir.path().join("bank.toml");
        let mut f = std::fs::File::create(&toml_path).unwrap();
        writeln!(f, "[[prompts]]\nprompt = \"a\"\n\n[[prompts]]\nprompt = \"b\"").unwrap();
        assert_eq!(PromptBank::load(&toml_path).unwrap().len(), 2);
    }

    #[test]
    fn test_sample_bank_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("prompts/bank.json");
        let bank = PromptBank::load(&path).unwrap();
        assert_eq!(bank.prompts.len(), 50);
        assert_eq!(bank.prompts[0].id, "is-even");
        assert_eq!(bank.prompts[49].id, "ci-pipeline");
        assert!(bank.prompts.iter().any(|p| p.test_cases.is_empty()));
        for spec in bank.prompts.iter().filter(|p| !p.test_cases.is_empty()) {
            assert_eq!(spec.required_function(), Some(spec.test_cases[0].function.as_str()));
        }
    }
}
