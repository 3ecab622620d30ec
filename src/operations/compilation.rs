//! Compilation input: the symbol table plus every analysable body.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Operation;
use crate::core::{read_json_file, AnalysisError};
use crate::symbols::{SymbolId, SymbolTable};

/// Body of a method, constructor, accessor or top-level local function owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBody {
    pub owner: SymbolId,
    #[serde(default)]
    pub file: String,
    pub body: Operation,
}

impl MethodBody {
    pub fn new(owner: SymbolId, file: impl Into<String>, body: Operation) -> Self {
        Self { owner, file: file.into(), body }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Compilation {
    pub name: String,
    /// e.g. `net8.0`; used by the minimum-target gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_framework: Option<String>,
    #[serde(default)]
    pub symbols: SymbolTable,
    #[serde(default)]
    pub bodies: Vec<MethodBody>,
}

impl Compilation {
    pub fn new(name: impl Into<String>, symbols: SymbolTable) -> Self {
        Self {
            name: name.into(),
            target_framework: None,
            symbols,
            bodies: Vec::new(),
        }
    }

    pub fn with_target_framework(mut self, tfm: impl Into<String>) -> Self {
        self.target_framework = Some(tfm.into());
        self
    }

    pub fn add_body(&mut self, body: MethodBody) {
        self.bodies.push(body);
    }

    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let content = read_json_file(path)?;
        Self::from_json(&content)
    }
}
