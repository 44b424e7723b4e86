//! Capability descriptors (DDLs) for data plugins.
//!
//! A [`DataDdl`] describes what a data plugin accepts as query input and
//! which output values it produces. Compound filters are validated
//! against these descriptors before dispatch, so a filter referencing an
//! output the plugin never produces is rejected at construction time
//! rather than on every agent.

use crate::error::{FleetwireError, FleetwireResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Input specification for a data plugin's query argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdlInput {
    /// Human-readable description of the argument.
    pub description: String,
    /// Whether the query argument may be omitted.
    pub optional: bool,
    /// Maximum accepted argument length; 0 means unlimited.
    pub max_length: usize,
}

impl Default for DdlInput {
    fn default() -> Self {
        Self {
            description: String::new(),
            optional: true,
            max_length: 0,
        }
    }
}

/// Capability descriptor for a single data plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDdl {
    /// Plugin name, e.g. "sysctl".
    pub plugin: String,
    /// What the plugin does.
    #[serde(default)]
    pub description: String,
    /// Specification for the query argument.
    #[serde(default)]
    pub query: DdlInput,
    /// Names of the output values the plugin produces.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl DataDdl {
    /// Validate a supplied query parameter against this descriptor.
    pub fn validate_input(&self, params: Option<&str>) -> FleetwireResult<()> {
        match params {
            None => {
                if self.query.optional {
                    Ok(())
                } else {
                    Err(FleetwireError::DdlValidation(format!(
                        "Data plugin '{}' requires a query argument",
                        self.plugin
                    )))
                }
            }
            Some(value) => {
                if self.query.max_length > 0 && value.len() > self.query.max_length {
                    return Err(FleetwireError::DdlValidation(format!(
                        "Data plugin '{}' query argument exceeds {} characters",
                        self.plugin, self.query.max_length
                    )));
                }
                Ok(())
            }
        }
    }

    /// Returns true when the descriptor declares the named output.
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.iter().any(|o| o == name)
    }
}

/// Lookup seam for capability descriptors, consumed by filter validation.
pub trait DdlRegistry: Send + Sync {
    /// Resolve the descriptor for the named data plugin.
    fn data_ddl(&self, plugin: &str) -> FleetwireResult<DataDdl>;
}

/// In-memory descriptor registry, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticDdlRegistry {
    ddls: HashMap<String, DataDdl>,
}

impl StaticDdlRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its plugin name.
    pub fn register(&mut self, ddl: DataDdl) {
        self.ddls.insert(ddl.plugin.clone(), ddl);
    }

    /// Number of registered descriptors.
    pub fn len(&self) -> usize {
        self.ddls.len()
    }

    /// Returns true when no descriptors are registered.
    pub fn is_empty(&self) -> bool {
        self.ddls.is_empty()
    }
}

impl DdlRegistry for StaticDdlRegistry {
    fn data_ddl(&self, plugin: &str) -> FleetwireResult<DataDdl> {
        self.ddls.get(plugin).cloned().ok_or_else(|| {
            FleetwireError::DdlValidation(format!("Unknown data plugin '{plugin}'"))
        })
    }
}
