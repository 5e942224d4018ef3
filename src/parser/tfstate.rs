//! Terraform state parser implementation.
//!
//! Reads both the legacy module layout and the modern `resources[]` layout
//! with `serde_json`, producing [`Resource`]s keyed by address.

use crate::error::{Result, ResultExt, TfInventoryError};
use crate::parser::flatmap::flatten;
use crate::parser::MAX_STATE_VERSION;
use crate::types::{ExpandedAttributes, FlatAttributes, Resource};

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Resources loaded from a state document.
#[derive(Debug, Default)]
pub struct ParsedState {
    /// State format version
    pub version: u64,

    /// Terraform version that wrote the state, if recorded
    pub terraform_version: Option<String>,

    /// Resources keyed by address, in lexical order
    pub resources: BTreeMap<String, Resource>,

    /// Resources dropped while loading (malformed attribute keys)
    pub warnings: Vec<TfInventoryError>,
}

impl ParsedState {
    fn add(&mut self, result: Result<Resource>) {
        match result {
            Ok(resource) => {
                if self.resources.contains_key(&resource.name) {
                    tracing::warn!(resource = %resource.name, "Duplicate resource address in state, keeping the last one");
                }
                tracing::trace!(resource = %resource.name, attributes = resource.attributes.len(), "Loaded resource");
                self.resources.insert(resource.name.clone(), resource);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping resource");
                self.warnings.push(e);
            }
        }
    }
}

/// Parser for Terraform state documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct StateParser;

impl StateParser {
    /// Create a new state parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedState> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Reading Terraform state");
        let content = std::fs::read_to_string(path).with_path(path)?;
        self.parse_str(&content)
    }

    /// Parse a state document already in memory.
    ///
    /// # Errors
    ///
    /// Returns `StateParse` for invalid JSON or an unrecognised layout, and
    /// `UnsupportedStateVersion` for versions newer than
    /// [`MAX_STATE_VERSION`].
    pub fn parse_str(&self, content: &str) -> Result<ParsedState> {
        let document: Value = serde_json::from_str(content)?;

        let version = match document.get("version") {
            Some(v) => v.as_u64().ok_or_else(|| {
                crate::err!(StateParse {
                    message: format!("'version' must be a non-negative integer, got {v}"),
                })
            })?,
            None if document.get("modules").is_some() => 3,
            None if document.get("resources").is_some() => MAX_STATE_VERSION,
            None => {
                return Err(crate::err!(StateParse {
                    message: "document has neither 'modules' nor 'resources'".to_string(),
                }));
            }
        };

        tracing::debug!(version, "Detected state format version");

        let parsed = match version {
            1..=3 => parse_legacy(serde_json::from_value(document)?, version),
            4 => parse_modern(serde_json::from_value(document)?, version),
            _ => return Err(crate::err!(UnsupportedStateVersion { version })),
        };

        tracing::info!(
            resources = parsed.resources.len(),
            skipped = parsed.warnings.len(),
            "Terraform state loaded"
        );

        Ok(parsed)
    }
}

// =========================================================================
// Legacy layout (versions 1-3)
// =========================================================================

#[derive(Debug, Deserialize)]
struct LegacyState {
    terraform_version: Option<String>,
    #[serde(default)]
    modules: Vec<LegacyModule>,
}

#[derive(Debug, Deserialize)]
struct LegacyModule {
    #[serde(default)]
    path: Vec<String>,
    #[serde(default)]
    resources: BTreeMap<String, LegacyResource>,
}

#[derive(Debug, Deserialize)]
struct LegacyResource {
    #[serde(rename = "type")]
    resource_type: String,
    provider: Option<String>,
    #[serde(default)]
    depends_on: Vec<String>,
    primary: Option<LegacyInstance>,
}

#[derive(Debug, Deserialize)]
struct LegacyInstance {
    id: Option<String>,
    #[serde(default)]
    attributes: ExpandedAttributes,
}

fn parse_legacy(state: LegacyState, version: u64) -> ParsedState {
    let mut parsed = ParsedState {
        version,
        terraform_version: state.terraform_version,
        ..ParsedState::default()
    };

    for module in state.modules {
        let module_path = legacy_module_address(&module.path);
        tracing::debug!(module = %module_path, resources = module.resources.len(), "Processing module");

        for (key, resource) in module.resources {
            let name = if module_path.is_empty() {
                key
            } else {
                format!("{module_path}.{key}")
            };

            let Some(primary) = resource.primary else {
                tracing::debug!(resource = %name, "Resource has no primary instance, skipping");
                continue;
            };

            // Legacy attributes are strings already; flatten only stringifies
            // the odd non-string value.
            let attributes = flatten(&primary.attributes);

            let result = Resource::new(name, resource.resource_type, attributes).map(|r| {
                r.with_provider(resource.provider)
                    .with_id(primary.id)
                    .with_module_path(module_path.clone())
                    .with_depends_on(resource.depends_on)
            });
            parsed.add(result);
        }
    }

    parsed
}

/// `["root", "app", "db"]` -> `module.app.module.db`; root -> empty.
fn legacy_module_address(path: &[String]) -> String {
    path.iter()
        .skip_while(|segment| segment.as_str() == "root")
        .map(|segment| format!("module.{segment}"))
        .collect::<Vec<_>>()
        .join(".")
}

// =========================================================================
// Modern layout (version 4)
// =========================================================================

#[derive(Debug, Deserialize)]
struct ModernState {
    terraform_version: Option<String>,
    #[serde(default)]
    resources: Vec<ModernResource>,
}

#[derive(Debug, Deserialize)]
struct ModernResource {
    module: Option<String>,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    provider: Option<String>,
    #[serde(default)]
    instances: Vec<ModernInstance>,
}

#[derive(Debug, Deserialize)]
struct ModernInstance {
    index_key: Option<Value>,
    attributes: Option<ExpandedAttributes>,
    attributes_flat: Option<FlatAttributes>,
    #[serde(default)]
    dependencies: Vec<String>,
}

fn default_mode() -> String {
    "managed".to_string()
}

fn parse_modern(state: ModernState, version: u64) -> ParsedState {
    let mut parsed = ParsedState {
        version,
        terraform_version: state.terraform_version,
        ..ParsedState::default()
    };

    for resource in state.resources {
        let module_path = resource.module.unwrap_or_default();
        let base = modern_address(&module_path, &resource.mode, &resource.resource_type, &resource.name);

        for instance in resource.instances {
            let name = match &instance.index_key {
                None | Some(Value::Null) => base.clone(),
                Some(Value::String(key)) => format!("{base}[\"{key}\"]"),
                Some(other) => format!("{base}[{other}]"),
            };

            let result = match (instance.attributes_flat, instance.attributes) {
                (Some(flat), _) => Resource::new(name, resource.resource_type.clone(), flat),
                (None, Some(nested)) => Ok(Resource::from_nested(name, resource.resource_type.clone(), &nested)),
                (None, None) => Resource::new(name, resource.resource_type.clone(), FlatAttributes::new()),
            };

            let result = result.map(|r| {
                let id = r.attributes.get("id").cloned();
                r.with_provider(resource.provider.clone())
                    .with_id(id)
                    .with_module_path(module_path.clone())
                    .with_depends_on(instance.dependencies)
            });
            parsed.add(result);
        }
    }

    parsed
}

fn modern_address(module_path: &str, mode: &str, resource_type: &str, name: &str) -> String {
    let mut address = String::new();
    if !module_path.is_empty() {
        address.push_str(module_path);
        address.push('.');
    }
    if mode == "data" {
        address.push_str("data.");
    }
    address.push_str(resource_type);
    address.push('.');
    address.push_str(name);
    address
}
