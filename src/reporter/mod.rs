//! Inventory output module.
//!
//! This module serializes an [`InventoryDocument`] in the shape Ansible
//! expects from a dynamic-inventory script:
//!
//! - `--list`: one entry per group (`{"hosts": [...]}`) plus
//!   `_meta.hostvars` holding the variables of every host
//! - `--host <name>`: the variables of that host, `{}` if it is unknown
//!
//! Two encodings are supported:
//! - JSON: what Ansible reads
//! - YAML: the same document, easier to read by eye
//!
//! # Example
//!
//! ```rust
//! use tfinventory::reporter::Reporter;
//! use tfinventory::types::{InventoryDocument, OutputMode};
//! use tfinventory::Config;
//!
//! let mut document = InventoryDocument::default();
//! document.add_to_group("all", "web");
//!
//! let reporter = Reporter::new(&Config::default());
//! let list = reporter.generate(&document, &OutputMode::List)?;
//! assert_eq!(list, r#"{"all":{"hosts":["web"]},"_meta":{"hostvars":{}}}"#);
//!
//! let host = reporter.generate(&document, &OutputMode::Host("db".to_string()))?;
//! assert_eq!(host, "{}");
//! # Ok::<(), tfinventory::TfInventoryError>(())
//! ```

mod json;
mod yaml;

use crate::config::Config;
use crate::error::Result;
use crate::types::{HostVars, InventoryDocument, OutputMode, ReportFormat};

use serde::Serialize;
use std::collections::BTreeMap;

pub use json::JsonReporter;
pub use yaml::YamlReporter;

/// Inventory writer that supports multiple output formats.
pub struct Reporter {
    config: Config,
}

impl Reporter {
    /// Create a new reporter with the given configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Serialize the document for `mode` in the configured format.
    ///
    /// # Errors
    ///
    /// Returns `ReportGeneration` if serialization fails.
    pub fn generate(&self, document: &InventoryDocument, mode: &OutputMode) -> Result<String> {
        self.generate_as(document, mode, self.config.output.format)
    }

    /// Serialize the document for `mode` in an explicit format.
    ///
    /// # Errors
    ///
    /// Returns `ReportGeneration` if serialization fails.
    pub fn generate_as(
        &self,
        document: &InventoryDocument,
        mode: &OutputMode,
        format: ReportFormat,
    ) -> Result<String> {
        tracing::debug!(format = %format, mode = ?mode, "Generating inventory output");
        match format {
            ReportFormat::Json => JsonReporter::new(&self.config).generate(document, mode),
            ReportFormat::Yaml => YamlReporter::new(&self.config).generate(document, mode),
        }
    }
}

/// Trait for inventory writers.
pub trait ReportGenerator {
    /// Serialize an inventory document for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn generate(&self, document: &InventoryDocument, mode: &OutputMode) -> Result<String>;
}

/// The `--list` document.
#[derive(Debug, Serialize)]
pub struct InventoryReport<'a> {
    /// One entry per group, keyed by group name
    #[serde(flatten)]
    pub groups: BTreeMap<&'a str, GroupReport<'a>>,

    /// Host variables of every host
    #[serde(rename = "_meta")]
    pub meta: MetaReport<'a>,
}

/// Members of one group.
#[derive(Debug, Serialize)]
pub struct GroupReport<'a> {
    /// Inventory host names, sorted
    pub hosts: Vec<&'a str>,
}

/// The `_meta` entry.
#[derive(Debug, Serialize)]
pub struct MetaReport<'a> {
    /// Variables keyed by inventory host name
    pub hostvars: &'a BTreeMap<String, HostVars>,
}

impl<'a> From<&'a InventoryDocument> for InventoryReport<'a> {
    fn from(document: &'a InventoryDocument) -> Self {
        Self {
            groups: document
                .groups
                .iter()
                .map(|(name, group)| {
                    let hosts = group.members.iter().map(String::as_str).collect();
                    (name.as_str(), GroupReport { hosts })
                })
                .collect(),
            meta: MetaReport {
                hostvars: &document.hostvars,
            },
        }
    }
}

/// Value printed for a request: the full report or one host's variables.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ModeReport<'a> {
    /// `--list`
    List(InventoryReport<'a>),
    /// `--host`
    Host(HostVars),
}

impl<'a> ModeReport<'a> {
    /// Select what to print for `mode`.
    #[must_use]
    pub fn new(document: &'a InventoryDocument, mode: &OutputMode) -> Self {
        match mode {
            OutputMode::List => Self::List(InventoryReport::from(document)),
            OutputMode::Host(host) => {
                let vars = document.host(host).cloned();
                if vars.is_none() {
                    tracing::debug!(host = %host, "Host not in inventory, printing empty variables");
                }
                Self::Host(vars.unwrap_or_default())
            }
        }
    }
}
