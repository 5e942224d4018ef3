//! # tfinventory
//!
//! Template-driven Ansible dynamic inventory generated from Terraform state.
//!
//! tfinventory reads a Terraform state document, exposes every resource to
//! four user-supplied Tera templates, and assembles the results into the
//! JSON document Ansible expects from a dynamic-inventory script.
//!
//! ## Features
//!
//! - **State formats**: legacy module layout (versions 1-3) and the modern
//!   `resources[]` layout (version 4)
//! - **Flatmap expansion**: `network.0.fixed_ip_v4` style keys are available
//!   both flat and as nested lists and maps
//! - **Templates**: a filter, a name, groups and host variables, each a Tera
//!   template rendered per resource
//! - **Structured host variables**: list and dict literals in host-var
//!   values are kept structured in the output
//! - **Output formats**: JSON for Ansible, YAML for humans
//!
//! ## Example
//!
//! ```rust
//! use tfinventory::{Config, InventoryBuilder};
//! use tfinventory::types::OutputMode;
//!
//! let state = r#"{
//!   "version": 3,
//!   "modules": [{
//!     "path": ["root"],
//!     "resources": {
//!       "aws_instance.web": {
//!         "type": "aws_instance",
//!         "primary": {"id": "i-1", "attributes": {"id": "i-1", "private_ip": "10.0.0.4"}}
//!       }
//!     }
//!   }]
//! }"#;
//!
//! let builder = InventoryBuilder::new(Config::default());
//! let inventory = builder.build_from_str(state)?;
//! let output = builder.render(&inventory, &OutputMode::Host("aws_instance.web".to_string()))?;
//!
//! assert!(output.contains(r#""ansible_host":"10.0.0.4""#));
//! # Ok::<(), tfinventory::TfInventoryError>(())
//! ```

#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod inventory;
pub mod parser;
pub mod reporter;
pub mod template;
pub mod types;

// Re-export commonly used types at crate root
pub use config::Config;
pub use error::{Result, TfInventoryError};
pub use types::{InventoryDocument, OutputMode, ReportFormat, Resource, TemplateRole};

use inventory::InventoryAssembler;
use parser::{ParsedState, StateParser};
use reporter::Reporter;
use template::TeraRenderer;

/// Main orchestrator: load the state, run the templates, serialize.
///
/// The `InventoryBuilder` is the primary entry point for using tfinventory
/// as a library. Every call is independent; nothing is cached between runs.
pub struct InventoryBuilder {
    config: Config,
}

impl InventoryBuilder {
    /// Create a new builder with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this builder runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the inventory from the configured state file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The state file cannot be read or parsed
    /// - A template fails to compile or evaluate
    pub fn build(&self) -> Result<InventoryDocument> {
        tracing::info!(state = %self.config.state.display(), "Building inventory");
        let parsed = StateParser::new().parse_file(&self.config.state)?;
        self.build_from_state(parsed)
    }

    /// Build the inventory from a state document held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`InventoryBuilder::build`], minus the I/O.
    pub fn build_from_str(&self, content: &str) -> Result<InventoryDocument> {
        let parsed = StateParser::new().parse_str(content)?;
        self.build_from_state(parsed)
    }

    /// Build the inventory from an already parsed state.
    ///
    /// Resources dropped by the loader are reported in the returned
    /// document's warnings, ahead of the assembler's own.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to compile or evaluate.
    pub fn build_from_state(&self, parsed: ParsedState) -> Result<InventoryDocument> {
        let renderer = TeraRenderer::with_templates(&self.config.templates)?;
        let assembler = InventoryAssembler::new(renderer, self.config.templates.clone());

        let mut document = assembler.assemble(parsed.resources.values())?;

        if !parsed.warnings.is_empty() {
            let mut warnings = parsed.warnings;
            warnings.append(&mut document.warnings);
            document.warnings = warnings;
        }

        Ok(document)
    }

    /// Serialize the inventory for `mode` using the configured output options.
    ///
    /// # Errors
    ///
    /// Returns `ReportGeneration` if serialization fails.
    pub fn render(&self, document: &InventoryDocument, mode: &OutputMode) -> Result<String> {
        Reporter::new(&self.config).generate(document, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE: &str = r#"{
        "version": 4,
        "terraform_version": "1.5.7",
        "resources": [
            {
                "mode": "managed",
                "type": "aws_instance",
                "name": "web",
                "provider": "provider[\"registry.terraform.io/hashicorp/aws\"]",
                "instances": [
                    {"index_key": 0, "attributes": {"id": "i-0", "private_ip": "10.0.0.10"}},
                    {"index_key": 1, "attributes": {"id": "i-1", "private_ip": "10.0.0.11"}}
                ]
            },
            {
                "mode": "managed",
                "type": "aws_s3_bucket",
                "name": "logs",
                "instances": [{"attributes": {"id": "logs"}}]
            }
        ]
    }"#;

    #[test]
    fn test_build_from_str_with_defaults() {
        let builder = InventoryBuilder::new(Config::default());
        let inventory = builder.build_from_str(STATE).unwrap();

        let all: Vec<_> = inventory.groups["all"].members.iter().collect();
        assert_eq!(all, vec!["aws_instance.web[0]", "aws_instance.web[1]"]);
        assert_eq!(inventory.hostvars["aws_instance.web[1]"]["ansible_host"], "10.0.0.11");
        assert!(!inventory.has_warnings());
    }

    #[test]
    fn test_loader_warnings_come_first() {
        let state = r#"{
            "version": 3,
            "modules": [{
                "path": ["root"],
                "resources": {
                    "aws_instance.bad": {
                        "type": "aws_instance",
                        "primary": {"id": "i-1", "attributes": {"network.01.ip": "x"}}
                    },
                    "aws_instance.good": {
                        "type": "aws_instance",
                        "primary": {"id": "i-2", "attributes": {"id": "i-2"}}
                    }
                }
            }]
        }"#;

        let mut config = Config::default();
        config.templates.set(TemplateRole::HostVars, "broken line");
        let inventory = InventoryBuilder::new(config).build_from_str(state).unwrap();

        assert_eq!(inventory.warnings.len(), 2);
        assert!(matches!(
            inventory.warnings[0],
            TfInventoryError::MalformedAttributeKey { .. }
        ));
        assert!(matches!(
            inventory.warnings[1],
            TfInventoryError::InvalidHostVarLine { .. }
        ));
        assert!(inventory.hostvars.contains_key("aws_instance.good"));
    }

    #[test]
    fn test_template_compile_error_aborts() {
        let mut config = Config::default();
        config.templates.set(TemplateRole::Name, "{{ name");

        let err = InventoryBuilder::new(config).build_from_str(STATE).unwrap_err();
        assert!(matches!(err, TfInventoryError::Template { role: TemplateRole::Name, .. }));
    }

    #[test]
    fn test_missing_state_file() {
        let config = Config {
            state: "/nonexistent/terraform.tfstate".into(),
            ..Config::default()
        };
        let err = InventoryBuilder::new(config).build().unwrap_err();
        assert!(matches!(err, TfInventoryError::FileNotFound { .. }));
    }
}
