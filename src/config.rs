//! Configuration module for tfinventory.
//!
//! Settings are resolved from, in order of precedence:
//! - CLI flags
//! - Environment variables (`TF_STATE`, `TF_ANSIBLE_*_TEMPLATE`)
//! - A YAML configuration file (`tfinventory.yaml`)
//! - Built-in defaults
//!
//! # Configuration File Format
//!
//! ```yaml
//! # tfinventory.yaml
//! state: ${TF_DIR}/terraform.tfstate
//!
//! templates:
//!   name: "{{ tags.Name | default(value=name) }}"
//!   groups: |
//!     all
//!     {{ type }}
//!   filter: "{% if type == 'aws_instance' %}True{% else %}False{% endif %}"
//!   host_vars: |
//!     ansible_host={{ private_ip }}
//!
//! output:
//!   pretty: true
//!   format: json
//! ```

use crate::cli::Cli;
use crate::error::{Result, ResultExt, TfInventoryError};
use crate::parser::DEFAULT_STATE_FILE;
use crate::types::{ReportFormat, TemplateRole};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default inventory name: the resource address.
pub const DEFAULT_NAME_TEMPLATE: &str = "{{ name }}";

/// Default groups: every host in `all`.
pub const DEFAULT_GROUPS_TEMPLATE: &str = "all";

/// Default filter: compute instances of the well-known providers.
pub const DEFAULT_FILTER_TEMPLATE: &str = r#"{% if type in ["aws_instance", "azure_instance", "clc_server", "digitalocean_droplet", "google_compute_instance", "openstack_compute_instance_v2", "softlayer_virtualserver", "triton_machine", "ucs_service_profile", "vsphere_virtual_machine"] %}True{% else %}False{% endif %}"#;

/// Default host variables: `ansible_host` from the first address attribute
/// present, then every flat attribute as `tf_<key>`.
pub const DEFAULT_HOST_VARS_TEMPLATE: &str = r#"{% if attributes.access_ip_v6 %}ansible_host={{ attributes.access_ip_v6 }}
{% elif attributes.access_ip_v4 %}ansible_host={{ attributes.access_ip_v4 }}
{% elif attributes["network.0.floating_ip"] %}ansible_host={{ attributes["network.0.floating_ip"] }}
{% elif attributes["network.0.fixed_ip_v6"] %}ansible_host={{ attributes["network.0.fixed_ip_v6"] }}
{% elif attributes["network.0.fixed_ip_v4"] %}ansible_host={{ attributes["network.0.fixed_ip_v4"] }}
{% elif attributes.ipv4_address %}ansible_host={{ attributes.ipv4_address }}
{% elif attributes.public_ip %}ansible_host={{ attributes.public_ip }}
{% elif attributes.private_ip %}ansible_host={{ attributes.private_ip }}
{% endif %}
{% for key, value in attributes %}tf_{{ key }}={{ value | oneline }}
{% endfor %}"#;

/// Default configuration file names searched in the working directory.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["tfinventory.yaml", "tfinventory.yml", ".tfinventory.yaml"];

/// The four mapping templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSet {
    /// Inventory host name template
    pub name: String,

    /// Group membership template, one group per line
    pub groups: String,

    /// Inclusion filter template, must render `True` or `False`
    pub filter: String,

    /// Host variables template, one `key=value` per line
    pub host_vars: String,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_TEMPLATE.to_string(),
            groups: DEFAULT_GROUPS_TEMPLATE.to_string(),
            filter: DEFAULT_FILTER_TEMPLATE.to_string(),
            host_vars: DEFAULT_HOST_VARS_TEMPLATE.to_string(),
        }
    }
}

impl TemplateSet {
    /// Source of the template for `role`.
    #[must_use]
    pub fn get(&self, role: TemplateRole) -> &str {
        match role {
            TemplateRole::Name => &self.name,
            TemplateRole::Groups => &self.groups,
            TemplateRole::Filter => &self.filter,
            TemplateRole::HostVars => &self.host_vars,
        }
    }

    /// Replace the template for `role`.
    pub fn set(&mut self, role: TemplateRole, source: impl Into<String>) {
        let source = source.into();
        match role {
            TemplateRole::Name => self.name = source,
            TemplateRole::Groups => self.groups = source,
            TemplateRole::Filter => self.filter = source,
            TemplateRole::HostVars => self.host_vars = source,
        }
    }
}

/// Output options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputOptions {
    /// Pretty-print the output.
    pub pretty: bool,

    /// Output format.
    pub format: ReportFormat,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the Terraform state file
    pub state: PathBuf,

    /// Mapping templates
    pub templates: TemplateSet,

    /// Output options
    pub output: OutputOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state: PathBuf::from(DEFAULT_STATE_FILE),
            templates: TemplateSet::default(),
            output: OutputOptions::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML string.
    ///
    /// `${VAR}` and `$VAR` references are expanded from the environment
    /// before parsing.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn from_yaml(content: &str) -> Result<Self> {
        tracing::debug!("Parsing configuration from YAML");
        let expanded = expand_env_vars(content)?;

        let config: Self = serde_yaml::from_str(&expanded)
            .to_config_parse_error("invalid YAML configuration".to_string())?;

        tracing::debug!(state = %config.state.display(), "Configuration loaded successfully");
        Ok(config)
    }

    /// Generate an example YAML configuration.
    #[must_use]
    pub fn example_yaml() -> String {
        r#"# tfinventory Configuration File

# Terraform state file (environment variables are expanded)
state: terraform.tfstate

templates:
  # Inventory host name
  name: "{{ name }}"

  # One group per line
  groups: |
    all
    {{ type }}

  # Must render True or False
  filter: "{% if type == 'aws_instance' %}True{% else %}False{% endif %}"

  # One key=value per line; list and dict literals are kept structured
  host_vars: |
    ansible_host={{ attributes.private_ip | default(value="") }}
    tf_id={{ id }}

output:
  # Pretty-print JSON output
  pretty: false

  # json or yaml
  format: json
"#
        .to_string()
    }

    /// Merge CLI arguments (and the environment variables clap resolved for
    /// them) into the configuration.
    pub fn merge_cli_args(&mut self, cli: &Cli) {
        if let Some(ref state) = cli.state {
            tracing::debug!(state = %state.display(), "State path overridden");
            self.state = state.clone();
        }

        let overrides = [
            (TemplateRole::Name, &cli.ansible_inventory_name_template),
            (TemplateRole::Groups, &cli.ansible_groups_template),
            (TemplateRole::Filter, &cli.ansible_resource_filter_template),
            (TemplateRole::HostVars, &cli.ansible_host_vars_template),
        ];
        for (role, source) in overrides {
            if let Some(source) = source {
                tracing::debug!(role = %role, "Template overridden");
                self.templates.set(role, source.clone());
            }
        }

        if cli.pretty {
            self.output.pretty = true;
        }
        if let Some(format) = cli.format {
            self.output.format = format;
        }
    }

    /// Check that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` for an empty state path and `ConfigValue` for
    /// a blank name or filter template.
    pub fn validate(&self) -> Result<()> {
        if self.state.as_os_str().is_empty() {
            return Err(crate::err!(ConfigMissing {
                key: "state".to_string(),
            }));
        }

        for role in [TemplateRole::Name, TemplateRole::Filter] {
            if self.templates.get(role).trim().is_empty() {
                return Err(crate::err!(ConfigValue {
                    key: format!("templates.{role}"),
                    message: "template must not be blank".to_string(),
                }));
            }
        }

        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. Unknown variables are left as-is.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = content.to_string();

    for pattern in [r"\$\{([^}]+)\}", r"\$([A-Za-z_][A-Za-z0-9_]*)"] {
        let re = Regex::new(pattern).map_err(|e| {
            TfInventoryError::config_parse(format!("invalid expansion pattern: {e}"), None, file!(), line!())
        })?;
        for cap in re.captures_iter(content) {
            if let Ok(value) = std::env::var(&cap[1]) {
                result = result.replace(&cap[0], &value);
            }
        }
    }

    Ok(result)
}
