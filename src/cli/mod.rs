//! Command-line interface module.
//!
//! This module defines the CLI structure using Clap. The surface follows the
//! Ansible dynamic-inventory contract: the script is called with either
//! `--list` or `--host <HOST>` and must print JSON on stdout.
//!
//! Every setting can also come from the environment (`TF_STATE`,
//! `TF_ANSIBLE_INVENTORY_NAME_TEMPLATE`, ...); a flag always wins over its
//! environment variable.
//!
//! # Example Usage
//!
//! ```bash
//! # Full inventory
//! tfinventory --list --state ./terraform.tfstate
//!
//! # Variables of one host
//! tfinventory --host aws_instance.web
//!
//! # Group hosts by resource type
//! TF_ANSIBLE_GROUPS_TEMPLATE=$'all\n{{ type }}' tfinventory --list --pretty
//!
//! # Use as an Ansible inventory
//! ansible-inventory -i ./tfinventory --graph
//! ```

use crate::types::{OutputMode, ReportFormat};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// tfinventory - Ansible dynamic inventory generated from Terraform state.
#[derive(Parser, Debug)]
#[command(
    name = "tfinventory",
    author,
    version,
    about = "Ansible dynamic inventory generated from Terraform state",
    long_about = "tfinventory reads a Terraform state file and renders an Ansible dynamic \
                  inventory from it. Which resources become hosts, their names, groups and \
                  host variables are all decided by user-supplied Tera templates.",
    group(ArgGroup::new("mode").required(true).args(["list", "host"]))
)]
pub struct Cli {
    /// List the full inventory
    #[arg(long)]
    pub list: bool,

    /// Print the variables of a single host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Location of the Terraform state file [default: terraform.tfstate]
    #[arg(long, env = "TF_STATE", value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Template producing the inventory name of a resource [default: {{ name }}]
    #[arg(long, env = "TF_ANSIBLE_INVENTORY_NAME_TEMPLATE", value_name = "TEMPLATE", hide_env_values = true)]
    pub ansible_inventory_name_template: Option<String>,

    /// Template producing the groups of a resource, one per line [default: all]
    #[arg(long, env = "TF_ANSIBLE_GROUPS_TEMPLATE", value_name = "TEMPLATE", hide_env_values = true)]
    pub ansible_groups_template: Option<String>,

    /// Template deciding whether a resource is a host; must render True or False
    #[arg(long, env = "TF_ANSIBLE_RESOURCE_FILTER_TEMPLATE", value_name = "TEMPLATE", hide_env_values = true)]
    pub ansible_resource_filter_template: Option<String>,

    /// Template producing host variables, one key=value per line
    #[arg(long, env = "TF_ANSIBLE_HOST_VARS_TEMPLATE", value_name = "TEMPLATE", hide_env_values = true)]
    pub ansible_host_vars_template: Option<String>,

    /// Path to configuration file
    #[arg(short, long, env = "TFINVENTORY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long)]
    pub pretty: bool,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all log output except errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print debugging information to stderr (same as -vv)
    #[arg(long, conflicts_with = "quiet")]
    pub debug: bool,
}

impl Cli {
    /// The request mode selected on the command line.
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        match &self.host {
            Some(host) => OutputMode::Host(host.clone()),
            None => OutputMode::List,
        }
    }

    /// Effective verbosity, with `--debug` counting as `-vv`.
    #[must_use]
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            self.verbose.max(2)
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parsing() {
        // Verify CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_mode() {
        let cli = Cli::parse_from(["tfinventory", "--list"]);
        assert!(cli.list);
        assert_eq!(cli.mode(), OutputMode::List);
    }

    #[test]
    fn test_host_mode() {
        let cli = Cli::parse_from(["tfinventory", "--host", "web-01"]);
        assert_eq!(cli.mode(), OutputMode::Host("web-01".to_string()));
    }

    #[test]
    fn test_modes_are_mutually_exclusive() {
        let result = Cli::try_parse_from(["tfinventory", "--list", "--host", "web-01"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_is_required() {
        let result = Cli::try_parse_from(["tfinventory", "--state", "x.tfstate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_raises_verbosity() {
        let cli = Cli::parse_from(["tfinventory", "--list", "--debug"]);
        assert_eq!(cli.verbosity(), 2);

        let cli = Cli::parse_from(["tfinventory", "--list", "--debug", "-vvv"]);
        assert_eq!(cli.verbosity(), 3);

        assert!(Cli::try_parse_from(["tfinventory", "--list", "--debug", "-q"]).is_err());
    }

    #[test]
    fn test_template_flags() {
        let cli = Cli::parse_from([
            "tfinventory",
            "--list",
            "--ansible-inventory-name-template",
            "{{ tags.Name }}",
            "--ansible-resource-filter-template",
            "True",
            "--format",
            "yaml",
            "-vv",
        ]);
        assert_eq!(cli.ansible_inventory_name_template.as_deref(), Some("{{ tags.Name }}"));
        assert_eq!(cli.ansible_resource_filter_template.as_deref(), Some("True"));
        assert_eq!(cli.format, Some(ReportFormat::Yaml));
        assert_eq!(cli.verbose, 2);
    }
}
