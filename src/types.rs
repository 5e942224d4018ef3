//! Core data types used throughout tfinventory.
//!
//! This module defines the fundamental data structures for representing:
//! - Terraform resources loaded from a state document
//! - The four template roles that drive the mapping
//! - Inventory groups, host variables and the aggregate inventory

use crate::error::TfInventoryError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// Flat attribute map as stored in Terraform's flatmap encoding.
///
/// Keys are `.`-separated paths where a numeric segment is a list index,
/// e.g. `network.0.fixed_ip_v4`. Ordered by key.
pub type FlatAttributes = BTreeMap<String, String>;

/// Attributes expanded into nested maps and lists.
pub type ExpandedAttributes = serde_json::Map<String, serde_json::Value>;

/// Variables attached to a single inventory host.
pub type HostVars = BTreeMap<String, serde_json::Value>;

/// A Terraform resource instance as exposed to templates.
///
/// # Example state entry (legacy layout)
///
/// ```json
/// "aws_instance.web": {
///   "type": "aws_instance",
///   "provider": "provider.aws",
///   "primary": {
///     "id": "i-0abc",
///     "attributes": { "tags.%": "1", "tags.Name": "web" }
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Unique resource address (e.g., `aws_instance.web`,
    /// `module.app.aws_instance.web.0`)
    pub name: String,

    /// Provider-defined resource type (e.g., `aws_instance`)
    pub resource_type: String,

    /// Provider namespace, if recorded in the state
    pub provider: Option<String>,

    /// Primary id recorded in the state
    pub id: Option<String>,

    /// Module address the resource lives in, empty for the root module
    pub module_path: String,

    /// Other resources this one depends on
    pub depends_on: Vec<String>,

    /// Raw flatmap attributes
    pub attributes: FlatAttributes,

    /// Nested view of `attributes`
    pub expanded_attributes: ExpandedAttributes,
}

impl Resource {
    /// Build a resource from its flat attributes, expanding them.
    ///
    /// # Errors
    ///
    /// Returns `MalformedAttributeKey` if any flat key cannot be expanded.
    pub fn new(
        name: impl Into<String>,
        resource_type: impl Into<String>,
        attributes: FlatAttributes,
    ) -> crate::Result<Self> {
        let name = name.into();
        let expanded_attributes = crate::parser::flatmap::expand(&attributes)
            .map_err(|e| e.into_error(&name))?;

        Ok(Self {
            name,
            resource_type: resource_type.into(),
            provider: None,
            id: None,
            module_path: String::new(),
            depends_on: Vec::new(),
            attributes,
            expanded_attributes,
        })
    }

    /// Build a resource from nested attributes, as found in modern state.
    ///
    /// The flat view is derived with [`flatten`](crate::parser::flatmap::flatten)
    /// and the nested view keeps the original map keys, so keys containing
    /// the path separator are preserved.
    #[must_use]
    pub fn from_nested(
        name: impl Into<String>,
        resource_type: impl Into<String>,
        nested: &ExpandedAttributes,
    ) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            provider: None,
            id: None,
            module_path: String::new(),
            depends_on: Vec::new(),
            attributes: crate::parser::flatmap::flatten(nested),
            expanded_attributes: crate::parser::flatmap::normalize(nested),
        }
    }

    /// Set the provider namespace.
    #[must_use]
    pub fn with_provider(mut self, provider: Option<String>) -> Self {
        self.provider = provider;
        self
    }

    /// Set the primary id.
    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// Set the module address.
    #[must_use]
    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    /// Set the dependency list.
    #[must_use]
    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }
}

/// Which of the four user templates is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateRole {
    /// Produces the inventory host name
    Name,
    /// Produces newline-separated group names
    Groups,
    /// Produces `True` or `False`
    Filter,
    /// Produces newline-separated `key=value` lines
    HostVars,
}

impl TemplateRole {
    /// All roles, in the order the assembler evaluates them.
    pub const ALL: [Self; 4] = [Self::Filter, Self::Name, Self::Groups, Self::HostVars];

    /// Returns the role as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Groups => "groups",
            Self::Filter => "filter",
            Self::HostVars => "host_vars",
        }
    }
}

impl Display for TemplateRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named inventory group and its member hosts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryGroup {
    /// Group name
    pub group_name: String,
    /// Inventory host names, deduplicated
    pub members: BTreeSet<String>,
}

impl InventoryGroup {
    /// Create an empty group.
    #[must_use]
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            members: BTreeSet::new(),
        }
    }
}

/// The aggregate inventory built by one run.
#[derive(Debug, Default)]
pub struct InventoryDocument {
    /// Groups keyed by name
    pub groups: BTreeMap<String, InventoryGroup>,

    /// Host variables keyed by inventory host name
    pub hostvars: BTreeMap<String, HostVars>,

    /// Recoverable, resource-scoped errors encountered during the run
    pub warnings: Vec<TfInventoryError>,
}

impl InventoryDocument {
    /// Add a host to a group, creating the group if needed.
    pub fn add_to_group(&mut self, group_name: &str, host: &str) {
        self.groups
            .entry(group_name.to_string())
            .or_insert_with(|| InventoryGroup::new(group_name))
            .members
            .insert(host.to_string());
    }

    /// Replace the variables of a host. Returns `true` if the host already
    /// had variables.
    pub fn set_hostvars(&mut self, host: &str, vars: HostVars) -> bool {
        self.hostvars.insert(host.to_string(), vars).is_some()
    }

    /// Variables of a host, if known.
    #[must_use]
    pub fn host(&self, host: &str) -> Option<&HostVars> {
        self.hostvars.get(host)
    }

    /// Whether any recoverable error was recorded.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Output serialization format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// JSON, as expected by Ansible
    #[default]
    Json,
    /// YAML, for reading the inventory by eye
    Yaml,
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Yaml => write!(f, "yaml"),
        }
    }
}

/// The two requests the inventory tool issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Full inventory (`--list`)
    List,
    /// Variables of a single host (`--host <name>`)
    Host(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_new_expands_attributes() {
        let mut attributes = FlatAttributes::new();
        attributes.insert("tags.Name".to_string(), "web".to_string());
        attributes.insert("id".to_string(), "i-0abc".to_string());

        let resource = Resource::new("aws_instance.web", "aws_instance", attributes).unwrap();

        assert_eq!(resource.expanded_attributes["tags"]["Name"], "web");
        assert_eq!(resource.expanded_attributes["id"], "i-0abc");
        assert!(resource.module_path.is_empty());
    }

    #[test]
    fn test_resource_new_rejects_malformed_key() {
        let mut attributes = FlatAttributes::new();
        attributes.insert("network.-1.ip".to_string(), "10.0.0.1".to_string());

        let err = Resource::new("aws_instance.web", "aws_instance", attributes).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.resource(), Some("aws_instance.web"));
    }

    #[test]
    fn test_resource_from_nested_keeps_dotted_keys() {
        let nested = match serde_json::json!({
            "tags": {"app": "web", "app.kubernetes.io/name": "frontend"},
            "cpu_core_count": 2,
        }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };

        let resource = Resource::from_nested("aws_instance.web", "aws_instance", &nested);

        assert_eq!(resource.attributes["tags.app.kubernetes.io/name"], "frontend");
        assert_eq!(resource.attributes["cpu_core_count"], "2");
        assert_eq!(resource.expanded_attributes["tags"]["app"], "web");
        assert_eq!(resource.expanded_attributes["tags"]["app.kubernetes.io/name"], "frontend");
        assert_eq!(resource.expanded_attributes["cpu_core_count"], "2");
    }

    #[test]
    fn test_add_to_group_deduplicates() {
        let mut doc = InventoryDocument::default();
        doc.add_to_group("all", "web");
        doc.add_to_group("all", "web");
        doc.add_to_group("all", "db");

        let all = &doc.groups["all"];
        assert_eq!(all.members.iter().collect::<Vec<_>>(), vec!["db", "web"]);
    }

    #[test]
    fn test_set_hostvars_reports_overwrite() {
        let mut doc = InventoryDocument::default();
        assert!(!doc.set_hostvars("web", HostVars::new()));
        assert!(doc.set_hostvars("web", HostVars::new()));
    }

    #[test]
    fn test_template_role_display() {
        assert_eq!(TemplateRole::HostVars.to_string(), "host_vars");
        assert_eq!(TemplateRole::Filter.to_string(), "filter");
    }
}
