//! Template rendering module.
//!
//! The four user templates (name, groups, filter, host_vars) are strategy
//! objects evaluated per resource. The inventory assembler only sees the
//! [`TemplateRenderer`] trait; [`TeraRenderer`] is the production
//! implementation backed by the Tera engine.
//!
//! # Context
//!
//! Every template is rendered against a [`ResourceContext`] exposing:
//!
//! - `name`, `type`, `provider`, `id`, `module`
//! - `attributes` (flatmap) and `expanded_attributes` (nested)
//! - every top-level key of `expanded_attributes`, unless it collides with
//!   one of the names above
//! - `resource_name` and `resource` (`type`, `provider`, `depends_on`,
//!   `primary.id`, `primary.attributes`) as found in legacy state files
//!
//! # Example
//!
//! ```rust
//! use tfinventory::template::{ResourceContext, TemplateRenderer, TeraRenderer};
//! use tfinventory::types::{FlatAttributes, Resource, TemplateRole};
//!
//! let resource = Resource::new("aws_instance.web", "aws_instance", FlatAttributes::new())?;
//! let context = ResourceContext::from_resource(&resource);
//! let renderer = TeraRenderer::new();
//!
//! let name = renderer.render(TemplateRole::Name, "{{ name | upper }}", &context)?;
//! assert_eq!(name, "AWS_INSTANCE.WEB");
//! # Ok::<(), tfinventory::TfInventoryError>(())
//! ```

pub mod literal;

pub use literal::try_parse_literal;

use crate::config::TemplateSet;
use crate::error::Result;
use crate::types::{Resource, TemplateRole};

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tera::{Context as TeraContext, Tera};

/// Bindings that are never overwritten by promoted attribute keys.
pub const RESERVED_BINDINGS: &[&str] = &[
    "name",
    "type",
    "provider",
    "id",
    "module",
    "attributes",
    "expanded_attributes",
    "resource",
    "resource_name",
];

/// Read-only variables a template is rendered against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceContext {
    bindings: Map<String, Value>,
}

impl ResourceContext {
    /// Build the context of a resource.
    #[must_use]
    pub fn from_resource(resource: &Resource) -> Self {
        let mut bindings = Map::new();

        for (key, value) in &resource.expanded_attributes {
            if !RESERVED_BINDINGS.contains(&key.as_str()) {
                bindings.insert(key.clone(), value.clone());
            }
        }

        bindings.insert("name".to_string(), json!(resource.name));
        bindings.insert("type".to_string(), json!(resource.resource_type));
        bindings.insert("provider".to_string(), json!(resource.provider));
        bindings.insert("id".to_string(), json!(resource.id));
        bindings.insert("module".to_string(), json!(resource.module_path));
        bindings.insert("attributes".to_string(), json!(resource.attributes));
        bindings.insert(
            "expanded_attributes".to_string(),
            Value::Object(resource.expanded_attributes.clone()),
        );
        bindings.insert("resource_name".to_string(), json!(resource.name));
        bindings.insert(
            "resource".to_string(),
            json!({
                "type": resource.resource_type,
                "provider": resource.provider,
                "depends_on": resource.depends_on,
                "primary": {
                    "id": resource.id,
                    "attributes": resource.attributes,
                },
            }),
        );

        Self { bindings }
    }

    /// Look up a binding.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bindings.get(key)
    }

    /// All bindings.
    #[must_use]
    pub fn bindings(&self) -> &Map<String, Value> {
        &self.bindings
    }

    fn to_tera(&self) -> TeraContext {
        let mut context = TeraContext::new();
        for (key, value) in &self.bindings {
            context.insert(key.as_str(), value);
        }
        context
    }
}

/// Renders a template source against a resource context.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer {
    /// Render `source` for the given role.
    ///
    /// # Errors
    ///
    /// Returns a `Template` error if the source does not compile or fails
    /// during evaluation.
    fn render(&self, role: TemplateRole, source: &str, context: &ResourceContext) -> Result<String>;
}

/// Tera-backed renderer.
///
/// Templates registered through [`TeraRenderer::prepare`] are compiled once;
/// any other source is compiled on each call.
#[derive(Clone)]
pub struct TeraRenderer {
    tera: Tera,
    prepared: HashMap<TemplateRole, String>,
}

impl Default for TeraRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TeraRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeraRenderer")
            .field("prepared", &self.prepared.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TeraRenderer {
    /// Create a renderer with autoescaping disabled and the custom filters
    /// registered.
    #[must_use]
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("oneline", oneline_filter);

        Self {
            tera,
            prepared: HashMap::new(),
        }
    }

    /// Create a renderer with all four templates compiled.
    ///
    /// # Errors
    ///
    /// Returns a `Template` error naming the first template that does not
    /// compile.
    pub fn with_templates(templates: &TemplateSet) -> Result<Self> {
        let mut renderer = Self::new();
        for role in TemplateRole::ALL {
            renderer.prepare(role, templates.get(role))?;
        }
        Ok(renderer)
    }

    /// Compile `source` and register it for `role`.
    ///
    /// # Errors
    ///
    /// Returns a `Template` error if the source does not compile.
    pub fn prepare(&mut self, role: TemplateRole, source: &str) -> Result<()> {
        tracing::debug!(role = %role, "Compiling template");
        self.tera
            .add_raw_template(role.as_str(), source)
            .map_err(|e| {
                crate::err!(Template {
                    role,
                    resource: None,
                    message: describe(&e),
                })
            })?;
        self.prepared.insert(role, source.to_string());
        Ok(())
    }
}

impl TemplateRenderer for TeraRenderer {
    fn render(&self, role: TemplateRole, source: &str, context: &ResourceContext) -> Result<String> {
        let tera_context = context.to_tera();

        let rendered = if self.prepared.get(&role).is_some_and(|s| s == source) {
            self.tera.render(role.as_str(), &tera_context)
        } else {
            let mut tera = self.tera.clone();
            tera.render_str(source, &tera_context)
        };

        rendered.map_err(|e| {
            crate::err!(Template {
                role,
                resource: context
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                message: describe(&e),
            })
        })
    }
}

/// Flatten a Tera error and its causes into one line.
fn describe(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// `oneline`: escape line breaks so a value fits on a single host-var line.
fn oneline_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s.replace("\r\n", "\\n").replace('\n', "\\n"))),
        other => Ok(other.clone()),
    }
}
