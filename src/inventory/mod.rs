//! Inventory assembly module.
//!
//! The assembler walks the resources in order and, for each one:
//!
//! 1. renders the filter template; `True` keeps the resource, `False` drops
//!    it, anything else drops it with a warning
//! 2. renders the name template to get the inventory host name
//! 3. renders the groups template and adds the host to every listed group
//! 4. renders the host-vars template and stores the parsed variables
//!
//! Inventory names may collide: group memberships accumulate and the host
//! variables of the last resource win. Template failures abort the run;
//! every other problem is recorded in [`InventoryDocument::warnings`].
//!
//! # Example
//!
//! ```rust
//! use tfinventory::config::TemplateSet;
//! use tfinventory::inventory::InventoryAssembler;
//! use tfinventory::template::TeraRenderer;
//! use tfinventory::types::{FlatAttributes, Resource};
//!
//! let mut attributes = FlatAttributes::new();
//! attributes.insert("private_ip".to_string(), "10.0.0.4".to_string());
//! let web = Resource::new("aws_instance.web", "aws_instance", attributes)?;
//!
//! let templates = TemplateSet::default();
//! let assembler = InventoryAssembler::new(TeraRenderer::with_templates(&templates)?, templates);
//! let inventory = assembler.assemble([&web])?;
//!
//! assert!(inventory.groups["all"].members.contains("aws_instance.web"));
//! assert_eq!(inventory.hostvars["aws_instance.web"]["ansible_host"], "10.0.0.4");
//! # Ok::<(), tfinventory::TfInventoryError>(())
//! ```

mod lines;

pub use lines::{non_empty_lines, parse_filter_result, parse_groups, parse_host_var_line, parse_host_vars};

use crate::config::TemplateSet;
use crate::error::Result;
use crate::template::{ResourceContext, TemplateRenderer};
use crate::types::{InventoryDocument, Resource, TemplateRole};

/// Group name reserved by the dynamic-inventory output format.
pub const RESERVED_GROUP: &str = "_meta";

/// Builds an [`InventoryDocument`] from resources by driving the templates.
#[derive(Debug)]
pub struct InventoryAssembler<R: TemplateRenderer> {
    renderer: R,
    templates: TemplateSet,
}

impl<R: TemplateRenderer> InventoryAssembler<R> {
    /// Create an assembler rendering `templates` with `renderer`.
    #[must_use]
    pub fn new(renderer: R, templates: TemplateSet) -> Self {
        Self { renderer, templates }
    }

    /// Process every resource in iteration order.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error (a template that fails to render).
    /// Resource-scoped errors are collected in the document's warnings.
    pub fn assemble<'a, I>(&self, resources: I) -> Result<InventoryDocument>
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let mut document = InventoryDocument::default();
        let mut processed = 0usize;

        for resource in resources {
            processed += 1;
            match self.process(resource, &mut document) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::warn!(resource = %resource.name, error = %e, "Skipping resource");
                    document.warnings.push(e);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            resources = processed,
            hosts = document.hostvars.len(),
            groups = document.groups.len(),
            warnings = document.warnings.len(),
            "Inventory assembled"
        );

        Ok(document)
    }

    fn render(&self, role: TemplateRole, context: &ResourceContext) -> Result<String> {
        self.renderer.render(role, self.templates.get(role), context)
    }

    fn process(&self, resource: &Resource, document: &mut InventoryDocument) -> Result<()> {
        let context = ResourceContext::from_resource(resource);

        let rendered = self.render(TemplateRole::Filter, &context)?;
        if !parse_filter_result(&resource.name, &rendered)? {
            tracing::debug!(resource = %resource.name, "Excluded by filter template");
            return Ok(());
        }

        let inventory_name = self.render(TemplateRole::Name, &context)?.trim().to_string();
        if inventory_name.is_empty() {
            return Err(crate::err!(EmptyInventoryName {
                resource: resource.name.clone(),
            }));
        }
        tracing::debug!(resource = %resource.name, host = %inventory_name, "Rendered inventory name");

        let groups = parse_groups(&self.render(TemplateRole::Groups, &context)?);
        let (host_vars, line_errors) =
            parse_host_vars(&resource.name, &self.render(TemplateRole::HostVars, &context)?);

        for error in line_errors {
            tracing::warn!(resource = %resource.name, error = %error, "Skipping host_vars line");
            document.warnings.push(error);
        }

        for group in &groups {
            if group == RESERVED_GROUP {
                tracing::warn!(resource = %resource.name, group = %group, "Group name is reserved, ignoring");
                continue;
            }
            tracing::debug!(resource = %resource.name, host = %inventory_name, group = %group, "Added to group");
            document.add_to_group(group, &inventory_name);
        }

        if document.set_hostvars(&inventory_name, host_vars) {
            tracing::info!(
                resource = %resource.name,
                host = %inventory_name,
                "Inventory name already used by another resource, replacing its host variables"
            );
        }

        Ok(())
    }
}
