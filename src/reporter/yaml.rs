//! YAML inventory writer.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::{ModeReport, ReportGenerator};
use crate::types::{InventoryDocument, OutputMode};

/// YAML inventory writer. YAML has no compact form, so `pretty` is ignored.
pub struct YamlReporter;

impl YamlReporter {
    /// Create a new YAML writer.
    #[must_use]
    pub fn new(_config: &Config) -> Self {
        Self
    }
}

impl ReportGenerator for YamlReporter {
    fn generate(&self, document: &InventoryDocument, mode: &OutputMode) -> Result<String> {
        serde_yaml::to_string(&ModeReport::new(document, mode)).map_err(|e| {
            crate::err!(ReportGeneration {
                message: format!("Failed to serialize YAML inventory: {e}"),
            })
        })
    }
}
