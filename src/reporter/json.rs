//! JSON inventory writer.

use crate::config::Config;
use crate::error::Result;
use crate::reporter::{ModeReport, ReportGenerator};
use crate::types::{InventoryDocument, OutputMode};

/// JSON inventory writer.
pub struct JsonReporter {
    /// Whether to pretty-print the output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON writer.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty,
        }
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(&self, document: &InventoryDocument, mode: &OutputMode) -> Result<String> {
        let report = ModeReport::new(document, mode);

        let json = if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        };

        json.map_err(|e| {
            crate::err!(ReportGeneration {
                message: format!("Failed to serialize JSON inventory: {e}"),
            })
        })
    }
}
