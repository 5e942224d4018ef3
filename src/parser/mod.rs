//! Terraform state parsing module.
//!
//! This module turns a state document into the resource model used by the
//! rest of the pipeline.
//!
//! # Supported Layouts
//!
//! - Legacy module layout (format versions 1-3): `modules[].resources`, with
//!   attributes already in flatmap encoding under `primary.attributes`
//! - Modern layout (format version 4): `resources[].instances[]`, with nested
//!   JSON attributes that are flattened on load
//!
//! # Example
//!
//! ```rust,no_run
//! use tfinventory::parser::StateParser;
//!
//! let parser = StateParser::new();
//! let parsed = parser.parse_file("terraform.tfstate")?;
//! println!("Found {} resources", parsed.resources.len());
//! # Ok::<(), tfinventory::TfInventoryError>(())
//! ```

pub mod flatmap;
mod tfstate;

pub use tfstate::{ParsedState, StateParser};

/// Default state file name, relative to the working directory.
pub const DEFAULT_STATE_FILE: &str = "terraform.tfstate";

/// Newest state format version this crate reads.
pub const MAX_STATE_VERSION: u64 = 4;
