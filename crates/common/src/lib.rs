//! PowerSeq Common Library
//!
//! Generates the test sequence and controller command sequence for a TV
//! power consumption test run. The pipeline is strictly sequential:
//! [`planner::plan`] → [`resolver::resolve`] → [`compiler::compile`] →
//! [`writer::ArtifactWriter`].

pub mod catalog;
pub mod compiler;
pub mod entry_form;
pub mod error;
pub mod planner;
pub mod prompts;
pub mod resolver;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use catalog::{Catalog, TestKindDefinition};
pub use compiler::{compile, CommandSequence, CompiledCommand};
pub use entry_form::{load_operator_config, OperatorConfig, PictureSlot, Quickstart};
pub use error::{Error, Result};
pub use planner::{plan, PlannedSequence};
pub use prompts::SettingLabels;
pub use resolver::{resolve, ResolvedRow, ResolvedSequence};
pub use types::*;
pub use writer::{read_test_sequence, ArtifactWriter, WrittenArtifacts};

/// PowerSeq version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plan, resolve and compile one run
pub fn generate(
    catalog: &Catalog,
    config: &OperatorConfig,
    labels: &SettingLabels,
) -> Result<(ResolvedSequence, CommandSequence)> {
    let sequence = resolve(plan(config), catalog, config)?;
    let commands = compile(&sequence, labels);
    Ok((sequence, commands))
}
