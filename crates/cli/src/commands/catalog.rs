//! Catalog Command

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use powerseq_common::{format_number, TestKind, TestKindDefinition};

use super::load_catalog;
use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct CatalogArgs {
    /// Test details catalog CSV [default: bundled catalog]
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Only list identifiers containing this text
    #[arg(long)]
    pub filter: Option<String>,
}

/// Catalog entry for display
#[derive(Serialize)]
pub struct TestKindDisplay {
    pub name: String,
    pub kind: TestKind,
    pub test_time: String,
    pub video: String,
    pub preset_picture: String,
    pub lux: String,
    pub special_commands: String,
}

impl From<&TestKindDefinition> for TestKindDisplay {
    fn from(def: &TestKindDefinition) -> Self {
        Self {
            name: def.name.clone(),
            kind: TestKind::classify(&def.name),
            test_time: def.test_time.map(format_number).unwrap_or_default(),
            video: def.video.clone().unwrap_or_default(),
            preset_picture: def
                .preset_picture
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default(),
            lux: def.lux.map(format_number).unwrap_or_default(),
            special_commands: def.special_commands.to_string(),
        }
    }
}

impl TableDisplay for TestKindDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Kind", "Time (s)", "Video", "Preset Picture", "Lux", "Special"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.kind.to_string(),
            self.test_time.clone(),
            self.video.clone(),
            self.preset_picture.clone(),
            self.lux.clone(),
            self.special_commands.clone(),
        ]
    }
}

pub fn execute(args: CatalogArgs, format: OutputFormat) -> Result<()> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    let displays: Vec<TestKindDisplay> = catalog
        .iter()
        .filter(|def| {
            args.filter
                .as_deref()
                .map_or(true, |text| def.name.contains(text))
        })
        .map(TestKindDisplay::from)
        .collect();
    print_list(&displays, format);
    Ok(())
}
