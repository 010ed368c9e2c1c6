//! Generate Command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::debug;

use powerseq_common::{ArtifactWriter, SettingLabels, WrittenArtifacts};

use super::show::RowDisplay;
use super::RunInputs;
use crate::output::{print_info, print_item, print_list, print_success, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub inputs: RunInputs,

    /// Save to <data_folder>/Repair with a repair- prefix
    #[arg(long)]
    pub repair: bool,

    /// Where the controller's working copy goes [default: current directory]
    #[arg(long)]
    pub working_dir: Option<PathBuf>,

    /// Do not write a working copy
    #[arg(long, conflicts_with = "working_dir")]
    pub no_working_copy: bool,
}

/// Summary of a generate run
#[derive(Serialize)]
pub struct ArtifactSummary {
    pub tests: usize,
    pub commands: usize,
    pub test_sequence: PathBuf,
    pub command_sequence: PathBuf,
    pub archived: Vec<PathBuf>,
    pub working_copies: Vec<PathBuf>,
}

impl ArtifactSummary {
    fn new(tests: usize, commands: usize, written: WrittenArtifacts) -> Self {
        Self {
            tests,
            commands,
            test_sequence: written.test_sequence,
            command_sequence: written.command_sequence,
            archived: written.archived,
            working_copies: written.working_copies,
        }
    }
}

impl TableDisplay for ArtifactSummary {
    fn headers() -> Vec<&'static str> {
        vec!["Tests", "Commands", "Test Sequence", "Command Sequence", "Archived"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.tests.to_string(),
            self.commands.to_string(),
            self.test_sequence.display().to_string(),
            self.command_sequence.display().to_string(),
            self.archived.len().to_string(),
        ]
    }
}

pub fn execute(args: GenerateArgs, format: OutputFormat) -> Result<()> {
    let mut prompt = args.inputs.prompt();
    let (catalog, config) = args.inputs.load(&mut prompt)?;
    let (sequence, commands) =
        powerseq_common::generate(&catalog, &config, &SettingLabels::standard())?;

    let working_dir = if args.no_working_copy {
        None
    } else {
        match args.working_dir {
            Some(dir) => Some(dir),
            None => Some(std::env::current_dir().context("Cannot read current directory")?),
        }
    };
    debug!("Working copy directory: {:?}", working_dir);

    let writer = ArtifactWriter::new(&args.inputs.data_folder)
        .repair(args.repair)
        .working_dir(working_dir);
    let written = prompt.retry(|| writer.write(&sequence, &commands))?;

    if matches!(format, OutputFormat::Table | OutputFormat::Plain) {
        print_list(&RowDisplay::from_sequence(&sequence), format);
    }
    for path in &written.working_copies {
        print_info(&format!("Working copy {}", path.display()));
    }
    let summary = ArtifactSummary::new(sequence.len(), commands.len(), written);
    print_success(&format!(
        "Generated {} tests and {} commands",
        summary.tests, summary.commands
    ));
    print_item(&summary, format);
    Ok(())
}
