//! Show Command

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use powerseq_common::{
    format_number, CommandSequence, ResolvedSequence, SettingLabels,
};

use super::RunInputs;
use crate::output::{print_list, truncate, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub inputs: RunInputs,

    /// Print the compiled controller commands instead of the test rows
    #[arg(long)]
    pub commands: bool,
}

/// Test sequence row for display
#[derive(Serialize)]
pub struct RowDisplay {
    pub tag: u32,
    pub test_name: String,
    pub test_time: String,
    pub video: String,
    pub preset_picture: String,
    pub abc: String,
    pub backlight: String,
    pub lux: String,
    pub mdd: String,
    pub qs: String,
    pub special_commands: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl RowDisplay {
    pub fn from_sequence(sequence: &ResolvedSequence) -> Vec<Self> {
        sequence
            .rows
            .iter()
            .map(|row| Self {
                tag: row.tag,
                test_name: row.test_name.clone(),
                test_time: row.test_time.map(format_number).unwrap_or_default(),
                video: row.video.clone().unwrap_or_default(),
                preset_picture: row.preset_picture.clone().unwrap_or_default(),
                abc: row
                    .abc
                    .map(|on| if on { "on" } else { "off" }.to_string())
                    .unwrap_or_default(),
                backlight: row.backlight.map(|b| b.to_string()).unwrap_or_default(),
                lux: row.lux.map(format_number).unwrap_or_default(),
                mdd: row.mdd.map(|m| m.to_string()).unwrap_or_default(),
                qs: row.qs.map(|q| q.to_string()).unwrap_or_default(),
                special_commands: row.special_commands.to_string(),
                extras: sequence
                    .extra_columns
                    .iter()
                    .zip(row.extras.iter())
                    .filter_map(|(column, value)| {
                        value.as_ref().map(|v| (column.clone(), v.clone()))
                    })
                    .collect(),
            })
            .collect()
    }
}

impl TableDisplay for RowDisplay {
    fn headers() -> Vec<&'static str> {
        vec![
            "Tag", "Test", "Time (s)", "Video", "Preset Picture", "ABC", "Backlight", "Lux",
            "MDD", "QS", "Special",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.tag.to_string(),
            self.test_name.clone(),
            self.test_time.clone(),
            self.video.clone(),
            self.preset_picture.clone(),
            self.abc.clone(),
            self.backlight.clone(),
            self.lux.clone(),
            self.mdd.clone(),
            self.qs.clone(),
            self.special_commands.clone(),
        ]
    }
}

/// Controller command for display
#[derive(Serialize)]
pub struct CommandDisplay {
    pub line: usize,
    pub command_type: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stab_wait: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stab: Option<String>,
}

impl CommandDisplay {
    pub fn from_commands(commands: &CommandSequence) -> Vec<Self> {
        commands
            .commands()
            .iter()
            .enumerate()
            .map(|(i, command)| {
                let mut cells = command.cells().into_iter();
                Self {
                    line: i + 1,
                    command_type: cells.next().unwrap_or_default(),
                    command: cells.next().unwrap_or_default(),
                    stab_wait: cells.next(),
                    max_stab: cells.next(),
                }
            })
            .collect()
    }
}

impl TableDisplay for CommandDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Line", "Type", "Command", "Stab Wait", "Max Stab"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.line.to_string(),
            self.command_type.clone(),
            truncate(&self.command.replace("\\n", " "), 70),
            self.stab_wait.clone().unwrap_or_default(),
            self.max_stab.clone().unwrap_or_default(),
        ]
    }
}

pub fn execute(args: ShowArgs, format: OutputFormat) -> Result<()> {
    let mut prompt = args.inputs.prompt();
    let (catalog, config) = args.inputs.load(&mut prompt)?;
    let (sequence, commands) =
        powerseq_common::generate(&catalog, &config, &SettingLabels::standard())?;

    if args.commands {
        print_list(&CommandDisplay::from_commands(&commands), format);
    } else {
        print_list(&RowDisplay::from_sequence(&sequence), format);
    }
    Ok(())
}
