//! Command Compiler
//!
//! Walks the resolved rows and emits the command list the automation
//! controller executes: a fixed configuration preamble, then for every row a
//! tag, its prompt(s), an optional wait and its special commands.

use serde::{Serialize, Serializer};
use tracing::info;

use crate::prompts::{self, SettingLabels, STAB_MAX_ITER, STAB_WAIT_SECS, WAKETIME_RESPONSIVE};
use crate::resolver::{ResolvedRow, ResolvedSequence};
use crate::types::{format_number, SpecialCommand, TestKind};

/// Single-cell rows that open every command file
pub const CONFIG_PREAMBLE: [&str; 6] = [
    "#Config",
    "Remote name",
    "IR Delay (ms)",
    "Macro File",
    "",
    "#Sequence",
];

/// Tag marker; `phase` 1 marks the second half of a wake time test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandTag {
    pub tag: u32,
    pub phase: u8,
}

impl CommandTag {
    pub fn primary(tag: u32) -> Self {
        Self { tag, phase: 0 }
    }

    pub fn secondary(self) -> Self {
        Self { phase: 1, ..self }
    }
}

impl std::fmt::Display for CommandTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.phase == 0 {
            write!(f, "{}", self.tag)
        } else {
            write!(f, "{}.{}", self.tag, self.phase)
        }
    }
}

impl Serialize for CommandTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Retry limits of a stabilization prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StabilizationLimits {
    /// Seconds measured per iteration
    pub wait_secs: u32,
    pub max_iterations: u32,
}

impl Default for StabilizationLimits {
    fn default() -> Self {
        Self {
            wait_secs: STAB_WAIT_SECS,
            max_iterations: STAB_MAX_ITER,
        }
    }
}

/// One controller command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompiledCommand {
    Config {
        cell: String,
    },
    Tag {
        tag: CommandTag,
    },
    UserCommand {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stabilization: Option<StabilizationLimits>,
    },
    Wait {
        seconds: f64,
    },
    SpecialCommand {
        #[serde(flatten)]
        command: SpecialCommand,
    },
}

impl CompiledCommand {
    fn user(text: String) -> Self {
        CompiledCommand::UserCommand {
            text,
            stabilization: None,
        }
    }

    /// Value of the `command_type` column
    pub fn command_type(&self) -> &str {
        match self {
            CompiledCommand::Config { cell } => cell,
            CompiledCommand::Tag { .. } => "tag",
            CompiledCommand::UserCommand {
                stabilization: Some(_),
                ..
            } => "user_stabilization",
            CompiledCommand::UserCommand { .. } => "user_command",
            CompiledCommand::Wait { .. } => "wait",
            CompiledCommand::SpecialCommand { command } => &command.kind,
        }
    }

    /// CSV cells for this command, unpadded
    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![self.command_type().to_string()];
        match self {
            CompiledCommand::Config { .. } => {}
            CompiledCommand::Tag { tag } => cells.push(tag.to_string()),
            CompiledCommand::UserCommand {
                text,
                stabilization,
            } => {
                cells.push(text.clone());
                if let Some(limits) = stabilization {
                    cells.push(limits.wait_secs.to_string());
                    cells.push(limits.max_iterations.to_string());
                }
            }
            CompiledCommand::Wait { seconds } => cells.push(format_number(*seconds)),
            CompiledCommand::SpecialCommand { command } => cells.push(command.argument.clone()),
        }
        cells
    }
}

/// Compiled commands in execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandSequence(Vec<CompiledCommand>);

impl CommandSequence {
    pub fn commands(&self) -> &[CompiledCommand] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rows padded to the widest command
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows: Vec<Vec<String>> = self.0.iter().map(CompiledCommand::cells).collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        rows
    }
}

/// Compile a resolved sequence
pub fn compile(sequence: &ResolvedSequence, labels: &SettingLabels) -> CommandSequence {
    let mut commands: Vec<CompiledCommand> = CONFIG_PREAMBLE
        .iter()
        .map(|cell| CompiledCommand::Config {
            cell: cell.to_string(),
        })
        .collect();

    let mut previous: Option<&ResolvedRow> = None;
    for row in &sequence.rows {
        commands.extend(compile_row(row, previous, labels));
        previous = Some(row);
    }

    info!(
        "Compiled {} commands for {} tests",
        commands.len(),
        sequence.len()
    );
    CommandSequence(commands)
}

fn compile_row(
    row: &ResolvedRow,
    previous: Option<&ResolvedRow>,
    labels: &SettingLabels,
) -> Vec<CompiledCommand> {
    let tag = CommandTag::primary(row.tag);
    let mut commands = vec![CompiledCommand::Tag { tag }];

    match row.kind {
        TestKind::Waketime => commands.extend([
            CompiledCommand::user(prompts::waketime_start_message(row)),
            CompiledCommand::Tag {
                tag: tag.secondary(),
            },
            CompiledCommand::user(WAKETIME_RESPONSIVE.to_string()),
        ]),
        TestKind::ScreenConfig => commands.push(CompiledCommand::user(
            prompts::screen_config_message(row, labels),
        )),
        TestKind::LumProfile => commands.push(CompiledCommand::user(
            prompts::lum_profile_message(row, labels),
        )),
        TestKind::Standby => {
            commands.push(CompiledCommand::user(prompts::standby_message(row, labels)))
        }
        TestKind::Stabilization => commands.push(CompiledCommand::UserCommand {
            text: prompts::stabilization_message(row, labels),
            stabilization: Some(StabilizationLimits::default()),
        }),
        TestKind::Normal => commands.push(CompiledCommand::user(prompts::test_message(
            row, previous, labels,
        ))),
    }

    if let Some(seconds) = row.test_time {
        commands.push(CompiledCommand::Wait { seconds });
    }

    commands.extend(
        row.special_commands
            .commands()
            .iter()
            .cloned()
            .map(|command| CompiledCommand::SpecialCommand { command }),
    );
    commands
}
