//! Core types for PowerSeq

use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Prompt family of a planned test, decided once from its identifier.
///
/// Identifiers are matched against fixed substrings in priority order, so
/// `echo_waketime` is a wake-time test even though it also names a device
/// and `standby_echo` is a standby test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Waketime,
    ScreenConfig,
    LumProfile,
    Standby,
    Stabilization,
    Normal,
}

impl TestKind {
    pub fn classify(test_name: &str) -> Self {
        if test_name.contains("waketime") {
            TestKind::Waketime
        } else if test_name.contains("config") {
            TestKind::ScreenConfig
        } else if test_name.contains("lum_profile") {
            TestKind::LumProfile
        } else if test_name.contains("standby") {
            TestKind::Standby
        } else if test_name.contains("stabilization") {
            TestKind::Stabilization
        } else {
            TestKind::Normal
        }
    }
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestKind::Waketime => write!(f, "waketime"),
            TestKind::ScreenConfig => write!(f, "screen_config"),
            TestKind::LumProfile => write!(f, "lum_profile"),
            TestKind::Standby => write!(f, "standby"),
            TestKind::Stabilization => write!(f, "stabilization"),
            TestKind::Normal => write!(f, "normal"),
        }
    }
}

/// Preset picture role named by a catalog entry.
///
/// Named roles must be bound by the operator. Anything else is a literal:
/// it is replaced when it matches an entry form label (`pps3`,
/// `hlg_default`, ...) and otherwise written through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PresetRole {
    Default,
    Brightest,
    HdrDefault,
    AbcDefault,
    Literal(String),
}

impl PresetRole {
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "default" => PresetRole::Default,
            "brightest" => PresetRole::Brightest,
            "hdr10_default" | "hdr_default" => PresetRole::HdrDefault,
            "abc_default" => PresetRole::AbcDefault,
            other => PresetRole::Literal(other.to_string()),
        }
    }
}

impl std::fmt::Display for PresetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresetRole::Default => write!(f, "default"),
            PresetRole::Brightest => write!(f, "brightest"),
            PresetRole::HdrDefault => write!(f, "hdr10_default"),
            PresetRole::AbcDefault => write!(f, "abc_default"),
            PresetRole::Literal(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for PresetRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Three-way TV setting used for quickstart and motion detection dimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    On,
    Off,
    /// Out of box: whatever the TV ships with
    Oob,
}

impl Toggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Toggle::On => "on",
            Toggle::Off => "off",
            Toggle::Oob => "oob",
        }
    }
}

impl FromStr for Toggle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "on" => Ok(Toggle::On),
            "off" => Ok(Toggle::Off),
            "oob" => Ok(Toggle::Oob),
            other => Err(Error::InvalidCatalog(format!(
                "expected on, off or oob, got '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Toggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backlight setting for a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacklightMode {
    DefaultLevel,
    LowestLevel,
}

impl BacklightMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BacklightMode::DefaultLevel => "default_level",
            BacklightMode::LowestLevel => "lowest_level",
        }
    }
}

impl FromStr for BacklightMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "default_level" => Ok(BacklightMode::DefaultLevel),
            "lowest_level" => Ok(BacklightMode::LowestLevel),
            other => Err(Error::InvalidCatalog(format!(
                "unknown backlight mode '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BacklightMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `kind:argument` directive for the automation controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCommand {
    pub kind: String,
    pub argument: String,
}

impl SpecialCommand {
    pub const PEAK_TEST: &'static str = "peak_test";

    pub fn new(kind: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            argument: argument.into(),
        }
    }

    pub fn peak_end() -> Self {
        Self::new(Self::PEAK_TEST, "end")
    }

    fn is_peak(&self) -> bool {
        self.kind == Self::PEAK_TEST
    }
}

impl std::fmt::Display for SpecialCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.argument)
    }
}

/// Comma separated list of special commands attached to a test row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotation(Vec<SpecialCommand>);

impl Annotation {
    /// Parse `kind:arg,kind:arg`. Blank text is an empty annotation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut commands = Vec::new();
        for part in text.split(',') {
            if part.trim().is_empty() {
                continue;
            }
            let (kind, argument) = part
                .split_once(':')
                .ok_or_else(|| Error::InvalidAnnotation(text.to_string()))?;
            commands.push(SpecialCommand::new(kind.trim(), argument.trim()));
        }
        Ok(Self(commands))
    }

    pub fn commands(&self) -> &[SpecialCommand] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Row opens or continues a peak span (any peak directive except `end`).
    pub fn holds_peak(&self) -> bool {
        self.0.iter().any(|c| c.is_peak() && c.argument != "end")
    }

    pub fn closes_peak(&self) -> bool {
        self.0.iter().any(|c| c.is_peak() && c.argument == "end")
    }

    pub fn prepend(&mut self, command: SpecialCommand) {
        self.0.insert(0, command);
    }
}

impl std::fmt::Display for Annotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, command) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", command)?;
        }
        Ok(())
    }
}

/// Render a number the way the controller expects: whole values carry no
/// fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}
