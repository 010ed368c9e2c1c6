//! Operator prompt text
//!
//! Prompts are shown by the automation controller, which reads each one
//! from a single CSV cell and expands the literal `\n` sequences into line
//! breaks. Every prompt is assembled from up to three parts: a heading, an
//! instructions block, and a summary of the settings the test runs under.

use std::collections::HashMap;

use crate::resolver::ResolvedRow;
use crate::types::{format_number, Toggle};

/// Line break as understood by the controller
pub const NL: &str = "\\n";

/// Second prompt of a wake time test
pub const WAKETIME_RESPONSIVE: &str =
    "As soon as the TV becomes responsive to input press the OK button.";

/// Stabilization retry limits sent alongside its prompt
pub const STAB_WAIT_SECS: u32 = 300;
pub const STAB_MAX_ITER: u32 = 6;
pub const STAB_MIN_ITER: u32 = 2;

const RULE_WIDTH: usize = 80;

/// Human readable names for setting columns and their values.
///
/// Lookups that miss return the raw text unchanged.
#[derive(Debug, Clone)]
pub struct SettingLabels {
    columns: HashMap<String, String>,
    values: HashMap<String, String>,
}

impl SettingLabels {
    pub fn standard() -> Self {
        let columns = [
            ("tag", "Test Number"),
            ("test_name", "Test Name"),
            ("test_time", "Test Duration (Seconds)"),
            ("video", "Video Clip"),
            ("preset_picture", "Preset Picture Setting"),
            ("abc", "Automatic Brightness Control (ABC)"),
            ("backlight", "Backlight Setting"),
            ("lux", "Illuminance Level (Lux)"),
            ("mdd", "Motion Detection Dimming (MDD)"),
            ("qs", "QuickStart"),
        ];
        let values = [
            ("sdr", "IEC SDR"),
            ("clasp_hdr", "CLASP HDR"),
            ("dots", "Dots Pattern"),
            ("lum_sdr", "Luminance Profile"),
            ("default_level", "Default Level"),
            ("lowest_level", "Lowest Level"),
            ("oob", "Default Out of Box Setting"),
            ("off", "Off"),
            ("on", "On"),
        ];
        Self {
            columns: to_map(&columns),
            values: to_map(&values),
        }
    }

    pub fn with_value(mut self, raw: impl Into<String>, label: impl Into<String>) -> Self {
        self.values.insert(raw.into(), label.into());
        self
    }

    pub fn column<'a>(&'a self, key: &'a str) -> &'a str {
        self.columns.get(key).map_or(key, String::as_str)
    }

    pub fn value<'a>(&'a self, raw: &'a str) -> &'a str {
        self.values.get(raw).map_or(raw, String::as_str)
    }
}

impl Default for SettingLabels {
    fn default() -> Self {
        Self::standard()
    }
}

fn to_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A setting column shown to the operator, in column order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Setting {
    Video,
    PresetPicture,
    Abc,
    Backlight,
    Lux,
    Mdd,
    Qs,
}

impl Setting {
    const ALL: [Setting; 7] = [
        Setting::Video,
        Setting::PresetPicture,
        Setting::Abc,
        Setting::Backlight,
        Setting::Lux,
        Setting::Mdd,
        Setting::Qs,
    ];

    fn column(&self) -> &'static str {
        match self {
            Setting::Video => "video",
            Setting::PresetPicture => "preset_picture",
            Setting::Abc => "abc",
            Setting::Backlight => "backlight",
            Setting::Lux => "lux",
            Setting::Mdd => "mdd",
            Setting::Qs => "qs",
        }
    }

    fn raw(&self, row: &ResolvedRow) -> Option<String> {
        match self {
            Setting::Video => row.video.clone(),
            Setting::PresetPicture => row.preset_picture.clone(),
            Setting::Abc => row.abc.map(|on| if on { "on" } else { "off" }.to_string()),
            Setting::Backlight => row.backlight.map(|b| b.as_str().to_string()),
            Setting::Lux => row.lux.map(|lux| format_number(lux.trunc())),
            Setting::Mdd => row.mdd.map(|m| m.as_str().to_string()),
            Setting::Qs => row.qs.map(|q| q.as_str().to_string()),
        }
    }
}

fn rule() -> String {
    "-".repeat(RULE_WIDTH)
}

fn clip_label<'a>(row: &'a ResolvedRow, labels: &'a SettingLabels) -> &'a str {
    row.video.as_deref().map_or("test", |v| labels.value(v))
}

/// Test name, tag and duration
pub fn heading(row: &ResolvedRow) -> String {
    let mut message = format!("Test Name: {}{NL}Test Tag: {}{NL}", row.test_name, row.tag);
    if let Some(time) = row.test_time {
        message += &format!("Test Time (seconds): {}{NL}{NL}", format_number(time.trunc()));
    }
    message
}

/// Instructions block.
///
/// With a previous row only settings that changed are listed; without one
/// every present setting is.
pub fn instructions(
    row: &ResolvedRow,
    previous: Option<&ResolvedRow>,
    extra: Option<&str>,
    countdown: bool,
    labels: &SettingLabels,
) -> String {
    let mut message = format!("{}{NL}Instructions:{NL}{NL}", rule());
    if let Some(extra) = extra {
        message += extra;
    }

    for setting in Setting::ALL {
        let Some(value) = setting.raw(row) else {
            continue;
        };
        if previous.and_then(|p| setting.raw(p)).as_ref() == Some(&value) {
            continue;
        }
        if let Some(directive) = change_directive(setting, &value, row, labels) {
            message += &directive;
            message += NL;
        }
    }

    if countdown {
        message += &format!(
            "* When ready begin the {} clip and press the OK button when the test clip content begins at the end of the countdown.{NL}{NL}",
            clip_label(row, labels)
        );
    }
    message
}

fn change_directive(
    setting: Setting,
    value: &str,
    row: &ResolvedRow,
    labels: &SettingLabels,
) -> Option<String> {
    let change = |title: &str| format!("* Change the {} setting to {}", title, labels.value(value));
    match setting {
        Setting::PresetPicture => Some(format!("* Change the preset picture setting to {}", value)),
        Setting::Abc => Some(change("automatic brightness control (ABC)")),
        Setting::Qs => Some(change("quickstart (QS)")),
        Setting::Mdd => Some(change("motion detection dimming (MDD)") + " (if applicable)"),
        Setting::Lux => Some(format!("* Adjust the illuminance level to {} lux", value)),
        Setting::Video => Some(format!(
            "* Change the video clip to {}",
            clip_label(row, labels)
        )),
        Setting::Backlight if value == "lowest_level" => Some(
            "* Lower the backlight setting to the lowest possible level and record this level."
                .to_string(),
        ),
        Setting::Backlight => None,
    }
}

/// Every present setting on the row, changed or not
pub fn settings_summary(row: &ResolvedRow, labels: &SettingLabels) -> String {
    let mut message = format!(
        "{}{NL}The conditions for the current test should be:{NL}{NL}",
        rule()
    );
    for setting in Setting::ALL {
        if let Some(value) = setting.raw(row) {
            message += &format!(
                "    {} - {}",
                labels.column(setting.column()),
                labels.value(&value)
            );
            if setting == Setting::Mdd {
                message += " (if applicable)";
            }
            message += NL;
        }
    }
    message
}

/// Prompt for an ordinary measurement
pub fn test_message(
    row: &ResolvedRow,
    previous: Option<&ResolvedRow>,
    labels: &SettingLabels,
) -> String {
    heading(row) + &instructions(row, previous, None, true, labels) + &settings_summary(row, labels)
}

pub fn screen_config_message(row: &ResolvedRow, labels: &SettingLabels) -> String {
    let extra = format!("* Next we will configure the camera for the remaining tests.{NL}");
    heading(row)
        + &instructions(row, None, Some(&extra), false, labels)
        + &format!("Press OK when the clip is on the screen with no overlay{NL}{NL}")
        + &settings_summary(row, labels)
}

pub fn lum_profile_message(row: &ResolvedRow, labels: &SettingLabels) -> String {
    let extra = format!("* Next we will capture the luminance profile of the TV.{NL}");
    heading(row) + &instructions(row, None, Some(&extra), true, labels) + &settings_summary(row, labels)
}

pub fn stabilization_message(row: &ResolvedRow, labels: &SettingLabels) -> String {
    let extra = format!(
        "* This test repeats until two consecutive tests have average power within 2% of each other (minimum {} iterations, maximum {} iterations).{NL}",
        STAB_MIN_ITER, STAB_MAX_ITER
    );
    heading(row) + &instructions(row, None, Some(&extra), true, labels) + &settings_summary(row, labels)
}

pub fn standby_message(row: &ResolvedRow, labels: &SettingLabels) -> String {
    let mut message = heading(row);
    message += &format!("{}{NL}Instructions:{NL}{NL}", rule());
    message += &format!("* The next test will be a standby test.{NL}");
    if row.test_name.contains("echo") {
        message += &format!("* Connect the TV to the Amazon Echo{NL}");
    }
    if row.test_name.contains("google") {
        message += &format!("* Connect the TV to the Google Home{NL}");
    }
    if let Some(qs) = row.qs {
        message += &format!("* Ensure that QuickStart is set to {}", labels.value(qs.as_str()));
        if qs == Toggle::Off {
            message += " (if applicable)";
        }
        message += &format!(".{NL}");
    }
    message += "* Power down the TV using the remote and press the OK button to begin test.";
    message
}

/// First prompt of a wake time test
pub fn waketime_start_message(row: &ResolvedRow) -> String {
    let mut message = heading(row);
    message += &format!("{}{NL}Instructions:{NL}{NL}", rule());
    message += &format!(
        "* Now that the standby test is complete we are going to measure wake time.{NL}"
    );
    message += &format!(
        "* Press the OK button at the same time as you press the power button to turn on the television.{NL}"
    );
    message += "* A new message will appear asking you to press another button as soon as the TV has become responsive to input.";
    message
}
