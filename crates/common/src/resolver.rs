//! Sequence Resolver
//!
//! Expands a [`PlannedSequence`] into fully resolved rows: catalog defaults
//! copied per test, operator names substituted for preset picture roles,
//! out-of-box quickstart settled, peak spans closed, tags assigned.

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{Catalog, TestKindDefinition};
use crate::entry_form::{OperatorConfig, PictureSlot, Quickstart};
use crate::error::{Error, Result};
use crate::planner::{PlannedSequence, PlannedTest};
use crate::types::{Annotation, BacklightMode, PresetRole, SpecialCommand, TestKind, Toggle};

/// Wake time at or above which quickstart counts as a slow wake
pub const QS_WAKE_THRESHOLD_SECS: f64 = 10.0;

/// One row of the test sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRow {
    /// 1-based position in the sequence
    pub tag: u32,
    pub test_name: String,
    #[serde(skip)]
    pub kind: TestKind,
    pub test_time: Option<f64>,
    pub video: Option<String>,
    pub preset_picture: Option<String>,
    pub abc: Option<bool>,
    pub backlight: Option<BacklightMode>,
    pub lux: Option<f64>,
    pub mdd: Option<Toggle>,
    pub qs: Option<Toggle>,
    pub special_commands: Annotation,
    /// Values for [`ResolvedSequence::extra_columns`]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<Option<String>>,
}

impl ResolvedRow {
    fn from_definition(test: &PlannedTest, definition: &TestKindDefinition) -> Self {
        Self {
            tag: 0,
            test_name: test.name.clone(),
            kind: test.kind,
            test_time: definition.test_time,
            video: definition.video.clone(),
            preset_picture: None,
            abc: definition.abc,
            backlight: definition.backlight,
            lux: definition.lux,
            mdd: definition.mdd,
            qs: definition.qs,
            special_commands: definition.special_commands.clone(),
            extras: definition.extras.clone(),
        }
    }
}

/// Fully resolved test sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolvedSequence {
    pub rows: Vec<ResolvedRow>,
    /// Catalog attributes beyond the fixed columns, written after them
    pub extra_columns: Vec<String>,
}

impl ResolvedSequence {
    pub fn new(rows: Vec<ResolvedRow>, extra_columns: Vec<String>) -> Self {
        Self {
            rows: assign_tags(bracket_peaks(rows)),
            extra_columns,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolve every planned test against the catalog and operator bindings
pub fn resolve(
    planned: PlannedSequence,
    catalog: &Catalog,
    config: &OperatorConfig,
) -> Result<ResolvedSequence> {
    let rows = planned
        .into_iter()
        .map(|test| {
            let definition = catalog.lookup(&test.name)?;
            let mut row = ResolvedRow::from_definition(&test, definition);
            row.preset_picture = definition
                .preset_picture
                .as_ref()
                .map(|role| resolve_role(role, config, &test.name))
                .transpose()?;
            row.qs = row.qs.map(|mode| resolve_quickstart(mode, &config.quickstart));
            Ok(row)
        })
        .collect::<Result<Vec<_>>>()?;

    let sequence = ResolvedSequence::new(rows, catalog.extra_columns().to_vec());
    info!("Resolved {} test rows", sequence.len());
    Ok(sequence)
}

/// Substitute the operator's menu name for a preset picture role
pub fn resolve_role(role: &PresetRole, config: &OperatorConfig, test: &str) -> Result<String> {
    let slot = match role {
        PresetRole::Default | PresetRole::AbcDefault => PictureSlot::DefaultSdr,
        PresetRole::Brightest => PictureSlot::BrightestSdr,
        PresetRole::HdrDefault => PictureSlot::Hdr10,
        PresetRole::Literal(label) => {
            return Ok(config
                .name_for_label(label)
                .map_or_else(|| label.clone(), str::to_string));
        }
    };
    config
        .picture(slot)
        .map(|p| p.name.clone())
        .ok_or_else(|| Error::UnresolvedRole {
            test: test.to_string(),
            role: role.to_string(),
        })
}

/// Settle an out-of-box quickstart setting.
///
/// A TV that defaults quickstart off and wakes slowly is tested with it on;
/// any other quickstart TV is tested with it off. Without quickstart the
/// catalog value is kept.
pub fn resolve_quickstart(mode: Toggle, quickstart: &Quickstart) -> Toggle {
    match (mode, quickstart) {
        (
            Toggle::Oob,
            Quickstart::Present {
                default_off,
                wake_seconds,
            },
        ) => {
            if *default_off && *wake_seconds >= QS_WAKE_THRESHOLD_SECS {
                Toggle::On
            } else {
                Toggle::Off
            }
        }
        (mode, _) => mode,
    }
}

/// Close each peak span on the row right after it.
///
/// One forward pass carrying whether the previous row held a peak
/// directive. A row already carrying `peak_test:end` is left alone, so a
/// second pass over the output changes nothing.
pub fn bracket_peaks(rows: Vec<ResolvedRow>) -> Vec<ResolvedRow> {
    rows.into_iter()
        .scan(false, |prev_peak, mut row| {
            let peak = row.special_commands.holds_peak();
            if *prev_peak && !peak && !row.special_commands.closes_peak() {
                debug!("Closing peak span at {}", row.test_name);
                row.special_commands.prepend(SpecialCommand::peak_end());
            }
            *prev_peak = peak;
            Some(row)
        })
        .collect()
}

fn assign_tags(rows: Vec<ResolvedRow>) -> Vec<ResolvedRow> {
    rows.into_iter()
        .zip(1u32..)
        .map(|(row, tag)| ResolvedRow { tag, ..row })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_form::PictureSetting;
    use crate::planner::plan;

    fn config(quickstart: Quickstart) -> OperatorConfig {
        OperatorConfig {
            pictures: vec![
                PictureSetting {
                    slot: PictureSlot::DefaultSdr,
                    name: "Mode A".to_string(),
                    abc: false,
                },
                PictureSetting {
                    slot: PictureSlot::BrightestSdr,
                    name: "Mode B".to_string(),
                    abc: false,
                },
            ],
            quickstart,
            lum_profile: true,
        }
    }

    fn row(name: &str, special: &str) -> ResolvedRow {
        ResolvedRow {
            tag: 0,
            test_name: name.to_string(),
            kind: TestKind::classify(name),
            test_time: None,
            video: None,
            preset_picture: None,
            abc: None,
            backlight: None,
            lux: None,
            mdd: None,
            qs: None,
            special_commands: Annotation::parse(special).unwrap(),
            extras: vec![],
        }
    }

    fn specials(rows: &[ResolvedRow]) -> Vec<String> {
        rows.iter().map(|r| r.special_commands.to_string()).collect()
    }

    #[test]
    fn test_resolve_minimal_config() {
        let cfg = config(Quickstart::Absent);
        let catalog = Catalog::bundled().unwrap();
        let sequence = resolve(plan(&cfg), &catalog, &cfg).unwrap();

        let tags: Vec<u32> = sequence.rows.iter().map(|r| r.tag).collect();
        assert_eq!(tags, (1..=sequence.len() as u32).collect::<Vec<_>>());

        let default = sequence.rows.iter().find(|r| r.test_name == "default").unwrap();
        assert_eq!(default.preset_picture.as_deref(), Some("Mode A"));
        let brightest = sequence
            .rows
            .iter()
            .find(|r| r.test_name == "brightest_low_backlight")
            .unwrap();
        assert_eq!(brightest.preset_picture.as_deref(), Some("Mode B"));
        assert_eq!(brightest.backlight, Some(BacklightMode::LowestLevel));

        // no quickstart: catalog value survives
        let standby = sequence.rows.iter().find(|r| r.test_name == "standby").unwrap();
        assert_eq!(standby.qs, Some(Toggle::Oob));
    }

    #[test]
    fn test_peak_span_closed_on_following_row() {
        let cfg = config(Quickstart::Absent);
        let catalog = Catalog::bundled().unwrap();
        let sequence = resolve(plan(&cfg), &catalog, &cfg).unwrap();
        let brightest = sequence.rows.iter().find(|r| r.test_name == "brightest").unwrap();
        assert_eq!(brightest.special_commands.to_string(), "peak_test:end");
        let after_10 = &sequence.rows[brightest.tag as usize + 1];
        assert_eq!(after_10.special_commands.to_string(), "peak_test:end");
    }

    #[test]
    fn test_quickstart_resolution() {
        let slow = Quickstart::Present {
            default_off: true,
            wake_seconds: 12.0,
        };
        let fast = Quickstart::Present {
            default_off: true,
            wake_seconds: 5.0,
        };
        let default_on = Quickstart::Present {
            default_off: false,
            wake_seconds: 12.0,
        };
        assert_eq!(resolve_quickstart(Toggle::Oob, &slow), Toggle::On);
        assert_eq!(resolve_quickstart(Toggle::Oob, &fast), Toggle::Off);
        assert_eq!(resolve_quickstart(Toggle::Oob, &default_on), Toggle::Off);
        assert_eq!(resolve_quickstart(Toggle::Oob, &Quickstart::Absent), Toggle::Oob);
        assert_eq!(resolve_quickstart(Toggle::Off, &slow), Toggle::Off);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let edge = Quickstart::Present {
            default_off: true,
            wake_seconds: QS_WAKE_THRESHOLD_SECS,
        };
        assert_eq!(resolve_quickstart(Toggle::Oob, &edge), Toggle::On);
    }

    #[test]
    fn test_unbound_hdr_role_fails() {
        let cfg = config(Quickstart::Absent);
        let err = resolve_role(&PresetRole::HdrDefault, &cfg, "ref_ccf_hdr10_default").unwrap_err();
        assert!(matches!(
            err,
            Error::UnresolvedRole { ref test, ref role }
                if test == "ref_ccf_hdr10_default" && role == "hdr10_default"
        ));
    }

    #[test]
    fn test_literal_role_passes_through() {
        let cfg = config(Quickstart::Absent);
        let literal = PresetRole::Literal("Game".to_string());
        assert_eq!(resolve_role(&literal, &cfg, "x").unwrap(), "Game");
        assert_eq!(
            resolve_role(&PresetRole::AbcDefault, &cfg, "default_100").unwrap(),
            "Mode A"
        );
    }

    #[test]
    fn test_unknown_test_kind_is_fatal() {
        let cfg = config(Quickstart::Absent);
        let catalog = Catalog::bundled().unwrap();
        let planned: PlannedSequence = vec![PlannedTest::new("default"), PlannedTest::new("nope")]
            .into_iter()
            .collect();
        assert!(matches!(
            resolve(planned, &catalog, &cfg),
            Err(Error::UnknownTestKind(ref id)) if id == "nope"
        ));
    }

    #[test]
    fn test_bracket_sets_end_on_empty_row() {
        let rows = bracket_peaks(vec![row("a", "peak_test:start"), row("b", "")]);
        assert_eq!(specials(&rows), ["peak_test:start", "peak_test:end"]);
    }

    #[test]
    fn test_bracket_prepends_to_existing() {
        let rows = bracket_peaks(vec![
            row("a", "peak_test:start"),
            row("b", "peak_test:start"),
            row("c", "lights:dim"),
            row("d", ""),
        ]);
        assert_eq!(
            specials(&rows),
            ["peak_test:start", "peak_test:start", "peak_test:end,lights:dim", ""]
        );
    }

    #[test]
    fn test_bracket_is_idempotent() {
        let once = bracket_peaks(vec![
            row("a", "peak_test:start"),
            row("b", ""),
            row("c", ""),
            row("d", "peak_test:start"),
            row("e", "x:y"),
        ]);
        let twice = bracket_peaks(once.clone());
        assert_eq!(once, twice);
        assert_eq!(specials(&twice), ["peak_test:start", "peak_test:end", "", "peak_test:start", "peak_test:end,x:y"]);
    }

    #[test]
    fn test_tags_contiguous_from_one() {
        let sequence = ResolvedSequence::new(vec![row("a", ""), row("b", ""), row("c", "")], vec![]);
        let tags: Vec<u32> = sequence.rows.iter().map(|r| r.tag).collect();
        assert_eq!(tags, [1, 2, 3]);
    }
}
