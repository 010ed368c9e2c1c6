//! Sequence Planner
//!
//! Builds the ordered list of test identifiers for a run from the operator's
//! configuration alone. The planner never looks at catalog attributes; the
//! resolver checks that every identifier exists.
//!
//! Block order is fixed: setup, baseline, lux sweep, power state.

use serde::Serialize;
use tracing::{debug, info};

use crate::entry_form::{OperatorConfig, PictureSlot};
use crate::types::TestKind;

/// Base tests run as baseline and so never repeated bare in the sweep.
/// `hdr` matches no slot today; it is kept so an `hdr` base test is skipped.
const BASELINE_BASES: &[&str] = &["default", "brightest", "hdr"];

/// Lighting conditions in sweep order
pub const LUX_SWEEP: [LuxCondition; 6] = [
    LuxCondition::Unlit,
    LuxCondition::LowBacklight,
    LuxCondition::Lux(100),
    LuxCondition::Lux(35),
    LuxCondition::Lux(12),
    LuxCondition::Lux(3),
];

/// One lighting condition of the lux sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuxCondition {
    /// No ambient light source and default backlight
    Unlit,
    LowBacklight,
    Lux(u32),
}

/// A planned test and its prompt family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTest {
    pub name: String,
    pub kind: TestKind,
}

impl PlannedTest {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = TestKind::classify(&name);
        Self { name, kind }
    }
}

/// Ordered test identifiers; order is execution order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlannedSequence(Vec<PlannedTest>);

impl PlannedSequence {
    pub fn tests(&self) -> &[PlannedTest] {
        &self.0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, name: impl Into<String>) {
        self.0.push(PlannedTest::new(name));
    }
}

impl FromIterator<PlannedTest> for PlannedSequence {
    fn from_iter<I: IntoIterator<Item = PlannedTest>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PlannedSequence {
    type Item = PlannedTest;
    type IntoIter = std::vec::IntoIter<PlannedTest>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Plan the full run.
///
/// Mandatory bindings are enforced when the entry form is validated, so an
/// [`OperatorConfig`] is always plannable.
pub fn plan(config: &OperatorConfig) -> PlannedSequence {
    let mut sequence = PlannedSequence::default();

    let mut ccf_roles = vec![
        PictureSlot::DefaultSdr.preset_label(),
        PictureSlot::BrightestSdr.preset_label(),
    ];
    if config.has_hdr() {
        ccf_roles.push(PictureSlot::Hdr10.preset_label());
    }
    setup_tests(&mut sequence, &ccf_roles, config.lum_profile);

    // HDR baseline stays out; HDR10 is covered by its ccf and sweep tests.
    for name in ["default", "default_3bar", "brightest", "brightest_10%sdr"] {
        sequence.push(name);
    }

    for condition in LUX_SWEEP {
        for picture in &config.pictures {
            if let Some(name) = sweep_test(&picture.slot.base_test(), picture.abc, condition) {
                sequence.push(name);
            }
        }
    }

    for name in [
        "standby",
        "waketime",
        "standby_echo",
        "echo_waketime",
        "standby_google",
        "google_waketime",
    ] {
        sequence.push(name);
    }

    info!("Planned {} tests", sequence.len());
    debug!("Test order: {:?}", sequence.names().collect::<Vec<_>>());
    sequence
}

/// Reference ccf tests, screen config, camera ccf tests, then profiling.
fn setup_tests(sequence: &mut PlannedSequence, ccf_roles: &[String], lum_profile: bool) {
    for role in ccf_roles {
        sequence.push(format!("ref_ccf_{}", role));
    }
    sequence.push("screen_config");
    for role in ccf_roles {
        sequence.push(format!("camera_ccf_{}", role));
    }
    if lum_profile {
        sequence.push("lum_profile");
    }
    sequence.push("stabilization");
}

/// Identifier for a base test under one lighting condition, if it runs.
///
/// Settings without ABC run unlit and at lowest backlight; settings with ABC
/// run at each lux level instead.
fn sweep_test(base: &str, abc: bool, condition: LuxCondition) -> Option<String> {
    match condition {
        LuxCondition::Unlit => {
            (!abc && !BASELINE_BASES.contains(&base)).then(|| base.to_string())
        }
        LuxCondition::LowBacklight => (!abc).then(|| format!("{}_low_backlight", base)),
        LuxCondition::Lux(lux) => abc.then(|| format!("{}_{}", base, lux)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_form::{PictureSetting, Quickstart};

    fn picture(slot: PictureSlot, name: &str, abc: bool) -> PictureSetting {
        PictureSetting {
            slot,
            name: name.to_string(),
            abc,
        }
    }

    fn config(pictures: Vec<PictureSetting>) -> OperatorConfig {
        OperatorConfig {
            pictures,
            quickstart: Quickstart::Absent,
            lum_profile: true,
        }
    }

    fn names(sequence: &PlannedSequence) -> Vec<&str> {
        sequence.names().collect()
    }

    #[test]
    fn test_minimal_plan_order() {
        let sequence = plan(&config(vec![
            picture(PictureSlot::DefaultSdr, "Mode A", false),
            picture(PictureSlot::BrightestSdr, "Mode B", false),
        ]));
        assert_eq!(
            names(&sequence),
            [
                "ref_ccf_default",
                "ref_ccf_brightest",
                "screen_config",
                "camera_ccf_default",
                "camera_ccf_brightest",
                "lum_profile",
                "stabilization",
                "default",
                "default_3bar",
                "brightest",
                "brightest_10%sdr",
                "default_low_backlight",
                "brightest_low_backlight",
                "standby",
                "waketime",
                "standby_echo",
                "echo_waketime",
                "standby_google",
                "google_waketime",
            ]
        );
        assert!(!names(&sequence).iter().any(|n| n.contains("hdr")));
    }

    #[test]
    fn test_hdr_adds_ccf_role() {
        let sequence = plan(&config(vec![
            picture(PictureSlot::DefaultSdr, "Standard", false),
            picture(PictureSlot::BrightestSdr, "Vivid", false),
            picture(PictureSlot::Hdr10, "HDR Standard", false),
        ]));
        let names = names(&sequence);
        assert_eq!(
            &names[..7],
            [
                "ref_ccf_default",
                "ref_ccf_brightest",
                "ref_ccf_hdr10_default",
                "screen_config",
                "camera_ccf_default",
                "camera_ccf_brightest",
                "camera_ccf_hdr10_default",
            ]
        );
        // hdr10 is not a baseline base, so it runs bare in the unlit sweep
        assert!(names.contains(&"hdr10"));
        assert!(names.contains(&"hdr10_low_backlight"));
    }

    #[test]
    fn test_abc_partitions_lux_sweep() {
        let sequence = plan(&config(vec![
            picture(PictureSlot::DefaultSdr, "Standard", true),
            picture(PictureSlot::BrightestSdr, "Vivid", false),
            picture(PictureSlot::Extra(3), "Cinema", false),
            picture(PictureSlot::Extra(4), "Sports", true),
        ]));
        let names = names(&sequence);
        let sweep: Vec<&str> = names[11..names.len() - 6].to_vec();
        assert_eq!(
            sweep,
            [
                "pps3",
                "brightest_low_backlight",
                "pps3_low_backlight",
                "default_100",
                "pps4_100",
                "default_35",
                "pps4_35",
                "default_12",
                "pps4_12",
                "default_3",
                "pps4_3",
            ]
        );
    }

    #[test]
    fn test_lum_profile_optional() {
        let mut cfg = config(vec![
            picture(PictureSlot::DefaultSdr, "Standard", false),
            picture(PictureSlot::BrightestSdr, "Vivid", false),
        ]);
        cfg.lum_profile = false;
        let sequence = plan(&cfg);
        assert!(!names(&sequence).contains(&"lum_profile"));
        assert_eq!(sequence.tests()[5].kind, TestKind::Stabilization);
    }

    #[test]
    fn test_screen_config_between_ccf_blocks() {
        let sequence = plan(&config(vec![
            picture(PictureSlot::DefaultSdr, "Standard", false),
            picture(PictureSlot::BrightestSdr, "Vivid", true),
            picture(PictureSlot::Hdr10, "HDR", true),
        ]));
        let names = names(&sequence);
        let config_positions: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == "screen_config")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(config_positions.len(), 1);
        let at = config_positions[0];
        for (i, name) in names.iter().enumerate() {
            if name.starts_with("ref_ccf_") {
                assert!(i < at);
            }
            if name.starts_with("camera_ccf_") {
                assert!(i > at);
            }
        }
    }

    #[test]
    fn test_kinds_assigned_eagerly() {
        let sequence = plan(&config(vec![
            picture(PictureSlot::DefaultSdr, "Standard", false),
            picture(PictureSlot::BrightestSdr, "Vivid", false),
        ]));
        let kinds: Vec<TestKind> = sequence.tests()[sequence.len() - 6..]
            .iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                TestKind::Standby,
                TestKind::Waketime,
                TestKind::Standby,
                TestKind::Waketime,
                TestKind::Standby,
                TestKind::Waketime,
            ]
        );
    }
}
