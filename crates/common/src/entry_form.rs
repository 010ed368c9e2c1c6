//! Operator entry form
//!
//! The entry form is a TOML file kept in the model's data folder. It mirrors
//! the two sheets operators already fill in: `[[pps]]` rows naming each
//! preset picture setting and whether ABC is on by default, and a `[misc]`
//! table with the quickstart answers. Validation turns it into an
//! [`OperatorConfig`]; a blank mandatory entry is reported with the exact
//! label the operator sees so the form can be fixed and reloaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Template copied into a data folder that has no entry form yet
pub const ENTRY_FORM_TEMPLATE: &str = include_str!("../data/entry-forms.toml");

/// Default file name of the entry form inside a data folder
pub const ENTRY_FORM_FILE: &str = "entry-forms.toml";

const HAS_QS: &str = "Does TV have QS?";
const QS_DEFAULT_OFF: &str = "Does QS default to Off?";
const QS_WAKE_SECONDS: &str = "If so, how many seconds does it take to wake to HDMI signal?";

/// Preset picture slot on the PPS sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PictureSlot {
    DefaultSdr,
    BrightestSdr,
    Hdr10,
    Hlg,
    Hdr1000,
    Hdr10Plus,
    /// `PPS3` through `PPS12`
    Extra(u8),
}

impl PictureSlot {
    /// Parse the sheet label, e.g. `Default HDR10 PPS` or `PPS7`
    pub fn from_sheet_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Default SDR PPS" => Some(PictureSlot::DefaultSdr),
            "Brightest SDR PPS" => Some(PictureSlot::BrightestSdr),
            "Default HDR10 PPS" => Some(PictureSlot::Hdr10),
            "Default HLG PPS" => Some(PictureSlot::Hlg),
            "Default HDR1000 PPS" => Some(PictureSlot::Hdr1000),
            "Default HDR10+ PPS" => Some(PictureSlot::Hdr10Plus),
            other => (3..=12u8)
                .find(|n| other == format!("PPS{}", n))
                .map(PictureSlot::Extra),
        }
    }

    pub fn sheet_label(&self) -> String {
        match self {
            PictureSlot::DefaultSdr => "Default SDR PPS".to_string(),
            PictureSlot::BrightestSdr => "Brightest SDR PPS".to_string(),
            PictureSlot::Hdr10 => "Default HDR10 PPS".to_string(),
            PictureSlot::Hlg => "Default HLG PPS".to_string(),
            PictureSlot::Hdr1000 => "Default HDR1000 PPS".to_string(),
            PictureSlot::Hdr10Plus => "Default HDR10+ PPS".to_string(),
            PictureSlot::Extra(n) => format!("PPS{}", n),
        }
    }

    /// Label of the ABC answer for this slot
    pub fn abc_label(&self) -> String {
        format!("{} ABC Enabled By Default (Y/N)", self.sheet_label())
    }

    /// Prefix of the test identifiers run on this slot
    pub fn base_test(&self) -> String {
        match self {
            PictureSlot::DefaultSdr => "default".to_string(),
            PictureSlot::BrightestSdr => "brightest".to_string(),
            PictureSlot::Hdr10 => "hdr10".to_string(),
            PictureSlot::Hlg => "hlg".to_string(),
            PictureSlot::Hdr1000 => "hdr1000".to_string(),
            PictureSlot::Hdr10Plus => "hdr10+".to_string(),
            PictureSlot::Extra(n) => format!("pps{}", n),
        }
    }

    /// Preset picture label used by catalog entries for this slot
    pub fn preset_label(&self) -> String {
        match self {
            PictureSlot::DefaultSdr | PictureSlot::BrightestSdr | PictureSlot::Extra(_) => {
                self.base_test()
            }
            _ => format!("{}_default", self.base_test()),
        }
    }
}

/// One bound preset picture setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PictureSetting {
    pub slot: PictureSlot,
    /// Name of the setting in the TV's menu
    pub name: String,
    /// ABC enabled by default on this setting
    pub abc: bool,
}

/// Quickstart answers from the misc sheet
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "present", rename_all = "snake_case")]
pub enum Quickstart {
    Absent,
    Present { default_off: bool, wake_seconds: f64 },
}

/// Validated operator configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorConfig {
    /// Bound settings in sheet order
    pub pictures: Vec<PictureSetting>,
    pub quickstart: Quickstart,
    /// Include the luminance profile capture in the setup block
    pub lum_profile: bool,
}

impl OperatorConfig {
    pub fn picture(&self, slot: PictureSlot) -> Option<&PictureSetting> {
        self.pictures.iter().find(|p| p.slot == slot)
    }

    /// Menu name bound to a catalog preset label (`default`, `pps3`, ...)
    pub fn name_for_label(&self, label: &str) -> Option<&str> {
        self.pictures
            .iter()
            .find(|p| p.slot.preset_label() == label)
            .map(|p| p.name.as_str())
    }

    pub fn has_hdr(&self) -> bool {
        self.picture(PictureSlot::Hdr10).is_some()
    }
}

/// Raw entry form as written by the operator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub pps: Vec<PpsEntry>,
    #[serde(default)]
    pub misc: MiscEntries,
}

/// One row of the PPS sheet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpsEntry {
    pub setting: String,
    pub name: Option<String>,
    pub abc: Option<bool>,
}

/// The misc sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiscEntries {
    pub has_quickstart: Option<bool>,
    pub quickstart_default_off: Option<bool>,
    pub wake_seconds: Option<f64>,
    pub lum_profile: Option<bool>,
}

impl EntryForm {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the form. `form_path` is only used to word errors.
    pub fn validate(&self, form_path: &Path) -> Result<OperatorConfig> {
        let missing = |field: &str| Error::MissingField {
            form: form_path.to_path_buf(),
            field: field.to_string(),
        };

        let mut pictures: Vec<PictureSetting> = Vec::new();
        for entry in &self.pps {
            let slot = PictureSlot::from_sheet_label(&entry.setting).ok_or_else(|| {
                Error::InvalidEntryForm(format!("unknown PPS row '{}'", entry.setting))
            })?;
            let name = match entry.name.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            if pictures.iter().any(|p| p.slot == slot) {
                return Err(Error::InvalidEntryForm(format!(
                    "PPS row '{}' listed twice",
                    entry.setting
                )));
            }
            let abc = entry.abc.ok_or_else(|| missing(&slot.abc_label()))?;
            pictures.push(PictureSetting { slot, name, abc });
        }

        for slot in [PictureSlot::DefaultSdr, PictureSlot::BrightestSdr] {
            if !pictures.iter().any(|p| p.slot == slot) {
                return Err(missing(&slot.sheet_label()));
            }
        }

        let quickstart = match self.misc.has_quickstart {
            None => return Err(missing(HAS_QS)),
            Some(false) => Quickstart::Absent,
            Some(true) => Quickstart::Present {
                default_off: self
                    .misc
                    .quickstart_default_off
                    .ok_or_else(|| missing(QS_DEFAULT_OFF))?,
                wake_seconds: match self.misc.wake_seconds {
                    Some(secs) if secs.is_finite() && secs >= 0.0 => secs,
                    Some(secs) => {
                        return Err(Error::InvalidEntryForm(format!(
                            "{} must be a non-negative number, got {}",
                            QS_WAKE_SECONDS, secs
                        )))
                    }
                    None => return Err(missing(QS_WAKE_SECONDS)),
                },
            },
        };

        Ok(OperatorConfig {
            pictures,
            quickstart,
            lum_profile: self.misc.lum_profile.unwrap_or(true),
        })
    }
}

/// Path of the entry form inside a data folder
pub fn entry_form_path(data_folder: &Path) -> PathBuf {
    data_folder.join(ENTRY_FORM_FILE)
}

/// Copy the template into place when the form does not exist yet.
///
/// Returns `true` when a fresh template was written.
pub fn ensure_entry_form(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, ENTRY_FORM_TEMPLATE).map_err(|e| Error::from_write(e, path))?;
    info!("Wrote entry form template to {}", path.display());
    Ok(true)
}

/// Read and validate an entry form
pub fn load_operator_config(path: &Path) -> Result<OperatorConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = EntryForm::parse(&content)?.validate(path)?;
    debug!(
        "Entry form {}: {} preset pictures, quickstart {:?}",
        path.display(),
        config.pictures.len(),
        config.quickstart
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORM: &str = r#"
[[pps]]
setting = "Default SDR PPS"
name = "Standard"
abc = true

[[pps]]
setting = "Brightest SDR PPS"
name = "Vivid"
abc = false

[[pps]]
setting = "Default HDR10 PPS"
name = "  "

[[pps]]
setting = "PPS3"
name = "Cinema"
abc = false

[misc]
has_quickstart = true
quickstart_default_off = true
wake_seconds = 12
"#;

    fn validate(content: &str) -> Result<OperatorConfig> {
        EntryForm::parse(content)?.validate(Path::new("entry-forms.toml"))
    }

    #[test]
    fn test_validate_full_form() {
        let config = validate(FORM).unwrap();
        assert_eq!(config.pictures.len(), 3);
        assert_eq!(config.pictures[0].slot, PictureSlot::DefaultSdr);
        assert!(config.pictures[0].abc);
        assert!(!config.pictures[1].abc);
        assert_eq!(config.pictures[2].slot, PictureSlot::Extra(3));
        assert!(!config.has_hdr());
        assert!(config.lum_profile);
        assert_eq!(
            config.quickstart,
            Quickstart::Present {
                default_off: true,
                wake_seconds: 12.0
            }
        );
        assert_eq!(config.name_for_label("pps3"), Some("Cinema"));
        assert_eq!(config.name_for_label("brightest"), Some("Vivid"));
    }

    #[test]
    fn test_missing_brightest_names_sheet_label() {
        let form = r#"
[[pps]]
setting = "Default SDR PPS"
name = "Standard"
abc = false

[[pps]]
setting = "Brightest SDR PPS"

[misc]
has_quickstart = false
"#;
        match validate(form) {
            Err(Error::MissingField { field, .. }) => assert_eq!(field, "Brightest SDR PPS"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_quickstart_fields_required_when_present() {
        let form = r#"
[[pps]]
setting = "Default SDR PPS"
name = "Standard"
abc = false

[[pps]]
setting = "Brightest SDR PPS"
name = "Vivid"
abc = false

[misc]
has_quickstart = true
quickstart_default_off = false
"#;
        match validate(form) {
            Err(Error::MissingField { field, .. }) => assert_eq!(field, QS_WAKE_SECONDS),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_misc_is_missing() {
        let form = r#"
[[pps]]
setting = "Default SDR PPS"
name = "Standard"
abc = false

[[pps]]
setting = "Brightest SDR PPS"
name = "Vivid"
abc = false
"#;
        assert!(matches!(
            validate(form),
            Err(Error::MissingField { ref field, .. }) if field == HAS_QS
        ));
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let form = "[[pps]]\nsetting = \"PPS13\"\nname = \"x\"\n";
        assert!(matches!(validate(form), Err(Error::InvalidEntryForm(_))));
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(PictureSlot::Hdr10.preset_label(), "hdr10_default");
        assert_eq!(PictureSlot::Hdr10Plus.base_test(), "hdr10+");
        assert_eq!(PictureSlot::Extra(12).preset_label(), "pps12");
        assert_eq!(
            PictureSlot::from_sheet_label("Default HDR10+ PPS"),
            Some(PictureSlot::Hdr10Plus)
        );
        assert_eq!(PictureSlot::from_sheet_label("PPS2"), None);
        assert_eq!(PictureSlot::from_sheet_label("PPS10"), Some(PictureSlot::Extra(10)));
        assert_eq!(PictureSlot::from_sheet_label("PPS03"), None);
        assert_eq!(PictureSlot::from_sheet_label("PPS+3"), None);
    }

    #[test]
    fn test_named_setting_needs_abc_answer() {
        let form = r#"
[[pps]]
setting = "Default SDR PPS"
name = "Standard"
abc = true

[[pps]]
setting = "Brightest SDR PPS"
name = "Vivid"
abc = false

[[pps]]
setting = "PPS3"
name = "Cinema"

[[pps]]
setting = "PPS4"

[misc]
has_quickstart = false
"#;
        match validate(form) {
            Err(Error::MissingField { field, .. }) => {
                assert_eq!(field, "PPS3 ABC Enabled By Default (Y/N)")
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_wake_seconds_must_be_finite() {
        let form = FORM.replace("wake_seconds = 12", "wake_seconds = inf");
        assert!(matches!(validate(&form), Err(Error::InvalidEntryForm(_))));
        let form = FORM.replace("wake_seconds = 12", "wake_seconds = nan");
        assert!(matches!(validate(&form), Err(Error::InvalidEntryForm(_))));
    }

    #[test]
    fn test_template_parses_and_needs_names() {
        let form = EntryForm::parse(ENTRY_FORM_TEMPLATE).unwrap();
        assert_eq!(form.pps.len(), 16);
        assert!(matches!(
            form.validate(Path::new("entry-forms.toml")),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn test_ensure_entry_form_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = entry_form_path(dir.path());
        assert!(ensure_entry_form(&path).unwrap());
        assert!(!ensure_entry_form(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), ENTRY_FORM_TEMPLATE);
    }
}
