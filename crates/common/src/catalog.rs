//! Test Catalog
//!
//! Static table of every test kind the planner may name. The source file is
//! stored attribute-major: the first column holds attribute names and every
//! further column is one test identifier. Loading transposes it into one
//! [`TestKindDefinition`] per identifier. The catalog is read-only once
//! loaded.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Annotation, BacklightMode, PresetRole, Toggle};

/// Catalog shipped with the library
pub const BUNDLED_CATALOG: &str = include_str!("../data/test-details.csv");

/// Attribute rows with a fixed meaning. Other rows are carried as extras.
const KNOWN_ATTRIBUTES: &[&str] = &[
    "test_name",
    "test_time",
    "video",
    "preset_picture",
    "abc",
    "backlight",
    "lux",
    "mdd",
    "qs",
    "special_commands",
];

/// Default attributes of one test kind
#[derive(Debug, Clone, Serialize)]
pub struct TestKindDefinition {
    pub name: String,
    /// Seconds
    pub test_time: Option<f64>,
    pub video: Option<String>,
    pub preset_picture: Option<PresetRole>,
    pub abc: Option<bool>,
    pub backlight: Option<BacklightMode>,
    pub lux: Option<f64>,
    pub mdd: Option<Toggle>,
    pub qs: Option<Toggle>,
    pub special_commands: Annotation,
    /// Values for the catalog's extra attribute rows, in row order
    pub extras: Vec<Option<String>>,
}

/// Immutable lookup from identifier to definition
#[derive(Debug, Clone)]
pub struct Catalog {
    tests: HashMap<String, TestKindDefinition>,
    order: Vec<String>,
    extra_columns: Vec<String>,
}

impl Catalog {
    pub fn bundled() -> Result<Self> {
        Self::from_reader(BUNDLED_CATALOG.as_bytes())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(file)?;
        debug!("Loaded {} test kinds from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let ids: Vec<String> = reader
            .headers()?
            .iter()
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect();
        if ids.is_empty() {
            return Err(Error::InvalidCatalog("no test columns".to_string()));
        }

        let mut attributes: HashMap<String, Vec<Option<String>>> = HashMap::new();
        let mut extra_columns = Vec::new();
        for record in reader.records() {
            let record = record?;
            let attribute = record.get(0).unwrap_or_default().trim().to_string();
            if attribute.is_empty() {
                continue;
            }
            if !KNOWN_ATTRIBUTES.contains(&attribute.as_str()) {
                extra_columns.push(attribute.clone());
            }
            let values = record
                .iter()
                .skip(1)
                .map(|v| {
                    let v = v.trim();
                    (!v.is_empty()).then(|| v.to_string())
                })
                .collect();
            if attributes.insert(attribute.clone(), values).is_some() {
                return Err(Error::InvalidCatalog(format!(
                    "attribute '{}' listed twice",
                    attribute
                )));
            }
        }

        let mut tests = HashMap::with_capacity(ids.len());
        for (col, id) in ids.iter().enumerate() {
            let value = |attr: &str| -> Option<&str> {
                attributes
                    .get(attr)
                    .and_then(|values| values.get(col))
                    .and_then(|v| v.as_deref())
            };
            let context = |e: Error| Error::InvalidCatalog(format!("{}: {}", id, e));

            let definition = TestKindDefinition {
                name: id.clone(),
                test_time: value("test_time")
                    .map(|v| parse_number(v, "test_time"))
                    .transpose()
                    .map_err(context)?,
                video: value("video").map(str::to_string),
                preset_picture: value("preset_picture").map(PresetRole::from_token),
                abc: value("abc").map(parse_flag).transpose().map_err(context)?,
                backlight: value("backlight")
                    .map(str::parse)
                    .transpose()
                    .map_err(context)?,
                lux: value("lux")
                    .map(|v| parse_number(v, "lux"))
                    .transpose()
                    .map_err(context)?,
                mdd: value("mdd").map(str::parse).transpose().map_err(context)?,
                qs: value("qs").map(str::parse).transpose().map_err(context)?,
                special_commands: value("special_commands")
                    .map(Annotation::parse)
                    .transpose()
                    .map_err(context)?
                    .unwrap_or_default(),
                extras: extra_columns
                    .iter()
                    .map(|c| value(c).map(str::to_string))
                    .collect(),
            };

            if tests.insert(id.clone(), definition).is_some() {
                return Err(Error::InvalidCatalog(format!("duplicate test '{}'", id)));
            }
        }

        Ok(Self {
            tests,
            order: ids,
            extra_columns,
        })
    }

    /// Look up a test kind. A miss means the catalog and planner disagree.
    pub fn lookup(&self, id: &str) -> Result<&TestKindDefinition> {
        self.tests
            .get(id)
            .ok_or_else(|| Error::UnknownTestKind(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tests.contains_key(id)
    }

    /// Definitions in catalog column order
    pub fn iter(&self) -> impl Iterator<Item = &TestKindDefinition> {
        self.order.iter().filter_map(|id| self.tests.get(id))
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

fn parse_number(value: &str, attribute: &str) -> Result<f64> {
    let number: f64 = value.parse().map_err(|_| {
        Error::InvalidCatalog(format!("{} '{}' is not a number", attribute, value))
    })?;
    if !number.is_finite() || number < 0.0 {
        return Err(Error::InvalidCatalog(format!(
            "{} '{}' is not a finite non-negative number",
            attribute, value
        )));
    }
    Ok(number)
}

pub(crate) fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "y" | "yes" | "true" => Ok(true),
        "off" | "n" | "no" | "false" => Ok(false),
        other => Err(Error::InvalidCatalog(format!(
            "expected on or off, got '{}'",
            other
        ))),
    }
}
