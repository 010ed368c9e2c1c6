//! PowerSeq E2E Test Framework
//!
//! Fixtures that drive the whole pipeline against a throwaway data folder:
//! an entry form builder, a temporary data folder, and a helper that runs
//! load → plan → resolve → compile → write the way the CLI does.

pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use powerseq_common::entry_form::{
    entry_form_path, EntryForm, MiscEntries, PpsEntry,
};
use powerseq_common::{
    load_operator_config, ArtifactWriter, Catalog, CommandSequence, ResolvedSequence,
    SettingLabels, WrittenArtifacts,
};

pub use error::{E2eError, E2eResult};

/// Builds entry form TOML the way an operator would fill it in
#[derive(Debug, Clone, Default)]
pub struct EntryFormBuilder {
    form: EntryForm,
}

impl EntryFormBuilder {
    /// Default and brightest SDR bound, ABC off, no quickstart
    pub fn minimal() -> Self {
        Self::default()
            .picture("Default SDR PPS", "Mode A", false)
            .picture("Brightest SDR PPS", "Mode B", false)
            .no_quickstart()
    }

    pub fn picture(mut self, setting: &str, name: &str, abc: bool) -> Self {
        self.form.pps.push(PpsEntry {
            setting: setting.to_string(),
            name: Some(name.to_string()),
            abc: Some(abc),
        });
        self
    }

    /// A named setting whose ABC answer was left blank
    pub fn picture_without_abc(mut self, setting: &str, name: &str) -> Self {
        self.form.pps.push(PpsEntry {
            setting: setting.to_string(),
            name: Some(name.to_string()),
            abc: None,
        });
        self
    }

    /// A sheet row the operator left blank
    pub fn blank_picture(mut self, setting: &str) -> Self {
        self.form.pps.push(PpsEntry {
            setting: setting.to_string(),
            name: None,
            abc: None,
        });
        self
    }

    pub fn no_quickstart(mut self) -> Self {
        self.form.misc = MiscEntries {
            has_quickstart: Some(false),
            ..self.form.misc
        };
        self
    }

    pub fn quickstart(mut self, default_off: bool, wake_seconds: f64) -> Self {
        self.form.misc = MiscEntries {
            has_quickstart: Some(true),
            quickstart_default_off: Some(default_off),
            wake_seconds: Some(wake_seconds),
            ..self.form.misc
        };
        self
    }

    /// Leave "Does TV have QS?" unanswered
    pub fn unanswered_quickstart(mut self) -> Self {
        self.form.misc.has_quickstart = None;
        self
    }

    pub fn lum_profile(mut self, enabled: bool) -> Self {
        self.form.misc.lum_profile = Some(enabled);
        self
    }

    pub fn render(&self) -> E2eResult<String> {
        Ok(toml::to_string(&self.form)?)
    }
}

/// Output of one pipeline run
#[derive(Debug)]
pub struct Run {
    pub sequence: ResolvedSequence,
    pub commands: CommandSequence,
    pub written: WrittenArtifacts,
}

impl Run {
    pub fn names(&self) -> Vec<&str> {
        self.sequence
            .rows
            .iter()
            .map(|r| r.test_name.as_str())
            .collect()
    }
}

/// Temporary model data folder
pub struct DataFolder {
    dir: TempDir,
}

impl DataFolder {
    pub fn new() -> E2eResult<Self> {
        let dir = tempfile::Builder::new().prefix("powerseq-").tempdir()?;
        fs::create_dir_all(dir.path().join("work"))?;
        Ok(Self { dir })
    }

    pub fn with_entry_form(form: &EntryFormBuilder) -> E2eResult<Self> {
        let folder = Self::new()?;
        folder.write_entry_form(form)?;
        Ok(folder)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn entry_form_path(&self) -> PathBuf {
        entry_form_path(self.path())
    }

    /// Where working copies land, standing in for the controller's folder
    pub fn working_dir(&self) -> PathBuf {
        self.path().join("work")
    }

    pub fn write_entry_form(&self, form: &EntryFormBuilder) -> E2eResult<()> {
        fs::write(self.entry_form_path(), form.render()?)?;
        Ok(())
    }

    /// Run the full pipeline with the bundled catalog
    pub fn generate(&self) -> E2eResult<Run> {
        self.generate_with(&Catalog::bundled()?, false)
    }

    pub fn generate_with(&self, catalog: &Catalog, repair: bool) -> E2eResult<Run> {
        let config = load_operator_config(&self.entry_form_path())?;
        let (sequence, commands) =
            powerseq_common::generate(catalog, &config, &SettingLabels::standard())?;
        let written = ArtifactWriter::new(self.path())
            .repair(repair)
            .working_dir(Some(self.working_dir()))
            .write(&sequence, &commands)?;
        debug!("Generated {} rows in {}", sequence.len(), self.path().display());
        Ok(Run {
            sequence,
            commands,
            written,
        })
    }

    /// Files currently in the data folder's archive
    pub fn archived_files(&self) -> E2eResult<Vec<PathBuf>> {
        let archive = self.path().join("Archive");
        if !archive.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = fs::read_dir(archive)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()?;
        files.sort();
        Ok(files)
    }
}
