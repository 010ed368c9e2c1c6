//! Artifact Writer
//!
//! Persists the two run artifacts. Both files are rendered in memory and
//! staged as temp files before any destination is touched, so a failed run
//! never leaves one file updated and the other stale. A file already at a
//! data folder destination is copied into `Archive/` with a timestamp before
//! it is replaced; archives are never overwritten.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::catalog::parse_flag;
use crate::compiler::CommandSequence;
use crate::error::{Error, Result};
use crate::resolver::{ResolvedRow, ResolvedSequence};
use crate::types::{format_number, Annotation, TestKind};

pub const TEST_SEQUENCE_FILE: &str = "test-sequence.csv";
pub const COMMAND_SEQUENCE_FILE: &str = "command-sequence.csv";

pub const ARCHIVE_DIR: &str = "Archive";
pub const REPAIR_DIR: &str = "Repair";

/// Fixed test sequence columns, in file order
pub const TEST_SEQUENCE_COLUMNS: [&str; 11] = [
    "tag",
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

const ARCHIVE_STAMP: &str = "%Y-%b-%d-%H-%M";

/// Where a run's artifacts were written
#[derive(Debug, Clone, Default)]
pub struct WrittenArtifacts {
    pub test_sequence: PathBuf,
    pub command_sequence: PathBuf,
    pub working_copies: Vec<PathBuf>,
    pub archived: Vec<PathBuf>,
}

/// Writes both artifacts for one data folder
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    data_folder: PathBuf,
    repair: bool,
    working_dir: Option<PathBuf>,
}

impl ArtifactWriter {
    pub fn new(data_folder: impl Into<PathBuf>) -> Self {
        Self {
            data_folder: data_folder.into(),
            repair: false,
            working_dir: None,
        }
    }

    /// Write into `Repair/` with a `repair-` prefix instead of the data folder
    pub fn repair(mut self, repair: bool) -> Self {
        self.repair = repair;
        self
    }

    /// Also drop a copy of both files here for the automation controller
    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Destination of `file_name` in the data folder
    pub fn destination(&self, file_name: &str) -> PathBuf {
        if self.repair {
            self.data_folder
                .join(REPAIR_DIR)
                .join(format!("repair-{}", file_name))
        } else {
            self.data_folder.join(file_name)
        }
    }

    /// Write both artifacts, all or nothing.
    ///
    /// Every file is staged as a temp file first. Prior files are archived
    /// and replaced only once all of them are staged and every destination
    /// is writable; on failure the staged files are removed.
    pub fn write(
        &self,
        sequence: &ResolvedSequence,
        commands: &CommandSequence,
    ) -> Result<WrittenArtifacts> {
        let rendered = [
            (TEST_SEQUENCE_FILE, render_test_sequence(sequence)?),
            (COMMAND_SEQUENCE_FILE, render_command_sequence(commands)?),
        ];

        let mut staged = Vec::new();
        let outcome = self.stage_and_commit(&rendered, &mut staged);
        if outcome.is_err() {
            for file in &staged {
                let _ = fs::remove_file(&file.tmp_path);
            }
        }
        outcome
    }

    fn stage_and_commit(
        &self,
        rendered: &[(&str, Vec<u8>)],
        staged: &mut Vec<StagedFile>,
    ) -> Result<WrittenArtifacts> {
        for (name, data) in rendered {
            staged.push(StagedFile::stage(self.destination(name), data, true)?);
        }
        if let Some(dir) = &self.working_dir {
            for (name, data) in rendered {
                staged.push(StagedFile::stage(dir.join(name), data, false)?);
            }
        }

        if let Some(blocked) = staged.iter().find(|f| f.path.is_dir()) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is a directory", blocked.path.display()),
            )));
        }

        let mut written = WrittenArtifacts {
            test_sequence: self.destination(TEST_SEQUENCE_FILE),
            command_sequence: self.destination(COMMAND_SEQUENCE_FILE),
            ..Default::default()
        };
        for file in staged.iter().filter(|f| f.archive) {
            if let Some(archived) = archive_existing(&file.path)? {
                written.archived.push(archived);
            }
        }
        for file in staged.iter() {
            file.commit()?;
            if file.archive {
                info!("Saved {}", file.path.display());
            } else {
                written.working_copies.push(file.path.clone());
            }
        }
        Ok(written)
    }
}

/// A rendered file waiting in a temp file next to its destination
#[derive(Debug)]
struct StagedFile {
    path: PathBuf,
    tmp_path: PathBuf,
    archive: bool,
}

impl StagedFile {
    fn stage(path: PathBuf, data: &[u8], archive: bool) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::from_write(e, parent))?;
        }
        let tmp_path = path.with_extension("csv.tmp");
        if let Err(e) = fs::write(&tmp_path, data) {
            let _ = fs::remove_file(&tmp_path);
            return Err(Error::from_write(e, &path));
        }
        debug!("Staged {} bytes for {}", data.len(), path.display());
        Ok(Self {
            path,
            tmp_path,
            archive,
        })
    }

    fn commit(&self) -> Result<()> {
        fs::rename(&self.tmp_path, &self.path).map_err(|e| Error::from_write(e, &self.path))
    }
}

/// Test sequence CSV with header
pub fn render_test_sequence(sequence: &ResolvedSequence) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header: Vec<&str> = TEST_SEQUENCE_COLUMNS
        .iter()
        .copied()
        .chain(sequence.extra_columns.iter().map(String::as_str))
        .collect();
    writer.write_record(&header)?;

    for row in &sequence.rows {
        let mut record = vec![
            row.tag.to_string(),
            row.test_name.clone(),
            row.test_time.map(format_number).unwrap_or_default(),
            row.video.clone().unwrap_or_default(),
            row.preset_picture.clone().unwrap_or_default(),
            row.abc
                .map(|on| if on { "on" } else { "off" }.to_string())
                .unwrap_or_default(),
            row.backlight.map(|b| b.to_string()).unwrap_or_default(),
            row.lux.map(format_number).unwrap_or_default(),
            row.mdd.map(|m| m.to_string()).unwrap_or_default(),
            row.qs.map(|q| q.to_string()).unwrap_or_default(),
            row.special_commands.to_string(),
        ];
        for i in 0..sequence.extra_columns.len() {
            record.push(row.extras.get(i).cloned().flatten().unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    into_bytes(writer)
}

/// Command sequence CSV, no header, rows padded to equal width
pub fn render_command_sequence(commands: &CommandSequence) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in commands.rows() {
        writer.write_record(&row)?;
    }
    into_bytes(writer)
}

fn into_bytes(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

/// Read a test sequence CSV back into resolved rows
pub fn read_test_sequence(path: &Path) -> Result<ResolvedSequence> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let index = |name: &str| headers.iter().position(|h| h == name);
    let columns: Vec<Option<usize>> = TEST_SEQUENCE_COLUMNS
        .iter()
        .copied()
        .map(|c| index(c))
        .collect();
    if columns[0].is_none() || columns[1].is_none() {
        return Err(Error::InvalidCatalog(format!(
            "{} has no tag/test_name header",
            path.display()
        )));
    }
    let extra_columns: Vec<String> = headers
        .iter()
        .filter(|h| !TEST_SEQUENCE_COLUMNS.contains(h))
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |col: usize| -> Option<&str> {
            columns[col]
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let test_name = cell(1).unwrap_or_default().to_string();
        rows.push(ResolvedRow {
            tag: parse_value(cell(0), "tag")?.unwrap_or_default(),
            kind: TestKind::classify(&test_name),
            test_name,
            test_time: parse_value(cell(2), "test_time")?,
            video: cell(3).map(str::to_string),
            preset_picture: cell(4).map(str::to_string),
            abc: cell(5).map(parse_flag).transpose()?,
            backlight: cell(6).map(str::parse).transpose()?,
            lux: parse_value(cell(7), "lux")?,
            mdd: cell(8).map(str::parse).transpose()?,
            qs: cell(9).map(str::parse).transpose()?,
            special_commands: Annotation::parse(cell(10).unwrap_or_default())?,
            extras: extra_columns
                .iter()
                .map(|name| {
                    index(name.as_str())
                        .and_then(|i| record.get(i))
                        .filter(|v| !v.trim().is_empty())
                        .map(str::to_string)
                })
                .collect(),
        });
    }

    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(ResolvedSequence {
        rows,
        extra_columns,
    })
}

fn parse_value<T: std::str::FromStr>(value: Option<&str>, column: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.parse().map_err(|_| {
                Error::InvalidCatalog(format!("bad {} value '{}'", column, v))
            })
        })
        .transpose()
}

/// Copy an existing file to `<dir>/Archive/<stem>-<stamp><ext>`.
///
/// A second archive within the same minute gets a `-1`, `-2`, ... suffix.
pub fn archive_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let archive_dir = dir.join(ARCHIVE_DIR);
    fs::create_dir_all(&archive_dir).map_err(|e| Error::from_write(e, &archive_dir))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = Local::now().format(ARCHIVE_STAMP).to_string();
    let target = reserve_archive_name(&archive_dir, &format!("{}-{}", stem, stamp), &ext)?;

    fs::copy(path, &target).map_err(|e| Error::from_write(e, &target))?;
    info!("Archived {} to {}", path.display(), target.display());
    Ok(Some(target))
}

/// Claim the first free `<base>[-n]<ext>` in `dir`
fn reserve_archive_name(dir: &Path, base: &str, ext: &str) -> Result<PathBuf> {
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{}{}", base, ext)
        } else {
            format!("{}-{}{}", base, attempt, ext)
        };
        let candidate = dir.join(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(_) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(Error::from_write(e, &candidate)),
        }
    }
}
