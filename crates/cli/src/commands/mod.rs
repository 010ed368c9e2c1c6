//! CLI Commands

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use powerseq_common::entry_form::{ensure_entry_form, entry_form_path};
use powerseq_common::{load_operator_config, Catalog, OperatorConfig};

use crate::prompt::OperatorPrompt;

pub mod catalog;
pub mod generate;
pub mod show;

/// Inputs shared by every command that builds a sequence
#[derive(Args, Debug, Clone)]
pub struct RunInputs {
    /// Model data folder holding the entry form
    pub data_folder: PathBuf,

    /// Entry form path [default: <data_folder>/entry-forms.toml]
    #[arg(long)]
    pub entry_form: Option<PathBuf>,

    /// Test details catalog CSV [default: bundled catalog]
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Fail instead of waiting for the operator to fix a problem
    #[arg(long)]
    pub no_prompt: bool,
}

impl RunInputs {
    pub fn entry_form_path(&self) -> PathBuf {
        self.entry_form
            .clone()
            .unwrap_or_else(|| entry_form_path(&self.data_folder))
    }

    pub fn prompt(&self) -> OperatorPrompt<std::io::StdinLock<'static>> {
        OperatorPrompt::stdin(!self.no_prompt)
    }

    /// Load the catalog and the operator's entry form.
    ///
    /// A missing form is created from the template and the operator is asked
    /// to fill it in; blank mandatory fields are retried until fixed.
    pub fn load<R: std::io::BufRead>(
        &self,
        prompt: &mut OperatorPrompt<R>,
    ) -> Result<(Catalog, OperatorConfig)> {
        if !self.data_folder.is_dir() {
            bail!("Data folder {} does not exist", self.data_folder.display());
        }
        let catalog = load_catalog(self.catalog.as_deref())?;

        let form = self.entry_form_path();
        if prompt.retry(|| ensure_entry_form(&form))? {
            prompt.wait_for_operator(&format!(
                "A blank entry form was written to {}.\n\nFill it in and save it, then press Enter.",
                form.display()
            ))?;
        }
        let config = prompt.retry(|| load_operator_config(&form))?;
        info!(
            "Loaded entry form {} ({} preset pictures)",
            form.display(),
            config.pictures.len()
        );
        Ok((catalog, config))
    }
}

/// Load a catalog file, or the bundled catalog when no path is given
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(Catalog::bundled().context("Bundled catalog is invalid")?),
    }
}
