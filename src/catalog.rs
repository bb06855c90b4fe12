//! Data file catalog
//!
//! Simulation output is organised under one data directory with a
//! subdirectory per category:
//!
//! ```text
//! data/
//! ├── simulations/   ross-stats-*.bin
//! ├── events/        *-evtrace.bin
//! └── models/        *-analysis-lps.bin
//! ```
//!
//! The catalog lists the files of a category, remembers which one is
//! selected, and resolves a file name to a path inside its category
//! directory (names that escape the directory are rejected).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::DataConfig;
use crate::decoders::DecoderKind;
use crate::error::{Result, ResultExt, TraceError};

/// Category of simulation output, one subdirectory each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    /// Engine statistics
    Simulations,
    /// Event traces
    Events,
    /// Model analysis samples
    Models,
}

impl DataCategory {
    pub const ALL: [DataCategory; 3] = [
        DataCategory::Simulations,
        DataCategory::Events,
        DataCategory::Models,
    ];

    /// Subdirectory name under the data directory
    pub fn dir_name(&self) -> &'static str {
        match self {
            DataCategory::Simulations => "simulations",
            DataCategory::Events => "events",
            DataCategory::Models => "models",
        }
    }

    /// Sample file selected when present
    pub fn default_file(&self) -> &'static str {
        match self {
            DataCategory::Simulations => "ross-stats-gvt.bin",
            DataCategory::Events => "esnet-model-inst-evtrace.bin",
            DataCategory::Models => "esnet-model-inst-analysis-lps.bin",
        }
    }

    /// Decoder for files of this category
    pub fn decoder_kind(&self) -> DecoderKind {
        match self {
            DataCategory::Simulations => DecoderKind::Engine,
            DataCategory::Events => DecoderKind::Event,
            DataCategory::Models => DecoderKind::Model,
        }
    }
}

impl From<DecoderKind> for DataCategory {
    fn from(kind: DecoderKind) -> Self {
        match kind {
            DecoderKind::Engine => DataCategory::Simulations,
            DecoderKind::Event => DataCategory::Events,
            DecoderKind::Model => DataCategory::Models,
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for DataCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DataCategory::ALL
            .into_iter()
            .find(|c| c.dir_name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown category '{}' (expected simulations, events or models)",
                    s
                )
            })
    }
}

/// Lists, selects and resolves data files
#[derive(Debug, Clone)]
pub struct DataCatalog {
    config: DataConfig,
    selected: HashMap<DataCategory, String>,
}

impl DataCatalog {
    /// Catalog over `data_dir` with the built-in default file names
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(DataConfig {
            data_dir: data_dir.into(),
            ..DataConfig::default()
        })
    }

    pub fn from_config(config: DataConfig) -> Self {
        Self {
            config,
            selected: HashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn category_dir(&self, category: DataCategory) -> PathBuf {
        self.config.data_dir.join(category.dir_name())
    }

    /// Sorted names of the regular files in a category
    ///
    /// A missing category directory is an empty listing.
    pub fn list_files(&self, category: DataCategory) -> Result<Vec<String>> {
        let dir = self.category_dir(category);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let entries = std::fs::read_dir(&dir).with_context(|| format!("Failed to list {:?}", dir))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
            if entry.path().is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Currently selected file of a category, if any
    pub fn selected(&self, category: DataCategory) -> Option<&str> {
        self.selected.get(&category).map(String::as_str)
    }

    /// Pick the file to use for a category
    ///
    /// Priority: `preferred` (or the previous selection) if it is available,
    /// then the configured default file, then the first file in sort order.
    /// The choice is remembered; `None` means the category is empty.
    pub fn select(
        &mut self,
        category: DataCategory,
        preferred: Option<&str>,
    ) -> Result<Option<String>> {
        let available = self.list_files(category)?;
        let wanted = preferred
            .map(str::to_string)
            .or_else(|| self.selected.get(&category).cloned());

        let choice = wanted
            .filter(|name| available.contains(name))
            .or_else(|| {
                let default = self.config.default_file(category);
                available.iter().find(|f| *f == default).cloned()
            })
            .or_else(|| available.first().cloned());

        match &choice {
            Some(name) => {
                tracing::debug!("Selected {} file '{}'", category, name);
                self.selected.insert(category, name.clone());
            }
            None => {
                tracing::debug!("No {} files under {:?}", category, self.category_dir(category));
                self.selected.remove(&category);
            }
        }
        Ok(choice)
    }

    /// Path of `name` inside the category directory
    ///
    /// Fails with [`TraceError::MissingFile`] if no such regular file exists
    /// and with [`TraceError::InvalidSelection`] if the name points outside
    /// the category directory.
    pub fn resolve(&self, category: DataCategory, name: &str) -> Result<PathBuf> {
        let dir = self.category_dir(category);
        let candidate = dir.join(name);
        if !candidate.is_file() {
            return Err(TraceError::MissingFile(name.to_string()));
        }

        let parent = candidate
            .parent()
            .map(Path::canonicalize)
            .transpose()
            .context("Failed to resolve data file")?;
        let dir = dir.canonicalize().context("Failed to resolve data directory")?;
        if parent.as_deref() != Some(dir.as_path()) {
            tracing::warn!("Rejected {} selection '{}' outside {:?}", category, name, dir);
            return Err(TraceError::InvalidSelection(name.to_string()));
        }

        Ok(candidate)
    }

    /// Resolve the selected file of a category, selecting one first if needed
    pub fn resolve_selected(&mut self, category: DataCategory) -> Result<PathBuf> {
        let name = match self.selected(category) {
            Some(name) => name.to_string(),
            None => self
                .select(category, None)?
                .ok_or_else(|| TraceError::MissingFile(format!("no {} files", category)))?,
        };
        self.resolve(category, &name)
    }
}
