//! Options controlling how a grid file is loaded.

use serde::{Deserialize, Serialize};

/// Where node values are kept once a grid file is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// Decode every node record up front.
    #[default]
    InMemory,
    /// Decode headers only and read node records on demand.
    FileBacked,
}

/// Grid file loading options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Node storage strategy.
    pub storage: StorageMode,
    /// Keep accuracy values when loading into memory.
    ///
    /// File-backed grids always report accuracy.
    pub load_accuracy: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            storage: StorageMode::InMemory,
            load_accuracy: true,
        }
    }
}

impl LoadOptions {
    /// Options for lazily read, file-backed sub-grids.
    pub fn file_backed() -> Self {
        Self {
            storage: StorageMode::FileBacked,
            ..Self::default()
        }
    }

    /// Set whether accuracy values are kept in memory.
    pub fn with_accuracy(mut self, load_accuracy: bool) -> Self {
        self.load_accuracy = load_accuracy;
        self
    }
}
