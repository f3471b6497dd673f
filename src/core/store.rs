//! Store handles produced by discovery and consumed by the mutator.
//!
//! A store is one physical file holding an application's persisted state. The
//! format tag picks which adapter in [`crate::plugins`] understands it.

use crate::core::descriptor::ApplicationDescriptor;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Suffix appended to a store path to address its backup copy.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Storage format discriminator. Adding a format means adding a variant here
/// and an adapter module; the mutator and orchestrator dispatch through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFormat {
    /// Key/value rows in an SQLite table.
    Tabular,
    /// JSON object with identifier fields.
    Document,
    /// XML tree of options and recently-used entries.
    Tree,
}

impl StoreFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreFormat::Tabular => "tabular",
            StoreFormat::Document => "document",
            StoreFormat::Tree => "tree",
        }
    }

    /// Whether this format has anything addressable for `op`.
    pub fn supports(&self, op: Operation) -> bool {
        matches!(
            (self, op),
            (StoreFormat::Tabular, Operation::Purge)
                | (StoreFormat::Tree, Operation::Purge)
                | (StoreFormat::Document, Operation::Regenerate)
        )
    }
}

impl fmt::Display for StoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Purge,
    Regenerate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Purge => "purge",
            Operation::Regenerate => "regenerate",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved store file plus the descriptor it was found through.
#[derive(Debug, Clone)]
pub struct DiscoveredStore<'a> {
    pub path: PathBuf,
    pub format: StoreFormat,
    pub descriptor: &'a ApplicationDescriptor,
}

impl DiscoveredStore<'_> {
    pub fn backup_path(&self) -> PathBuf {
        backup_path_for(&self.path)
    }
}

/// `<original-path>.backup`
pub fn backup_path_for(path: &Path) -> PathBuf {
    sibling_path(path, BACKUP_SUFFIX)
}

/// `path` with `suffix` appended to its file name.
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

pub fn is_backup_path(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(BACKUP_SUFFIX))
        .unwrap_or(false)
}
