//! Format adapters: one module per storage format.
//!
//! Every adapter speaks the same two-operation contract. An operation that has
//! nothing to address in a format returns [`Applied::Unsupported`] rather than
//! an error.

pub mod document;
pub mod tabular;
pub mod tree;

use crate::core::error::ScrubError;
use crate::core::ident::FieldPlan;
use crate::core::outcome::FieldChange;
use crate::core::store::{Operation, StoreFormat, sibling_path};
use crate::core::terms::MatchTermSet;
use std::fs;
use std::path::Path;

/// What an adapter did to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Changed {
        affected: usize,
        changes: Vec<FieldChange>,
    },
    /// Nothing matched; the file was not written.
    Unchanged,
    Unsupported,
}

impl Applied {
    pub fn removed(count: usize) -> Self {
        if count == 0 {
            Applied::Unchanged
        } else {
            Applied::Changed {
                affected: count,
                changes: Vec::new(),
            }
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Applied::Changed { .. })
    }
}

pub fn purge(format: StoreFormat, path: &Path, terms: &MatchTermSet) -> Result<Applied, ScrubError> {
    match format {
        StoreFormat::Tabular => tabular::purge(path, terms),
        StoreFormat::Tree => tree::purge(path, terms),
        StoreFormat::Document => Ok(Applied::Unsupported),
    }
}

pub fn regenerate(format: StoreFormat, path: &Path, plan: &FieldPlan) -> Result<Applied, ScrubError> {
    match format {
        StoreFormat::Document => document::regenerate(path, plan),
        StoreFormat::Tabular | StoreFormat::Tree => Ok(Applied::Unsupported),
    }
}

pub fn apply(
    format: StoreFormat,
    op: Operation,
    path: &Path,
    terms: &MatchTermSet,
    plan: &FieldPlan,
) -> Result<Applied, ScrubError> {
    match op {
        Operation::Purge => purge(format, path, terms),
        Operation::Regenerate => regenerate(format, path, plan),
    }
}

/// Re-open a store after mutation to confirm it is still valid in its format.
pub fn verify(format: StoreFormat, path: &Path) -> Result<(), ScrubError> {
    match format {
        StoreFormat::Tabular => tabular::verify(path),
        StoreFormat::Document => document::load(path).map(|_| ()),
        StoreFormat::Tree => tree::load(path).map(|_| ()),
    }
}

/// Write through a sibling temp file and rename it over `path`, carrying the
/// original permissions across.
pub(crate) fn write_replacing(path: &Path, contents: &[u8]) -> Result<(), ScrubError> {
    let tmp = sibling_path(path, ".storescrub-tmp");
    let result = (|| -> std::io::Result<()> {
        fs::write(&tmp, contents)?;
        if let Ok(meta) = fs::metadata(path) {
            let _ = fs::set_permissions(&tmp, meta.permissions());
        }
        fs::rename(&tmp, path)
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(write_failure(path, e));
    }
    Ok(())
}

pub(crate) fn parse_failure(path: &Path, e: impl std::fmt::Display) -> ScrubError {
    ScrubError::ParseFailure(format!("{}: {}", path.display(), e))
}

pub(crate) fn write_failure(path: &Path, e: impl std::fmt::Display) -> ScrubError {
    ScrubError::WriteFailure(format!("{}: {}", path.display(), e))
}
