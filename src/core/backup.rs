//! Backup-guarded mutation: snapshot, apply, verify, restore on failure.
//!
//! The backup at `<store>.backup` is taken and digest-checked before any write
//! to the store. It is never deleted afterwards; it is the audit trail and the
//! last line of recovery. Two operations on the same path may never overlap,
//! since a second backup would overwrite the first before a rollback.

use crate::core::console::Reporter;
use crate::core::error::ScrubError;
use crate::core::ident::FieldPlan;
use crate::core::lock;
use crate::core::outcome::{MutationOutcome, OutcomeStatus};
use crate::core::store::{DiscoveredStore, Operation, backup_path_for, sibling_path};
use crate::core::terms::MatchTermSet;
use crate::plugins::{self, Applied};
use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Hex SHA-256 of a file's bytes.
pub fn file_digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Byte-identical copy of a store taken before mutation.
#[derive(Debug)]
pub struct BackupHandle {
    pub original: PathBuf,
    pub path: PathBuf,
    pub digest: String,
}

impl BackupHandle {
    /// Copy `original` to its backup sibling and verify the copy reads back
    /// with the same digest.
    pub fn create(original: &Path) -> Result<Self, ScrubError> {
        if !original.is_file() {
            return Err(ScrubError::NotFound(original.display().to_string()));
        }
        let path = backup_path_for(original);
        let wrap = |e: io::Error| ScrubError::WriteFailure(format!("backup {}: {}", path.display(), e));

        // A read-only backup left by an earlier run would refuse the copy.
        if path.is_file() {
            clear_readonly(&path).map_err(wrap)?;
        }

        fs::copy(original, &path).map_err(wrap)?;
        preserve_mtime(original, &path);

        let digest = file_digest(original).map_err(wrap)?;
        let copied = file_digest(&path).map_err(wrap)?;
        if digest != copied {
            return Err(ScrubError::WriteFailure(format!(
                "backup {} does not match its original",
                path.display()
            )));
        }
        debug!(backup = %path.display(), %digest, "backup verified");

        Ok(Self {
            original: original.to_path_buf(),
            path,
            digest,
        })
    }

    /// Put the backup bytes back over the original. A store that still holds
    /// the backed-up bytes is left alone.
    pub fn restore(&self) -> Result<(), ScrubError> {
        if file_digest(&self.original).ok().as_deref() == Some(self.digest.as_str()) {
            return Ok(());
        }

        let staged = sibling_path(&self.original, ".storescrub-restore");
        let replaced = fs::copy(&self.path, &staged).and_then(|_| fs::rename(&staged, &self.original));
        if let Err(e) = replaced {
            let _ = fs::remove_file(&staged);
            debug!(error = %e, "staged restore failed, copying in place");
            fs::copy(&self.path, &self.original).map_err(|e| {
                ScrubError::RestoreFailure(format!("{}: {}", self.original.display(), e))
            })?;
        }

        match file_digest(&self.original) {
            Ok(d) if d == self.digest => Ok(()),
            Ok(_) => Err(ScrubError::RestoreFailure(format!(
                "{} differs from its backup after restore",
                self.original.display()
            ))),
            Err(e) => Err(ScrubError::RestoreFailure(format!(
                "{}: {}",
                self.original.display(),
                e
            ))),
        }
    }
}

/// Make `path` writable. Returns the previous permissions if they were read-only.
fn clear_readonly(path: &Path) -> io::Result<Option<fs::Permissions>> {
    let perms = fs::metadata(path)?.permissions();
    if !perms.readonly() {
        return Ok(None);
    }
    let mut writable = perms.clone();
    #[allow(clippy::permissions_set_readonly_false)]
    writable.set_readonly(false);
    fs::set_permissions(path, writable)?;
    Ok(Some(perms))
}

/// Carry the original's modification time to `to`. A copy of a locked store is
/// read-only itself, so it is unlocked for the update and locked again after.
fn preserve_mtime(from: &Path, to: &Path) {
    let applied = (|| -> io::Result<()> {
        let modified = fs::metadata(from)?.modified()?;
        let previous = clear_readonly(to)?;
        let result = File::options()
            .write(true)
            .open(to)
            .and_then(|f| f.set_modified(modified));
        if let Some(perms) = previous {
            fs::set_permissions(to, perms)?;
        }
        result
    })();
    if let Err(e) = applied {
        warn!(path = %to.display(), error = %e, "could not carry modification time to backup");
    }
}

/// Inputs shared by every mutation in a run.
#[derive(Debug, Clone, Copy)]
pub struct MutationContext<'a> {
    pub terms: &'a MatchTermSet,
    pub plan: &'a FieldPlan,
    /// Lock document stores after a successful regenerate.
    pub lock: bool,
}

/// Runs adapter operations under the backup contract and keeps track of which
/// paths are in flight.
#[derive(Debug, Default)]
pub struct Mutator {
    in_flight: Mutex<FxHashSet<PathBuf>>,
}

struct PathClaim<'m> {
    mutator: &'m Mutator,
    key: PathBuf,
}

impl Drop for PathClaim<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.mutator.in_flight.lock() {
            set.remove(&self.key);
        }
    }
}

impl Mutator {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&self, path: &Path) -> Result<PathClaim<'_>, ScrubError> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let mut set = self
            .in_flight
            .lock()
            .map_err(|_| ScrubError::Busy(path.display().to_string()))?;
        if !set.insert(key.clone()) {
            return Err(ScrubError::Busy(path.display().to_string()));
        }
        Ok(PathClaim { mutator: self, key })
    }

    /// Apply `op` to `store` under backup protection.
    pub fn guarded(
        &self,
        store: &DiscoveredStore<'_>,
        op: Operation,
        ctx: &MutationContext<'_>,
        reporter: &dyn Reporter,
    ) -> MutationOutcome {
        self.guarded_with(store, op, ctx, reporter, |path| {
            plugins::apply(store.format, op, path, ctx.terms, ctx.plan)
        })
    }

    /// [`Mutator::guarded`] with the adapter call supplied by the caller. The
    /// store is still verified in its own format after a reported change.
    pub fn guarded_with<F>(
        &self,
        store: &DiscoveredStore<'_>,
        op: Operation,
        ctx: &MutationContext<'_>,
        reporter: &dyn Reporter,
        apply: F,
    ) -> MutationOutcome
    where
        F: FnOnce(&Path) -> Result<Applied, ScrubError>,
    {
        if !store.format.supports(op) || !store.descriptor.supports(op) {
            return MutationOutcome::new(store, op, OutcomeStatus::Unsupported)
                .with_detail(format!("{} does not apply to {} stores", op, store.format));
        }

        let _claim = match self.claim(&store.path) {
            Ok(claim) => claim,
            Err(e) => {
                warn!(path = %store.path.display(), "store already in flight");
                return MutationOutcome::new(store, op, OutcomeStatus::FailedRestored)
                    .with_detail(e.to_string());
            }
        };

        // The filesystem is not locked between discovery and now.
        if !store.path.is_file() {
            let e = ScrubError::NotFound(store.path.display().to_string());
            reporter.error(&format!("Store disappeared before backup: {}", store.path.display()));
            return MutationOutcome::new(store, op, OutcomeStatus::FailedRestored)
                .with_detail(e.to_string());
        }

        let backup = match BackupHandle::create(&store.path) {
            Ok(b) => b,
            Err(e) => {
                reporter.error(&format!("Could not back up {}: {}", store.path.display(), e));
                return MutationOutcome::new(store, op, OutcomeStatus::FailedRestored)
                    .with_detail(e.to_string());
            }
        };
        reporter.info(&format!("Created backup at: {}", backup.path.display()));

        let result = apply(&store.path).and_then(|applied| {
            if applied.is_changed() {
                plugins::verify(store.format, &store.path)?;
            }
            Ok(applied)
        });

        match result {
            Ok(Applied::Changed { affected, changes }) => {
                let mut outcome = MutationOutcome::new(store, op, OutcomeStatus::Success);
                outcome.affected = affected;
                outcome.changes = changes;
                if ctx.lock && op == Operation::Regenerate && !lock::lock(&store.path) {
                    let msg = ScrubError::PermissionFailure(format!(
                        "could not lock {}",
                        store.path.display()
                    ));
                    reporter.warning(&msg.to_string());
                    outcome.warnings.push(msg.to_string());
                }
                outcome
            }
            Ok(Applied::Unchanged) => MutationOutcome::new(store, op, OutcomeStatus::NoOp),
            Ok(Applied::Unsupported) => MutationOutcome::new(store, op, OutcomeStatus::Unsupported),
            Err(e) => {
                reporter.error(&e.to_string());
                reporter.info("Restoring from backup...");
                match backup.restore() {
                    Ok(()) => {
                        reporter.success("Restored from backup");
                        MutationOutcome::new(store, op, OutcomeStatus::FailedRestored)
                            .with_detail(e.to_string())
                    }
                    Err(restore_err) => {
                        reporter.error(&format!("Failed to restore from backup: {}", restore_err));
                        MutationOutcome::new(store, op, OutcomeStatus::FailedUnrecoverable)
                            .with_detail(format!("{}; {}", e, restore_err))
                    }
                }
            }
        }
    }
}
