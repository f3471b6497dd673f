//! Store locator: resolves descriptors into existing store files.
//!
//! Rooted descriptors use the first candidate root that exists (later roots are
//! fallbacks, never merged). Family descriptors scan base directories for any
//! product-like child directory and also treat each per-workspace directory as
//! its own store location. Unreadable directories are skipped. Results are
//! de-duplicated by canonical path so the same file is never handed out twice.

use crate::core::descriptor::{ApplicationDescriptor, FamilyScan, Layout, PlatformDirs, StoreSpec};
use crate::core::store::{DiscoveredStore, is_backup_path};
use rustc_hash::FxHashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Discover stores for every descriptor, in descriptor order.
pub fn discover<'a>(
    descriptors: &'a [ApplicationDescriptor],
    dirs: &PlatformDirs,
) -> Vec<DiscoveredStore<'a>> {
    let mut found = Found::default();
    for descriptor in descriptors {
        match &descriptor.layout {
            Layout::Rooted { roots, stores } => {
                let base = roots
                    .for_os(dirs.os)
                    .iter()
                    .filter_map(|r| r.resolve(dirs))
                    .find(|p| p.is_dir());
                let Some(base) = base else {
                    debug!(app = %descriptor.key, "no installation root found");
                    continue;
                };
                debug!(app = %descriptor.key, base = %base.display(), "using installation root");
                found.collect(descriptor, &base, stores);
            }
            Layout::Family(scan) => scan_family(descriptor, scan, dirs, &mut found),
        }
    }
    found.stores
}

fn scan_family<'a>(
    descriptor: &'a ApplicationDescriptor,
    scan: &FamilyScan,
    dirs: &PlatformDirs,
    found: &mut Found<'a>,
) {
    let products: Vec<String> = scan.products.iter().map(|p| p.to_lowercase()).collect();

    for base in dirs.family_bases() {
        if !base.is_dir() {
            continue;
        }
        let entries = match child_dirs(&base) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %base.display(), error = %e, "skipping unreadable base directory");
                continue;
            }
        };

        for entry in entries {
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !products.iter().any(|p| name.contains(p.as_str())) {
                continue;
            }

            for storage in &scan.storage_dirs {
                let dir = entry.join(storage);
                if dir.is_dir() {
                    found.collect(descriptor, &dir, &scan.stores);
                }
            }

            for workspaces in &scan.workspace_dirs {
                let dir = entry.join(workspaces);
                if !dir.is_dir() {
                    continue;
                }
                match child_dirs(&dir) {
                    Ok(children) => {
                        for workspace in children {
                            found.collect(descriptor, &workspace, &scan.stores);
                        }
                    }
                    Err(e) => {
                        debug!(dir = %dir.display(), error = %e, "skipping unreadable workspace storage");
                    }
                }
            }
        }
    }
}

/// Child directories of `dir`, sorted by path so discovery order is stable.
fn child_dirs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut out: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    out.sort();
    Ok(out)
}

#[derive(Default)]
struct Found<'a> {
    seen: FxHashSet<PathBuf>,
    stores: Vec<DiscoveredStore<'a>>,
}

impl<'a> Found<'a> {
    fn collect(&mut self, descriptor: &'a ApplicationDescriptor, base: &Path, specs: &[StoreSpec]) {
        for spec in specs {
            let path = base.join(&spec.rel);
            if !path.is_file() || is_backup_path(&path) {
                continue;
            }
            let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !self.seen.insert(key) {
                debug!(path = %path.display(), "already discovered, skipping");
                continue;
            }
            self.stores.push(DiscoveredStore {
                path,
                format: spec.format,
                descriptor,
            });
        }
    }
}
