//! Best-effort file locking after an identifier store is rewritten.
//!
//! Write permission bits are always cleared. Where the platform has an extra
//! immutability switch (`chflags uchg` on macOS, `attrib +R` on Windows) it is
//! tried as well, and its result is ignored.

use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// Make `path` read-only. Returns false, never an error, when the final
/// permission change cannot be applied.
pub fn lock(path: &Path) -> bool {
    if !path.is_file() {
        warn!(path = %path.display(), "cannot lock a file that does not exist");
        return false;
    }

    if let Err(e) = remove_write_permissions(path) {
        debug!(path = %path.display(), error = %e, "clearing write bits failed, retrying after platform lock");
    }
    platform_lock(path);

    match remove_write_permissions(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not make file read-only");
            false
        }
    }
}

pub fn is_locked(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.permissions().readonly())
        .unwrap_or(false)
}

fn remove_write_permissions(path: &Path) -> io::Result<()> {
    let metadata = fs::metadata(path)?;
    let mut perms = metadata.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = perms.mode();
        let new_mode = mode & !0o222;
        if mode != new_mode {
            perms.set_mode(new_mode);
            fs::set_permissions(path, perms)?;
        }
    }
    #[cfg(not(unix))]
    {
        if !perms.readonly() {
            perms.set_readonly(true);
            fs::set_permissions(path, perms)?;
        }
    }
    Ok(())
}

fn platform_lock(path: &Path) {
    let command = if cfg!(target_os = "macos") {
        Some(("chflags", vec!["uchg"]))
    } else if cfg!(windows) {
        Some(("attrib", vec!["+R"]))
    } else {
        None
    };

    let Some((program, args)) = command else {
        return;
    };
    let status = Command::new(program)
        .args(args)
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(s) if s.success() => debug!(program, path = %path.display(), "platform lock applied"),
        Ok(s) => debug!(program, code = ?s.code(), "platform lock refused"),
        Err(e) => debug!(program, error = %e, "platform lock unavailable"),
    }
}
