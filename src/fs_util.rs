//! File-system helpers for provisioning the driver configuration.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! reader never observes a partially written file and a failed render leaves
//! the previous file untouched.

use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Group, Uid, User, chown};
use tracing::debug;

use crate::error::{BackendError, Result};

/// Account the rendered files are handed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOwner {
    pub user: String,
    pub group: String,
}

impl FileOwner {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }

    /// Resolve the account names against the local user database
    fn resolve(&self, path: &Path) -> Result<(Uid, Gid)> {
        let user = User::from_name(&self.user)
            .map_err(|e| BackendError::ownership(path, format!("user lookup failed: {e}")))?
            .ok_or_else(|| BackendError::ownership(path, format!("no such user '{}'", self.user)))?;
        let group = Group::from_name(&self.group)
            .map_err(|e| BackendError::ownership(path, format!("group lookup failed: {e}")))?
            .ok_or_else(|| {
                BackendError::ownership(path, format!("no such group '{}'", self.group))
            })?;
        Ok((user.uid, group.gid))
    }

    fn apply(&self, path: &Path) -> Result<()> {
        let (uid, gid) = self.resolve(path)?;
        chown(path, Some(uid), Some(gid))
            .map_err(|e| BackendError::ownership(path, format!("chown failed: {e}")))?;
        debug!("Set owner of {:?} to {}:{}", path, self.user, self.group);
        Ok(())
    }
}

impl Default for FileOwner {
    fn default() -> Self {
        Self::new("cinder", "root")
    }
}

/// Create `dir` (and parents) if needed, then hand it to `owner`.
///
/// Calling this on an existing directory is not an error.
pub fn ensure_dir(dir: &Path, mode: u32, owner: Option<&FileOwner>) -> Result<()> {
    DirBuilder::new()
        .recursive(true)
        .mode(mode)
        .create(dir)
        .map_err(|source| BackendError::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    // Covers umask filtering and directories that already existed
    fs::set_permissions(dir, fs::Permissions::from_mode(mode)).map_err(|source| {
        BackendError::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        }
    })?;

    if let Some(owner) = owner {
        owner.apply(dir)?;
    }
    Ok(())
}

/// Removes the temporary file unless the write completed
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Replace `target` with `data`, applying `mode` and `owner` before the
/// new content becomes visible.
pub fn write_atomic(target: &Path, data: &[u8], mode: u32, owner: Option<&FileOwner>) -> Result<()> {
    let render_err = |source: std::io::Error| BackendError::Render {
        path: target.to_path_buf(),
        source,
    };

    let tmp_path = temp_path_for(target);
    let mut guard = TempFileGuard::new(tmp_path.clone());

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(&tmp_path)
        .map_err(render_err)?;
    file.write_all(data).map_err(render_err)?;
    // The creation mode is filtered by umask; set it explicitly
    file.set_permissions(fs::Permissions::from_mode(mode))
        .map_err(render_err)?;
    file.sync_all().map_err(render_err)?;
    drop(file);

    if let Some(owner) = owner {
        owner.apply(&tmp_path)?;
    }

    fs::rename(&tmp_path, target).map_err(render_err)?;
    guard.disarm();

    debug!("Wrote {} bytes to {:?} (mode {:o})", data.len(), target, mode);
    Ok(())
}

fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}
