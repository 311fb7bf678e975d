use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Error;

// Version-control litter never affects a build; everything else is copied
// so vendored dependencies and embedded assets stay available.
const SKIP_NAMES: &[&str] = &[".git", ".hg", ".svn"];

/// Hands out isolated, writable copies of the module tree, one per worker.
/// Sandboxes are disjoint by construction; the original tree is never
/// handed to anyone.
pub struct Dealer {
    work_root: PathBuf,
    src_root: PathBuf,
    next_id: AtomicUsize,
}

/// A sandbox lives for its worker's whole lifetime and is reused across
/// the mutants assigned to that worker.
#[derive(Debug)]
pub struct Sandbox {
    path: PathBuf,
}

impl Sandbox {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Dealer {
    pub fn new(work_root: impl Into<PathBuf>, src_root: impl Into<PathBuf>) -> Self {
        Dealer {
            work_root: work_root.into(),
            src_root: src_root.into(),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Create the next sandbox as a full copy of the module tree,
    /// preserving file modes.
    pub fn get(&self) -> Result<Sandbox, Error> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let path = self.work_root.join(format!("sandbox-{id}"));
        copy_dir_filtered(&self.src_root, &path).map_err(|e| Error::sandbox(&path, e))?;
        Ok(Sandbox { path })
    }

    pub fn release(&self, sandbox: Sandbox) {
        let _ = fs::remove_dir_all(&sandbox.path);
    }
}

fn copy_dir_filtered(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if SKIP_NAMES.iter().any(|s| *s == name_str) {
            continue;
        }
        let src_path = entry.path();
        let dst_path = dst.join(&name);
        let ft = entry.file_type()?;
        if ft.is_dir() {
            copy_dir_filtered(&src_path, &dst_path)?;
        } else if ft.is_file() {
            fs::copy(&src_path, &dst_path)?;
        } else if ft.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        }
        // Other special files (sockets, fifos) are skipped.
    }
    Ok(())
}

/// Recreate the link with its original target, so relative links keep
/// resolving inside the sandbox.
#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    // No portable symlink creation; copy through the link instead.
    if src.is_dir() {
        copy_dir_filtered(src, dst)
    } else {
        fs::copy(src, dst).map(|_| ())
    }
}
