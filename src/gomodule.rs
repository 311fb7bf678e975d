use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Immutable description of the Go module under test, valid for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    /// Canonical module name from the `module` directive.
    pub name: String,
    /// Absolute directory containing `go.mod`.
    pub root: PathBuf,
    /// Location of the tested package within the module, relative to root.
    /// `.` when the run targets the module root itself.
    pub pkg_dir: PathBuf,
}

impl GoModule {
    /// Resolve the module containing `path` by walking up to the nearest
    /// `go.mod`, the way project roots are found from marker files.
    pub fn init(path: &Path) -> Result<GoModule, Error> {
        let target = fs::canonicalize(path).map_err(|e| Error::Module {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let pkg_root = if target.is_dir() {
            target
        } else {
            target.parent().unwrap_or(&target).to_path_buf()
        };

        let mut dir = pkg_root.as_path();
        loop {
            let candidate = dir.join("go.mod");
            if candidate.is_file() {
                let name = parse_module_name(&candidate)?;
                let pkg_dir = pkg_root
                    .strip_prefix(dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                let pkg_dir = if pkg_dir.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    pkg_dir
                };
                return Ok(GoModule {
                    name,
                    root: dir.to_path_buf(),
                    pkg_dir,
                });
            }
            match dir.parent() {
                Some(parent) if parent != dir => dir = parent,
                _ => {
                    return Err(Error::Module {
                        path: path.to_path_buf(),
                        reason: "no go.mod found in any parent directory".to_string(),
                    })
                }
            }
        }
    }

    /// Absolute path of the tested package.
    pub fn pkg_root(&self) -> PathBuf {
        if self.pkg_dir == Path::new(".") {
            self.root.clone()
        } else {
            self.root.join(&self.pkg_dir)
        }
    }
}

fn parse_module_name(go_mod: &Path) -> Result<String, Error> {
    let contents = fs::read_to_string(go_mod).map_err(|e| Error::Module {
        path: go_mod.to_path_buf(),
        reason: e.to_string(),
    })?;
    for line in contents.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("module ") {
            let name = rest.trim().trim_matches('"');
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }
    }
    Err(Error::Module {
        path: go_mod.to_path_buf(),
        reason: "go.mod has no module directive".to_string(),
    })
}
