use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser};

use crate::catalog::{self, MutantKind, Rewrite};
use crate::coverage::Profile;
use crate::error::Error;
use crate::gomodule::GoModule;
use crate::mutants::{Mutant, MutantStatus};

const SKIP_DIRS: &[&str] = &["vendor", "testdata"];

/// Walks the Go sources of a package dir and emits mutation candidates.
/// Test files are skipped; generated files are scanned like any other.
pub struct Scanner<'a> {
    module: &'a GoModule,
    profile: &'a Profile,
    enabled: &'a HashSet<MutantKind>,
}

impl<'a> Scanner<'a> {
    pub fn new(
        module: &'a GoModule,
        profile: &'a Profile,
        enabled: &'a HashSet<MutantKind>,
    ) -> Self {
        Scanner {
            module,
            profile,
            enabled,
        }
    }

    /// All scannable source files under the package dir, as paths relative
    /// to it, in a stable order.
    pub fn source_files(&self) -> Result<Vec<PathBuf>, Error> {
        let root = self.module.pkg_root();
        let mut files = Vec::new();
        collect_go_files(&root, &root, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// Scan one file from disk. `rel` is relative to the package dir.
    pub fn scan_file(&self, rel: &Path) -> Result<Vec<Mutant>, Error> {
        let abs = self.module.pkg_root().join(rel);
        let source = fs::read_to_string(&abs).map_err(|e| Error::Scan {
            path: abs.clone(),
            reason: e.to_string(),
        })?;
        self.scan_source(rel, &source)
    }

    /// Scan every file and collect the mutants. Used by dry runs and tests;
    /// the scheduler streams file by file instead.
    pub fn scan(&self) -> Result<Vec<Mutant>, Error> {
        let mut mutants = Vec::new();
        for rel in self.source_files()? {
            mutants.extend(self.scan_file(&rel)?);
        }
        Ok(mutants)
    }

    pub fn scan_source(&self, rel: &Path, source: &str) -> Result<Vec<Mutant>, Error> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| Error::Scan {
                path: rel.to_path_buf(),
                reason: format!("cannot load Go grammar: {e}"),
            })?;

        let tree = parser.parse(source, None).ok_or_else(|| Error::Scan {
            path: rel.to_path_buf(),
            reason: "parser returned no tree".to_string(),
        })?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(Error::Scan {
                path: rel.to_path_buf(),
                reason: "syntax error".to_string(),
            });
        }

        let mut mutants = Vec::new();
        self.walk_node(root, rel, source, &mut mutants);
        Ok(mutants)
    }

    fn walk_node(&self, node: Node, rel: &Path, source: &str, mutants: &mut Vec<Mutant>) {
        match node.kind() {
            "binary_expression" => {
                if let Some(op) = node.child_by_field_name("operator") {
                    let token = node_text(op, source);
                    self.emit(op, rel, token, catalog::binary_rewrites(token), mutants);
                }
            }
            "unary_expression" => {
                if let Some(op) = node.child_by_field_name("operator") {
                    let token = node_text(op, source);
                    self.emit(op, rel, token, catalog::unary_rewrites(token), mutants);
                }
            }
            "inc_statement" | "dec_statement" => {
                if let Some(op) = find_child_token(node, &["++", "--"]) {
                    let token = node_text(op, source);
                    self.emit(op, rel, token, catalog::inc_dec_rewrites(token), mutants);
                }
            }
            _ => {}
        }

        let child_count = node.child_count();
        for i in 0..child_count {
            if let Some(child) = node.child(i) {
                self.walk_node(child, rel, source, mutants);
            }
        }
    }

    /// One mutant per (kind, replacement) applicable at this token.
    fn emit(
        &self,
        token_node: Node,
        rel: &Path,
        token: &str,
        rewrites: Vec<Rewrite>,
        mutants: &mut Vec<Mutant>,
    ) {
        let line = token_node.start_position().row + 1;
        let column = token_node.start_position().column + 1;
        for rewrite in rewrites {
            if !self.enabled.contains(&rewrite.kind) {
                continue;
            }
            let status = if self.profile.covers(rel, line, column) {
                MutantStatus::Runnable
            } else {
                MutantStatus::NotCovered
            };
            mutants.push(Mutant::new(
                rewrite.kind,
                rel.to_path_buf(),
                line,
                column,
                token_node.start_byte(),
                token_node.end_byte(),
                token.to_string(),
                rewrite.replacement.to_string(),
                status,
            ));
        }
    }
}

fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.start_byte()..node.end_byte()]
}

fn find_child_token<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let count = node.child_count();
    for i in 0..count {
        if let Some(child) = node.child(i) {
            if kinds.contains(&child.kind()) {
                return Some(child);
            }
        }
    }
    None
}

fn collect_go_files(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Error> {
    let entries = fs::read_dir(dir).map_err(|e| Error::Scan {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::Scan {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let path = entry.path();
        if path.is_dir() {
            if name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref()) {
                continue;
            }
            collect_go_files(root, &path, files)?;
        } else if name.ends_with(".go") && !name.ends_with("_test.go") {
            if let Ok(rel) = path.strip_prefix(root) {
                files.push(rel.to_path_buf());
            }
        }
    }
    Ok(())
}
