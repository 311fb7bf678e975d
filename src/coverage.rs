use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Error;
use crate::gomodule::GoModule;
use crate::toolchain::Toolchain;

/// Half-open source range executed at least once by the test suite.
/// Inclusive on its start, exclusive on its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Block {
    pub fn contains(&self, line: usize, col: usize) -> bool {
        let after_start =
            line > self.start_line || (line == self.start_line && col >= self.start_col);
        let before_end = line < self.end_line || (line == self.end_line && col < self.end_col);
        after_start && before_end
    }
}

/// Executed source regions, keyed by file path relative to the package dir.
/// Blocks with zero execution count never make it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    files: HashMap<PathBuf, Vec<Block>>,
}

impl Profile {
    /// The only query used downstream: is this position inside some
    /// executed block of the file?
    pub fn covers(&self, path: &Path, line: usize, col: usize) -> bool {
        self.files
            .get(path)
            .map(|blocks| blocks.iter().any(|b| b.contains(line, col)))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn blocks(&self, path: &Path) -> &[Block] {
        self.files.get(path).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Parse the standard Go coverprofile format: a `mode:` header, then one
/// line per basic block as `filepath:sl.sc,el.ec numStatements count`.
/// File paths are normalized by stripping the module name and re-rooting
/// on the package dir.
pub fn parse_profile(source: &str, module: &GoModule) -> Result<Profile, Error> {
    let mut lines = source.lines();
    match lines.next() {
        Some(header) if header.trim_start().starts_with("mode:") => {}
        _ => {
            return Err(Error::Coverage(
                "coverage report is missing the mode header".to_string(),
            ))
        }
    }

    let mut files: HashMap<PathBuf, Vec<Block>> = HashMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (file, block, count) = parse_block_line(line)?;
        if count == 0 {
            continue;
        }
        let rel = normalize_path(&file, module);
        files.entry(rel).or_default().push(block);
    }

    Ok(Profile { files })
}

fn parse_block_line(line: &str) -> Result<(String, Block, u64), Error> {
    let malformed = || Error::Coverage(format!("malformed coverage line: {line}"));

    let (file, rest) = line.rsplit_once(':').ok_or_else(|| malformed())?;
    let mut fields = rest.split_whitespace();
    let range = fields.next().ok_or_else(|| malformed())?;
    let _num_statements = fields.next().ok_or_else(|| malformed())?;
    let count: u64 = fields
        .next()
        .and_then(|c| c.parse().ok())
        .ok_or_else(|| malformed())?;

    let (start, end) = range.split_once(',').ok_or_else(|| malformed())?;
    let (start_line, start_col) = parse_position(start).ok_or_else(|| malformed())?;
    let (end_line, end_col) = parse_position(end).ok_or_else(|| malformed())?;
    if start_line > end_line {
        return Err(malformed());
    }

    Ok((
        file.to_string(),
        Block {
            start_line,
            start_col,
            end_line,
            end_col,
        },
        count,
    ))
}

fn parse_position(s: &str) -> Option<(usize, usize)> {
    let (line, col) = s.split_once('.')?;
    Some((line.parse().ok()?, col.parse().ok()?))
}

/// Coverprofile paths are module-qualified, e.g.
/// `example.com/demo/pkg/calc/calc.go`. Strip the module name, then make
/// the remainder relative to the package dir.
fn normalize_path(file: &str, module: &GoModule) -> PathBuf {
    let prefix = format!("{}/", module.name);
    let in_module = file.strip_prefix(&prefix).unwrap_or(file);
    let path = Path::new(in_module);
    if module.pkg_dir == Path::new(".") {
        return path.to_path_buf();
    }
    path.strip_prefix(&module.pkg_dir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Result of the coverage phase: the profile plus how long the instrumented
/// test run took, which later seeds the per-mutant timeout.
#[derive(Debug)]
pub struct CoverageRun {
    pub profile: Profile,
    pub elapsed: Duration,
}

/// Runs the instrumented test suite via the toolchain and parses the
/// resulting report.
pub struct Coverage<'a> {
    toolchain: &'a dyn Toolchain,
    workdir: &'a Path,
    module: &'a GoModule,
    tags: &'a str,
}

const PROFILE_FILE_NAME: &str = "coverage";

impl<'a> Coverage<'a> {
    pub fn new(
        toolchain: &'a dyn Toolchain,
        workdir: &'a Path,
        module: &'a GoModule,
        tags: &'a str,
    ) -> Self {
        Coverage {
            toolchain,
            workdir,
            module,
            tags,
        }
    }

    /// Dependencies are downloaded in a separate step first, so the
    /// measured elapsed time reflects the test run alone.
    pub fn run(&self) -> Result<CoverageRun, Error> {
        let pkg_root = self.module.pkg_root();
        self.toolchain
            .download_dependencies(&pkg_root)
            .map_err(|e| Error::Coverage(e.to_string()))?;

        let profile_path = self.workdir.join(PROFILE_FILE_NAME);
        let elapsed = self
            .toolchain
            .run_tests_with_coverage(&pkg_root, self.tags, &profile_path)
            .map_err(|e| Error::Coverage(e.to_string()))?;

        let contents = fs::read_to_string(&profile_path)
            .map_err(|e| Error::Coverage(format!("cannot read coverage report: {e}")))?;
        let profile = parse_profile(&contents, self.module)?;

        Ok(CoverageRun { profile, elapsed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> GoModule {
        GoModule {
            name: "example.com/demo".to_string(),
            root: PathBuf::from("/src/demo"),
            pkg_dir: PathBuf::from("."),
        }
    }

    #[test]
    fn parse_drops_zero_count_blocks() {
        let report = "mode: set\n\
                      example.com/demo/calc.go:3.10,5.2 1 1\n\
                      example.com/demo/calc.go:7.10,9.2 1 0\n";
        let profile = parse_profile(report, &module()).unwrap();
        assert_eq!(profile.blocks(Path::new("calc.go")).len(), 1);
    }

    #[test]
    fn parse_requires_mode_header() {
        let err = parse_profile("example.com/demo/calc.go:3.10,5.2 1 1\n", &module()).unwrap_err();
        assert!(err.to_string().contains("mode header"));
    }

    #[test]
    fn parse_rejects_malformed_lines() {
        let err = parse_profile("mode: set\nnot a block line\n", &module()).unwrap_err();
        assert!(err.to_string().contains("malformed"));
    }

    #[test]
    fn paths_are_stripped_of_module_and_pkg_dir() {
        let m = GoModule {
            name: "example.com/demo".to_string(),
            root: PathBuf::from("/src/demo"),
            pkg_dir: PathBuf::from("pkg/calc"),
        };
        let report = "mode: count\nexample.com/demo/pkg/calc/calc.go:3.10,5.2 1 7\n";
        let profile = parse_profile(report, &m).unwrap();
        assert!(profile.covers(Path::new("calc.go"), 4, 1));
    }

    #[test]
    fn covers_is_inclusive_start_exclusive_end() {
        let report = "mode: set\nexample.com/demo/calc.go:3.10,5.2 1 1\n";
        let profile = parse_profile(report, &module()).unwrap();
        let p = Path::new("calc.go");
        assert!(profile.covers(p, 3, 10));
        assert!(profile.covers(p, 4, 1));
        assert!(profile.covers(p, 5, 1));
        assert!(!profile.covers(p, 5, 2));
        assert!(!profile.covers(p, 3, 9));
        assert!(!profile.covers(p, 6, 1));
    }

    #[test]
    fn covers_unknown_file_is_false() {
        let profile = parse_profile("mode: set\n", &module()).unwrap();
        assert!(!profile.covers(Path::new("missing.go"), 1, 1));
    }

    #[test]
    fn reparsing_equivalent_report_yields_equal_profile() {
        let report = "mode: set\n\
                      example.com/demo/a.go:1.1,3.2 2 5\n\
                      example.com/demo/b.go:10.5,12.2 1 1\n";
        let first = parse_profile(report, &module()).unwrap();
        let second = parse_profile(report, &module()).unwrap();
        assert_eq!(first, second);
    }
}
