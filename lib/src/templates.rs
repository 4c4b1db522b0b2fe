// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Canned assembly fragments
//!
//! Fragments live under a template root, e.g. `<root>/env/trans/trap.text.S`. Each non-empty
//! line of a fragment becomes one literal [`AsmLine`], with surrounding whitespace removed.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::blocks::BlockError;
use crate::isa::AsmLine;

/// Directory below the template root holding the transient-execution fragments
pub const TRANS_DIR: &str = "env/trans";

/// Root directory of the canned fragments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDir {
    root: PathBuf,
}

impl TemplateDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the fragment `<TRANS_DIR>/<file>` under this root.
    pub fn fragment(&self, file: &str) -> PathBuf {
        self.root.join(TRANS_DIR).join(file)
    }

    /// Read the fragment `<TRANS_DIR>/<file>`.
    pub fn load(&self, file: &str) -> Result<Vec<AsmLine>, BlockError> {
        let path = self.fragment(file);
        let contents = fs::read_to_string(&path).map_err(|source| BlockError::Template {
            path: path.clone(),
            source,
        })?;

        let lines: Vec<AsmLine> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(AsmLine::raw)
            .collect();

        crate::log::trace!(path = %path.display(), lines = lines.len(), "Loaded template");

        Ok(lines)
    }
}

impl Default for TemplateDir {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load_trims_and_skips_blank_lines() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(TRANS_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("trap.text.S"), "  csrr t0, mcause\n\n\tmret  \n   \n").unwrap();

        let templates = TemplateDir::new(root.path());
        let lines = templates.load("trap.text.S").unwrap();
        assert_eq!(
            lines,
            vec![AsmLine::raw("csrr t0, mcause"), AsmLine::raw("mret")]
        );
    }

    #[test]
    fn test_missing_fragment_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let templates = TemplateDir::new(root.path());

        match templates.load("exit.text.S") {
            Err(BlockError::Template { path, source }) => {
                assert_eq!(path, root.path().join("env/trans/exit.text.S"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("Unexpected result {other:?}"),
        }
    }
}
