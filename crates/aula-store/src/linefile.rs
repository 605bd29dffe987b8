//! Atomic line-record files.
//!
//! Each store file is a sequence of newline-terminated records. Every
//! mutation — including appends — rewrites the whole file through a sibling
//! temp file that is fsynced and renamed into place, then fsyncs the parent
//! directory. Readers therefore never observe a torn line, and a crash
//! leaves either the old file or the new one, nothing in between.

use crate::StoreError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct LineFile {
    path: PathBuf,
}

impl LineFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. An absent file reads as empty; blank lines are
    /// skipped.
    pub fn lines(&self) -> Result<Vec<String>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Append one record, keeping every existing line.
    pub fn append(&self, line: &str) -> Result<(), StoreError> {
        let mut lines = self.lines()?;
        lines.push(line.to_owned());
        self.write_all(&lines)
    }

    /// Remove every record matching the predicate. Returns the removed
    /// lines in file order; the file is rewritten only when something
    /// matched.
    pub fn remove_where<F>(&self, mut pred: F) -> Result<Vec<String>, StoreError>
    where
        F: FnMut(&str) -> bool,
    {
        let lines = self.lines()?;
        let (removed, kept): (Vec<String>, Vec<String>) =
            lines.into_iter().partition(|l| pred(l));
        if !removed.is_empty() {
            self.write_all(&kept)?;
        }
        Ok(removed)
    }

    /// Replace the whole file contents.
    pub fn write_all(&self, lines: &[String]) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StoreError::Io(std::io::Error::other("line file has no parent dir")))?;
        fs::create_dir_all(parent)?;

        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        crate::fsync_dir(parent)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, LineFile) {
        let dir = tempfile::tempdir().unwrap();
        let file = LineFile::new(dir.path().join("records.txt"));
        (dir, file)
    }

    #[test]
    fn absent_file_reads_empty() {
        let (_dir, file) = setup();
        assert!(file.lines().unwrap().is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let (_dir, file) = setup();
        file.append("first").unwrap();
        file.append("second").unwrap();
        file.append("third").unwrap();
        assert_eq!(file.lines().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn remove_where_returns_removed_lines() {
        let (_dir, file) = setup();
        file.append("keep-1").unwrap();
        file.append("drop-1").unwrap();
        file.append("keep-2").unwrap();
        file.append("drop-2").unwrap();

        let removed = file.remove_where(|l| l.starts_with("drop")).unwrap();
        assert_eq!(removed, vec!["drop-1", "drop-2"]);
        assert_eq!(file.lines().unwrap(), vec!["keep-1", "keep-2"]);
    }

    #[test]
    fn remove_where_no_match_leaves_file_untouched() {
        let (_dir, file) = setup();
        file.append("only").unwrap();
        let before = fs::read_to_string(file.path()).unwrap();

        let removed = file.remove_where(|_| false).unwrap();
        assert!(removed.is_empty());
        let after = fs::read_to_string(file.path()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn blank_lines_are_skipped_on_read() {
        let (_dir, file) = setup();
        fs::write(file.path(), "one\n\n  \ntwo\n").unwrap();
        assert_eq!(file.lines().unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn file_ends_with_newline() {
        let (_dir, file) = setup();
        file.append("a").unwrap();
        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "a\n");
    }

    #[test]
    fn write_all_replaces_contents() {
        let (_dir, file) = setup();
        file.append("old").unwrap();
        file.write_all(&["new-1".to_owned(), "new-2".to_owned()])
            .unwrap();
        assert_eq!(file.lines().unwrap(), vec!["new-1", "new-2"]);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let (dir, file) = setup();
        file.append("a").unwrap();
        file.append("b").unwrap();
        file.remove_where(|l| l == "a").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec!["records.txt"]);
    }
}
