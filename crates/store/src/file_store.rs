//! Book directory and chapter file management
//!
//! Layout: `<root>/<sanitized title>/<n>. <sanitized chapter>.mp3`,
//! chapters numbered from 1 in list order.

use crate::error::{StoreError, StoreResult};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Creates, fills, and removes per-book directories under a fixed root
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// `root` is the application documents directory, injected by the
    /// composition root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a book's chapters land in
    pub fn book_directory(&self, title: &str) -> PathBuf {
        self.root.join(sanitize_title(title))
    }

    /// Creates the book directory if absent. Idempotent.
    pub fn create_book_directory(&self, title: &str) -> StoreResult<PathBuf> {
        let dir = self.book_directory(title);
        fs::create_dir_all(&dir).map_err(|e| StoreError::DirectoryCreate {
            path: dir.clone(),
            source: e,
        })?;
        Ok(dir)
    }

    /// Removes the book directory tree. Absence is not an error.
    pub fn delete_book_directory(&self, title: &str) -> StoreResult<()> {
        let dir = self.book_directory(title);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| StoreError::DirectoryDelete {
                path: dir.clone(),
                source: e,
            })?;
            log::debug!("removed book directory {}", dir.display());
        }
        Ok(())
    }

    /// `"<n>. <name>.mp3"` with path-hostile characters replaced
    pub fn chapter_file_name(index: usize, name: &str) -> String {
        format!("{}. {}.mp3", index, sanitize_chapter_name(name))
    }

    /// Atomically moves a finished transfer into the book directory.
    ///
    /// The rename is atomic, so a reader never observes a mix of old
    /// and new bytes at the destination path.
    pub fn commit_chapter(
        &self,
        temp: NamedTempFile,
        dir: &Path,
        index: usize,
        name: &str,
    ) -> StoreResult<PathBuf> {
        let path = dir.join(Self::chapter_file_name(index, name));
        temp.persist(&path).map_err(|e| StoreError::Write {
            path: path.clone(),
            source: e.error,
        })?;
        Ok(path)
    }
}

fn sanitize_title(title: &str) -> String {
    title.replace('/', "-")
}

fn sanitize_chapter_name(name: &str) -> String {
    name.replace(['/', ':'], "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().expect("temp dir");
        let store = FileStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_create_book_directory() {
        let (_root, store) = store();
        let dir = store.create_book_directory("The Stand").expect("create");
        assert!(dir.is_dir());
        assert!(dir.ends_with("The Stand"));
    }

    #[test]
    fn test_create_is_idempotent() {
        let (_root, store) = store();
        let first = store.create_book_directory("Dune").expect("create");
        let second = store.create_book_directory("Dune").expect("create again");
        assert_eq!(first, second);
    }

    #[test]
    fn test_title_slash_sanitized() {
        let (_root, store) = store();
        let dir = store.create_book_directory("Fall of/Empire").expect("create");
        assert!(dir.ends_with("Fall of-Empire"));
    }

    #[test]
    fn test_delete_book_directory() {
        let (_root, store) = store();
        let dir = store.create_book_directory("Dune").expect("create");
        std::fs::write(dir.join("1. Intro.mp3"), b"bytes").expect("write");

        store.delete_book_directory("Dune").expect("delete");
        assert!(!dir.exists());
    }

    #[test]
    fn test_delete_missing_directory_is_ok() {
        let (_root, store) = store();
        assert!(store.delete_book_directory("Never Created").is_ok());
    }

    #[test]
    fn test_chapter_file_name() {
        assert_eq!(
            FileStore::chapter_file_name(3, "The Long Road"),
            "3. The Long Road.mp3"
        );
    }

    #[test]
    fn test_chapter_file_name_sanitizes_slash_and_colon() {
        assert_eq!(
            FileStore::chapter_file_name(1, "Part 1: Before/After"),
            "1. Part 1- Before-After.mp3"
        );
    }

    #[test]
    fn test_commit_chapter_moves_bytes_into_place() {
        let (_root, store) = store();
        let dir = store.create_book_directory("Dune").expect("create");

        let mut temp = NamedTempFile::new_in(store.root()).expect("temp");
        temp.write_all(b"chapter audio").expect("write temp");
        let temp_path = temp.path().to_path_buf();

        let path = store
            .commit_chapter(temp, &dir, 1, "Intro")
            .expect("commit");

        assert_eq!(path, dir.join("1. Intro.mp3"));
        assert_eq!(std::fs::read(&path).expect("read"), b"chapter audio");
        assert!(!temp_path.exists());
    }

    #[test]
    fn test_commit_chapter_overwrites_existing() {
        let (_root, store) = store();
        let dir = store.create_book_directory("Dune").expect("create");
        std::fs::write(dir.join("1. Intro.mp3"), b"old bytes").expect("seed");

        let mut temp = NamedTempFile::new_in(store.root()).expect("temp");
        temp.write_all(b"new bytes").expect("write temp");

        let path = store
            .commit_chapter(temp, &dir, 1, "Intro")
            .expect("commit");
        assert_eq!(std::fs::read(&path).expect("read"), b"new bytes");
    }
}
