//! File access for bulk loads and backups.
//!
//! Role definition files and flag backups are read through [`FileSource`] so
//! tests and embedders can supply their own storage. [`LocalFiles`] reads the
//! local file system.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Source of JSON files.
pub trait FileSource: Send + Sync {
    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// List the `*.json` files directly inside `dir`, sorted by name.
    fn list_json_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// Local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list_json_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| Error::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?;
            let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
            if entry.file_type().is_file() && is_json {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Read and parse a JSON file.
pub fn load_json<T: DeserializeOwned>(files: &dyn FileSource, path: &Path) -> Result<T> {
    let text = files.read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}
