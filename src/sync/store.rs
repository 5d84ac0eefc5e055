use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::core::path::normalize_path;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} is outside the workspace")]
    OutsideRoot(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn io(path: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path.to_string())
        } else {
            Self::Io {
                path: path.to_string(),
                source,
            }
        }
    }
}

/// A child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Normalized workspace-relative path.
    pub path: String,
    pub name: String,
    pub is_dir: bool,
}

/// Where documents live. Paths are workspace-relative strings; directory
/// segments match case-insensitively.
pub trait DocumentStore {
    fn read(&self, path: &str) -> impl Future<Output = Result<String, StoreError>> + Send;

    fn write(&self, path: &str, text: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Direct children of a directory, sorted by name. Hidden entries are
    /// skipped.
    fn list(&self, dir: &str) -> impl Future<Output = Result<Vec<FileEntry>, StoreError>> + Send;
}

/// Documents on the local filesystem under a workspace root.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a workspace path onto disk, matching each existing segment
    /// case-insensitively. Missing segments keep the caller's spelling.
    /// Paths that would leave the root are refused.
    async fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let unified = path.trim().replace('\\', "/");
        let segments: Vec<&str> = unified
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        if segments.contains(&"..") {
            return Err(StoreError::OutsideRoot(path.to_string()));
        }

        let mut resolved = self.root.clone();
        for segment in segments {
            let exact = resolved.join(segment);
            if tokio::fs::try_exists(&exact).await.unwrap_or(false) {
                resolved = exact;
                continue;
            }
            resolved = match find_case_insensitive(&resolved, segment).await {
                Some(name) => resolved.join(name),
                None => exact,
            };
        }
        Ok(resolved)
    }
}

async fn find_case_insensitive(dir: &Path, segment: &str) -> Option<String> {
    let wanted = segment.to_lowercase();
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.to_lowercase() == wanted {
            return Some(name);
        }
    }
    None
}

impl DocumentStore for FsStore {
    async fn read(&self, path: &str) -> Result<String, StoreError> {
        let file = self.resolve(path).await?;
        tokio::fs::read_to_string(&file)
            .await
            .map_err(|e| StoreError::io(path, e))
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), StoreError> {
        let file = self.resolve(path).await?;
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(path, e))?;
        }
        tokio::fs::write(&file, text)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        log::debug!("Wrote {}", file.display());
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<FileEntry>, StoreError> {
        let resolved = self.resolve(dir).await?;
        let mut entries = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|e| StoreError::io(dir, e))?;

        let prefix = dir.trim().replace('\\', "/");
        let prefix = prefix.trim_matches('/');
        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(dir, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            let Some(path) = normalize_path(&format!("{prefix}/{name}")) else {
                continue;
            };
            out.push(FileEntry { path, name, is_dir });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

/// Documents held in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    // Case-folded path -> (path as first written, text).
    files: Mutex<BTreeMap<String, (String, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from `(path, text)` pairs.
    pub fn with_files<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let store = Self::new();
        if let Ok(mut map) = store.files.lock() {
            for (path, text) in files {
                if let Some(key) = fold(path) {
                    map.insert(key, (unify(path), text.to_string()));
                }
            }
        }
        store
    }

    /// Current text of a file, if present.
    pub fn get(&self, path: &str) -> Option<String> {
        let key = fold(path)?;
        let files = self.files.lock().ok()?;
        files.get(&key).map(|(_, text)| text.clone())
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn unify(path: &str) -> String {
    path.trim().replace('\\', "/").trim_matches('/').to_string()
}

fn fold(path: &str) -> Option<String> {
    normalize_path(path).map(|p| p.trim_start_matches('/').to_lowercase())
}

fn poisoned(path: &str) -> StoreError {
    StoreError::Io {
        path: path.to_string(),
        source: std::io::Error::other("memory store lock poisoned"),
    }
}

impl DocumentStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<String, StoreError> {
        let key = fold(path).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let files = self.files.lock().map_err(|_| poisoned(path))?;
        files
            .get(&key)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, text: &str) -> Result<(), StoreError> {
        let key = fold(path).ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let mut files = self.files.lock().map_err(|_| poisoned(path))?;
        files
            .entry(key)
            .and_modify(|(_, existing)| *existing = text.to_string())
            .or_insert_with(|| (unify(path), text.to_string()));
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<FileEntry>, StoreError> {
        let prefix = fold(dir).map(|d| format!("{d}/")).unwrap_or_default();
        let depth = prefix.matches('/').count();
        let files = self.files.lock().map_err(|_| poisoned(dir))?;

        let mut children: BTreeMap<String, FileEntry> = BTreeMap::new();
        for (key, (original, _)) in files.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            let segments: Vec<&str> = original.split('/').collect();
            let Some(name) = segments.get(depth) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let is_dir = segments.len() > depth + 1;
            let Some(path) = normalize_path(&segments[..=depth].join("/")) else {
                continue;
            };
            children.entry(name.to_lowercase()).or_insert(FileEntry {
                path,
                name: name.to_string(),
                is_dir,
            });
        }

        if children.is_empty() && !prefix.is_empty() {
            return Err(StoreError::NotFound(dir.to_string()));
        }
        let mut out: Vec<FileEntry> = children.into_values().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}
