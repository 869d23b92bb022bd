use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::error::LoadError;
use super::loader::{load_file_with, LoadOptions};
use super::model::MaintenanceDataset;

/// What identifies one version of a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|e| LoadError::file_access(path, e))?;
        Ok(FileStamp {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

struct CachedDataset {
    stamp: FileStamp,
    dataset: Arc<MaintenanceDataset>,
}

/// Memoizes loaded datasets by path, reloading when the file changes.
pub struct DatasetCache {
    options: LoadOptions,
    entries: HashMap<PathBuf, CachedDataset>,
}

impl DatasetCache {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            entries: HashMap::new(),
        }
    }

    /// Return the cached dataset if the file is unchanged, otherwise load it.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<MaintenanceDataset>, LoadError> {
        let key = std::fs::canonicalize(path).map_err(|e| LoadError::file_access(path, e))?;
        let stamp = FileStamp::read(&key)?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.stamp == stamp {
                log::debug!("dataset cache hit for {}", key.display());
                return Ok(Arc::clone(&entry.dataset));
            }
            log::info!("{} changed on disk, reloading", key.display());
        }

        let dataset = Arc::new(load_file_with(&key, &self.options)?);
        self.entries.insert(
            key,
            CachedDataset {
                stamp,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    /// Forget `path` so the next request re-reads it.
    pub fn invalidate(&mut self, path: &Path) {
        let key = cache_key(path);
        self.entries.remove(&key);
    }

    /// Drop every entry except the one for `path`.
    pub fn retain_only(&mut self, path: &Path) {
        let key = cache_key(path);
        let before = self.entries.len();
        self.entries.retain(|k, _| *k == key);
        if self.entries.len() < before {
            log::debug!("evicted {} cached dataset(s)", before - self.entries.len());
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const V1: &str = "Equipo,GOT CBM (USD)\nEQ-1,10\n";
    const V2: &str = "Equipo,GOT CBM (USD)\nEQ-1,10\nEQ-2,2500\n";

    #[test]
    fn unchanged_file_is_served_from_cache() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gastos.csv");
        std::fs::write(&path, V1).expect("write");

        let mut cache = DatasetCache::new(LoadOptions::default());
        let a = cache.get_or_load(&path).expect("first load");
        let b = cache.get_or_load(&path).expect("second load");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_file_is_reloaded() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gastos.csv");
        std::fs::write(&path, V1).expect("write");

        let mut cache = DatasetCache::new(LoadOptions::default());
        let a = cache.get_or_load(&path).expect("first load");
        std::fs::write(&path, V2).expect("rewrite");
        let b = cache.get_or_load(&path).expect("reload");

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("gastos.csv");
        std::fs::write(&path, V1).expect("write");

        let mut cache = DatasetCache::new(LoadOptions::default());
        let a = cache.get_or_load(&path).expect("load");
        cache.invalidate(&path);
        assert!(cache.is_empty());
        let b = cache.get_or_load(&path).expect("reload");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }

    #[test]
    fn only_the_current_file_stays_cached() {
        let dir = tempdir().expect("tempdir");
        let first = dir.path().join("a.csv");
        let second = dir.path().join("b.csv");
        std::fs::write(&first, V1).expect("write");
        std::fs::write(&second, V2).expect("write");

        let mut cache = DatasetCache::new(LoadOptions::default());
        cache.get_or_load(&first).expect("load a");
        let b = cache.get_or_load(&second).expect("load b");
        assert_eq!(cache.len(), 2);

        cache.retain_only(&second);
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&b, &cache.get_or_load(&second).expect("cached b")));
    }

    #[test]
    fn missing_file_is_not_cached() {
        let dir = tempdir().expect("tempdir");
        let mut cache = DatasetCache::new(LoadOptions::default());
        let err = cache.get_or_load(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::FileAccess { .. }));
        assert!(cache.is_empty());
    }
}
