/// 基于 JSON 文件的集合存储
///
/// 每个集合对应数据目录下的一个 `<key>.json` 文件。写入先落到临时文件
/// 再重命名，避免读取方看到写了一半的内容。
use crate::error::{AppError, AppResult, StorageError};
use crate::storage::{Collection, CollectionStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// JSON 文件存储
pub struct JsonFileStore {
    dir: PathBuf,
    write_gate: Mutex<()>,
}

impl JsonFileStore {
    /// 创建指向数据目录的存储
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_gate: Mutex::new(()),
        }
    }

    fn path_for(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.key()))
    }
}

impl CollectionStore for JsonFileStore {
    fn read(&self, collection: Collection) -> Option<String> {
        fs::read_to_string(self.path_for(collection)).ok()
    }

    fn write(&self, collection: Collection, payload: &str) -> AppResult<()> {
        let write_failed = |e: std::io::Error| {
            AppError::Storage(StorageError::WriteFailed {
                key: collection.key().to_string(),
                source: Box::new(e),
            })
        };

        fs::create_dir_all(&self.dir).map_err(write_failed)?;

        // 先写临时文件再重命名
        let target = self.path_for(collection);
        let tmp = self.dir.join(format!("{}.json.tmp", collection.key()));
        fs::write(&tmp, payload).map_err(write_failed)?;
        fs::rename(&tmp, &target).map_err(write_failed)?;

        Ok(())
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{load_collection, save_collection};
    use crate::models::Subject;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.write(Collection::Subjects, "[]").unwrap();
        assert_eq!(store.read(Collection::Subjects).as_deref(), Some("[]"));
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.read(Collection::AnswerKeys).is_none());
    }

    #[test]
    fn test_round_trip_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::new(dir.path());
            let subjects = vec![Subject::new("生物", Some("期末".to_string()), "#10b981")];
            save_collection(&store, Collection::Subjects, &subjects).unwrap();
        }

        // 重新打开同一目录，数据应仍然可读
        let store = JsonFileStore::new(dir.path());
        let loaded: Vec<Subject> = load_collection(&store, Collection::Subjects);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "生物");
    }

    #[test]
    fn test_corrupt_file_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(dir.path().join("subjects.json"), "不是JSON").unwrap();

        let loaded: Vec<Subject> = load_collection(&store, Collection::Subjects);
        assert!(loaded.is_empty());
    }
}
