/// 内存集合存储
///
/// 不落盘，用于测试和上层注入假存储以断言写入前后的集合内容。
use crate::error::AppResult;
use crate::storage::{Collection, CollectionStore};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// 内存存储
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<Collection, String>>,
    write_gate: Mutex<()>,
}

impl MemoryStore {
    /// 创建空的内存存储
    pub fn new() -> Self {
        Self::default()
    }
}

impl CollectionStore for MemoryStore {
    fn read(&self, collection: Collection) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&collection)
            .cloned()
    }

    fn write(&self, collection: Collection, payload: &str) -> AppResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(collection, payload.to_string());
        Ok(())
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().unwrap_or_else(|e| e.into_inner())
    }
}
