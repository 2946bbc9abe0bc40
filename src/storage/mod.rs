//! 持久化存储 - 基础设施层
//!
//! 键 → 序列化集合的本地存储抽象。每个集合作为一个整体读写，
//! 跨集合一致性（派生计数器）由调用方在触发写入之后立即重算保证。
//!
//! 读取遵循 fail-closed 原则：键不存在或内容无法解析时返回空集合，
//! 调用方将"没有数据"视为合法的冷启动状态，而不是错误。

pub mod json_store;
pub mod memory;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{AppResult, StorageError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::MutexGuard;
use tracing::warn;

/// 三个持久化集合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Subjects,
    AnswerKeys,
    Submissions,
}

impl Collection {
    /// 集合的存储键（与原有本地存储的键保持一致）
    pub fn key(self) -> &'static str {
        match self {
            Collection::Subjects => "subjects",
            Collection::AnswerKeys => "answerKeys",
            Collection::Submissions => "studentSubmissions",
        }
    }
}

/// 集合存储接口
///
/// 实现方只负责按键读写完整的序列化文本，类型化的编解码由
/// [`load_collection`] / [`save_collection`] 完成。
pub trait CollectionStore: Send + Sync {
    /// 读取集合的序列化内容，不存在时返回 None
    fn read(&self, collection: Collection) -> Option<String>;

    /// 整体覆盖写入集合（调用方视角下原子生效）
    fn write(&self, collection: Collection, payload: &str) -> AppResult<()>;

    /// 获取本存储的写互斥锁
    ///
    /// 读-改-写序列（load → 修改 → save，含随后的计数器重算）必须
    /// 全程持有该锁，否则并发写会互相覆盖丢失更新。纯读取不需要。
    fn write_lock(&self) -> MutexGuard<'_, ()>;
}

/// 读取并反序列化集合
///
/// # 返回
/// 键不存在或解析失败时返回空集合（fail-closed），解析失败会记录告警
pub fn load_collection<T: DeserializeOwned>(
    store: &dyn CollectionStore,
    collection: Collection,
) -> Vec<T> {
    let Some(payload) = store.read(collection) else {
        return Vec::new();
    };

    match serde_json::from_str(&payload) {
        Ok(records) => records,
        Err(e) => {
            warn!(
                "⚠️ 集合 {} 内容无法解析，按空集合处理: {}",
                collection.key(),
                e
            );
            Vec::new()
        }
    }
}

/// 序列化并整体写入集合
pub fn save_collection<T: Serialize>(
    store: &dyn CollectionStore,
    collection: Collection,
    records: &[T],
) -> AppResult<()> {
    let payload = serde_json::to_string(records).map_err(|e| {
        crate::error::AppError::Storage(StorageError::SerializeFailed {
            key: collection.key().to_string(),
            source: Box::new(e),
        })
    })?;
    store.write(collection, &payload)
}
