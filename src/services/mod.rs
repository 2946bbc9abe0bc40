//! 业务能力层
//!
//! 目前只有上传暂存区：上传是一个独立的子流程，文件先在客户端
//! 暂存为草稿，确认后一次性编码并提交。

pub mod upload_service;

pub use upload_service::{CommitOutcome, DraftStatus, UploadDraft, UploadStage};
