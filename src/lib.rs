//! # Paper Grader
//!
//! 答卷批量评分的本地数据核心：科目、答案要点、学生答卷三个集合的
//! 持久化模型，以及把待评分答卷批量派发给外部评分服务并合并结果的
//! 协调流程。渲染、OCR 与相似度算法均不在本 crate 内。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Storage）
//! - `storage/` - 键 → 序列化集合的存储抽象
//! - `JsonFileStore` - 本地 JSON 文件实现；`MemoryStore` - 测试用内存实现
//!
//! ### ② 业务能力层（Repositories / Services）
//! - `repositories/` - 各集合的类型化访问器，维护 ID 唯一、引用完整、
//!   派生计数器等不变式
//! - `services/upload_service` - 上传暂存区（草稿 → 编码 → 落库）
//!
//! ### ③ 外部协作层（Clients）
//! - `clients/grading_client` - 评分服务协议与 HTTP 客户端
//! - `GradingBackend` - 评分能力接口，测试中注入假实现
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/grading_orchestrator` - 批次前置条件、每科目互斥、
//!   失败回滚与结果合并
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod utils;

// 重新导出常用类型
pub use clients::{BatchGradeRequest, BatchGradeResponse, GradingBackend, HttpGradingClient};
pub use config::Config;
pub use error::{AppError, AppResult, GradingError, GradingPrecondition};
pub use models::{
    AnswerKey, Question, QuestionDraft, QuestionResult, Subject, Submission, SubmissionDraft,
    SubmissionStatus,
};
pub use orchestrator::{BatchOutcome, GradingOrchestrator};
pub use repositories::{AnswerKeyRepository, SubjectRepository, SubmissionRepository};
pub use services::UploadStage;
pub use storage::{Collection, CollectionStore, JsonFileStore, MemoryStore};
