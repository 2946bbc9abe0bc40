//! 编排层
//!
//! 批量评分的顶层协调：前置条件检查、批次互斥、请求构建、
//! 以及把部分成功的结果安全地合并回本地存储。

pub mod grading_orchestrator;

pub use grading_orchestrator::{BatchOutcome, GradingOrchestrator};
