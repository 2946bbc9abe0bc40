//! 实体仓库 - 业务能力层
//!
//! 基于集合存储的类型化访问器，负责维护各集合的不变式：
//! ID 唯一、subjectId 引用完整（删除科目时级联删除从属记录）、
//! 以及科目上派生计数器的重算。
//!
//! 仓库之间不共享事务：每次触发性写入之后立即重算并保存依赖集合，
//! 写入顺序为先写主记录、后写计数器持有方。每个读-改-写序列
//! （含计数器重算）全程持有存储写锁，并发写不会互相覆盖。

pub mod answer_key_repository;
pub mod subject_repository;
pub mod submission_repository;

pub use answer_key_repository::AnswerKeyRepository;
pub use subject_repository::SubjectRepository;
pub use submission_repository::{MergeStats, SubmissionRepository};
