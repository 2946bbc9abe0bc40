//! 数据模型
//!
//! 三个持久化集合对应的记录类型：科目（Subject）、答案要点（AnswerKey）、
//! 学生答卷（Submission）。所有字段按 camelCase 序列化，时间戳统一为
//! ISO-8601 字符串。

pub mod answer_key;
pub mod subject;
pub mod submission;

pub use answer_key::{AnswerKey, Question, QuestionDraft};
pub use subject::Subject;
pub use submission::{QuestionResult, Submission, SubmissionDraft, SubmissionStatus};

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SEQ: AtomicU64 = AtomicU64::new(0);

/// 生成进程内唯一的记录 ID
///
/// # 返回
/// 毫秒时间戳加进程内自增序号，保证同一进程内不重复
pub fn new_record_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", millis, seq)
}

/// 当前时间的 ISO-8601 字符串
pub fn now_iso() -> String {
    chrono::Utc::now()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_are_unique() {
        let ids: Vec<String> = (0..100).map(|_| new_record_id()).collect();
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len(), "记录 ID 不应重复");
    }
}
