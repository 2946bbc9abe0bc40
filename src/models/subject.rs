use serde::{Deserialize, Serialize};

/// 科目记录
///
/// `question_count` 和 `student_count` 是派生缓存字段，权威值由
/// 答案要点与答卷两个集合重新统计得出，任何相关写入之后都必须重算并持久化。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    pub created_at: String,
    pub question_count: usize,
    pub student_count: usize,
}

impl Subject {
    /// 创建新科目（计数器清零，分配 ID 和时间戳）
    pub fn new(name: impl Into<String>, description: Option<String>, color: impl Into<String>) -> Self {
        Self {
            id: super::new_record_id(),
            name: name.into(),
            description,
            color: color.into(),
            created_at: super::now_iso(),
            question_count: 0,
            student_count: 0,
        }
    }
}
