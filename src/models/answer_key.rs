use serde::{Deserialize, Serialize};

/// 答案要点中的单个题目
///
/// `id` 不可变，其余字段可通过编辑替换。`question_number` 是自由文本标签，
/// 不要求是数字（例如 "3a"）。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub question_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    pub reference_answer: String,
    pub max_marks: u32,
    pub created_at: String,
}

/// 新增 / 编辑题目时的字段集合（不含 id 与时间戳）
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub question_number: String,
    pub question_text: Option<String>,
    pub reference_answer: String,
    pub max_marks: u32,
}

impl Question {
    /// 从草稿生成题目，分配新 ID 和创建时间
    pub fn from_draft(draft: QuestionDraft) -> Self {
        Self {
            id: super::new_record_id(),
            question_number: draft.question_number,
            question_text: draft.question_text,
            reference_answer: draft.reference_answer,
            max_marks: draft.max_marks,
            created_at: super::now_iso(),
        }
    }

    /// 用草稿替换可变字段（保留 id 与创建时间）
    pub fn apply_draft(&mut self, draft: QuestionDraft) {
        self.question_number = draft.question_number;
        self.question_text = draft.question_text;
        self.reference_answer = draft.reference_answer;
        self.max_marks = draft.max_marks;
    }
}

/// 科目的答案要点
///
/// 每个科目至多一条记录（仓库层 find-or-create 保证）。
/// `questions` 按插入顺序存储，展示顺序见 [`sort_for_display`]。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    pub id: String,
    pub subject_id: String,
    pub questions: Vec<Question>,
    pub created_at: String,
    pub updated_at: String,
}

impl AnswerKey {
    /// 为指定科目创建空的答案要点
    pub fn new(subject_id: impl Into<String>) -> Self {
        let now = super::now_iso();
        Self {
            id: super::new_record_id(),
            subject_id: subject_id.into(),
            questions: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// 题号排序键：题号标签的数字前缀
///
/// 没有数字前缀的标签取 0，排序时稳定保持原有相对顺序。
fn question_sort_key(label: &str) -> u64 {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// 按展示顺序排列题目（数字前缀升序，同键保持插入顺序）
pub fn sort_for_display(questions: &[Question]) -> Vec<Question> {
    let mut sorted = questions.to_vec();
    sorted.sort_by_key(|q| question_sort_key(&q.question_number));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(number: &str) -> Question {
        Question::from_draft(QuestionDraft {
            question_number: number.to_string(),
            question_text: None,
            reference_answer: "答案".to_string(),
            max_marks: 5,
        })
    }

    #[test]
    fn test_sort_by_numeric_prefix() {
        let questions = vec![question("2"), question("1"), question("3a")];
        let sorted = sort_for_display(&questions);
        let numbers: Vec<&str> = sorted.iter().map(|q| q.question_number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3a"]);
    }

    #[test]
    fn test_non_numeric_labels_keep_relative_order() {
        // 无数字前缀的题号取 0，稳定排序保持原有相对顺序
        let questions = vec![question("bonus"), question("extra"), question("1")];
        let sorted = sort_for_display(&questions);
        let numbers: Vec<&str> = sorted.iter().map(|q| q.question_number.as_str()).collect();
        assert_eq!(numbers, vec!["bonus", "extra", "1"]);
    }

    #[test]
    fn test_apply_draft_keeps_identity() {
        let mut q = question("1");
        let original_id = q.id.clone();
        let original_created = q.created_at.clone();
        q.apply_draft(QuestionDraft {
            question_number: "2".to_string(),
            question_text: Some("题干".to_string()),
            reference_answer: "新答案".to_string(),
            max_marks: 10,
        });
        assert_eq!(q.id, original_id);
        assert_eq!(q.created_at, original_created);
        assert_eq!(q.question_number, "2");
        assert_eq!(q.max_marks, 10);
    }
}
