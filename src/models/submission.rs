use serde::{Deserialize, Serialize};

/// 答卷状态
///
/// `Processing` 只在批次进行期间短暂存在；任何失败路径都必须把受影响的
/// 答卷恢复为 `Uploaded`，不允许停留在 `Processing`。`Graded` 不可再转出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Uploaded,
    Processing,
    Graded,
}

/// 评分服务返回的单题结果（原样存储，不做重算）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_number: String,
    pub marks: f64,
    pub max_marks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// 学生答卷记录
///
/// 评分字段（totalMarks / maxMarks / percentage / questionResults）在
/// `status = graded` 之前一律缺失，一旦写入即整体写入，绝不部分填充。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub subject_id: String,
    pub student_name: String,
    pub file_name: String,
    /// base64 data URL 编码的图片 / PDF 内容
    pub file_data: String,
    pub uploaded_at: String,
    pub status: SubmissionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_marks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_results: Option<Vec<QuestionResult>>,
}

/// 提交前的答卷草稿（已编码，待持久化）
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub student_name: String,
    pub file_name: String,
    pub file_data: String,
}

impl Submission {
    /// 从草稿生成答卷记录，状态为 `Uploaded`
    pub fn from_draft(subject_id: &str, draft: SubmissionDraft) -> Self {
        Self {
            id: super::new_record_id(),
            subject_id: subject_id.to_string(),
            student_name: draft.student_name,
            file_name: draft.file_name,
            file_data: draft.file_data,
            uploaded_at: super::now_iso(),
            status: SubmissionStatus::Uploaded,
            total_marks: None,
            max_marks: None,
            percentage: None,
            question_results: None,
        }
    }

    /// 答卷是否还未评分（可进入批次）
    pub fn is_ungraded(&self) -> bool {
        self.status == SubmissionStatus::Uploaded
    }
}
