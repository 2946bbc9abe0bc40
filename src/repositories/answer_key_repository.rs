/// 答案要点仓库
///
/// 每个科目至多一条答案要点记录：首次添加题目时 find-or-create，
/// 不允许出现同一科目的重复记录。每次写入之后重算科目计数器。
use crate::error::{AppError, AppResult, ValidationError};
use crate::models::answer_key::sort_for_display;
use crate::models::{AnswerKey, Question, QuestionDraft, Subject};
use crate::repositories::subject_repository::recompute_counters;
use crate::storage::{load_collection, save_collection, Collection, CollectionStore};
use std::sync::Arc;
use tracing::info;

/// 答案要点仓库
#[derive(Clone)]
pub struct AnswerKeyRepository {
    store: Arc<dyn CollectionStore>,
}

impl AnswerKeyRepository {
    /// 创建新的答案要点仓库
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// 查找科目的答案要点
    pub fn find_for_subject(&self, subject_id: &str) -> Option<AnswerKey> {
        let keys: Vec<AnswerKey> = load_collection(self.store.as_ref(), Collection::AnswerKeys);
        keys.into_iter().find(|ak| ak.subject_id == subject_id)
    }

    /// 按展示顺序返回科目的全部题目
    pub fn questions_sorted(&self, subject_id: &str) -> Vec<Question> {
        self.find_for_subject(subject_id)
            .map(|ak| sort_for_display(&ak.questions))
            .unwrap_or_default()
    }

    /// 向科目的答案要点添加题目
    ///
    /// # 参数
    /// - `subject_id`: 所属科目 ID（必须存在）
    /// - `draft`: 题目草稿（题号与参考答案必填，满分为正整数）
    ///
    /// # 返回
    /// 返回新生成的题目记录
    pub fn add_question(&self, subject_id: &str, draft: QuestionDraft) -> AppResult<Question> {
        validate_draft(&draft)?;
        self.require_subject(subject_id)?;

        let _write = self.store.write_lock();
        let mut keys: Vec<AnswerKey> = load_collection(self.store.as_ref(), Collection::AnswerKeys);
        let question = Question::from_draft(draft);

        // find-or-create：同一科目不允许出现第二条答案要点
        match keys.iter_mut().find(|ak| ak.subject_id == subject_id) {
            Some(key) => {
                key.questions.push(question.clone());
                key.updated_at = crate::models::now_iso();
            }
            None => {
                let mut key = AnswerKey::new(subject_id);
                key.questions.push(question.clone());
                keys.push(key);
            }
        }

        save_collection(self.store.as_ref(), Collection::AnswerKeys, &keys)?;
        recompute_counters(self.store.as_ref(), subject_id)?;

        info!(
            "✓ 科目 {} 新增题目 {} (满分 {}): {}",
            subject_id,
            question.question_number,
            question.max_marks,
            crate::utils::logging::truncate_text(&question.reference_answer, 40)
        );
        Ok(question)
    }

    /// 编辑题目（按 ID 原位替换可变字段）
    ///
    /// 未知的题目 ID 是静默 no-op：调用方的视图可能已过期。
    pub fn update_question(
        &self,
        subject_id: &str,
        question_id: &str,
        draft: QuestionDraft,
    ) -> AppResult<()> {
        validate_draft(&draft)?;

        let _write = self.store.write_lock();
        let mut keys: Vec<AnswerKey> = load_collection(self.store.as_ref(), Collection::AnswerKeys);
        let Some(key) = keys.iter_mut().find(|ak| ak.subject_id == subject_id) else {
            return Ok(());
        };
        let Some(question) = key.questions.iter_mut().find(|q| q.id == question_id) else {
            return Ok(());
        };

        question.apply_draft(draft);
        key.updated_at = crate::models::now_iso();
        save_collection(self.store.as_ref(), Collection::AnswerKeys, &keys)
    }

    /// 删除题目
    pub fn delete_question(&self, subject_id: &str, question_id: &str) -> AppResult<()> {
        let _write = self.store.write_lock();
        let mut keys: Vec<AnswerKey> = load_collection(self.store.as_ref(), Collection::AnswerKeys);
        let Some(key) = keys.iter_mut().find(|ak| ak.subject_id == subject_id) else {
            return Ok(());
        };

        let before = key.questions.len();
        key.questions.retain(|q| q.id != question_id);
        if key.questions.len() == before {
            return Ok(());
        }
        key.updated_at = crate::models::now_iso();

        save_collection(self.store.as_ref(), Collection::AnswerKeys, &keys)?;
        recompute_counters(self.store.as_ref(), subject_id)
    }

    fn require_subject(&self, subject_id: &str) -> AppResult<()> {
        let subjects: Vec<Subject> = load_collection(self.store.as_ref(), Collection::Subjects);
        if subjects.iter().any(|s| s.id == subject_id) {
            Ok(())
        } else {
            Err(AppError::subject_not_found(subject_id))
        }
    }
}

/// 校验题目草稿的必填字段
fn validate_draft(draft: &QuestionDraft) -> AppResult<()> {
    if draft.question_number.trim().is_empty() {
        return Err(AppError::missing_field("questionNumber"));
    }
    if draft.reference_answer.trim().is_empty() {
        return Err(AppError::missing_field("referenceAnswer"));
    }
    if draft.max_marks == 0 {
        return Err(AppError::Validation(ValidationError::InvalidMaxMarks {
            value: draft.max_marks,
        }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::SubjectRepository;
    use crate::storage::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, SubjectRepository, AnswerKeyRepository) {
        let store = Arc::new(MemoryStore::new());
        let subjects = SubjectRepository::new(store.clone());
        let keys = AnswerKeyRepository::new(store.clone());
        (store, subjects, keys)
    }

    fn draft(number: &str, max_marks: u32) -> QuestionDraft {
        QuestionDraft {
            question_number: number.to_string(),
            question_text: None,
            reference_answer: "参考答案".to_string(),
            max_marks,
        }
    }

    #[test]
    fn test_find_or_create_keeps_single_key_per_subject() {
        let (store, subjects, keys) = setup();
        let subject = subjects.create("化学", None, "#f97316").unwrap();

        keys.add_question(&subject.id, draft("1", 5)).unwrap();
        keys.add_question(&subject.id, draft("2", 3)).unwrap();

        // 两次添加不应产生第二条答案要点记录
        let all: Vec<AnswerKey> =
            crate::storage::load_collection(store.as_ref(), Collection::AnswerKeys);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].questions.len(), 2);
    }

    #[test]
    fn test_question_count_tracks_mutations() {
        let (_, subjects, keys) = setup();
        let subject = subjects.create("化学", None, "#f97316").unwrap();

        let q1 = keys.add_question(&subject.id, draft("1", 5)).unwrap();
        keys.add_question(&subject.id, draft("2", 3)).unwrap();
        assert_eq!(subjects.get(&subject.id).unwrap().question_count, 2);

        keys.delete_question(&subject.id, &q1.id).unwrap();
        assert_eq!(subjects.get(&subject.id).unwrap().question_count, 1);
    }

    #[test]
    fn test_add_question_requires_subject() {
        let (_, _, keys) = setup();
        let result = keys.add_question("没有这个科目", draft("1", 5));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_unknown_question_is_noop() {
        let (_, subjects, keys) = setup();
        let subject = subjects.create("化学", None, "#f97316").unwrap();
        keys.add_question(&subject.id, draft("1", 5)).unwrap();

        keys.update_question(&subject.id, "过期的ID", draft("9", 10))
            .unwrap();

        let key = keys.find_for_subject(&subject.id).unwrap();
        assert_eq!(key.questions.len(), 1);
        assert_eq!(key.questions[0].question_number, "1");
    }

    #[test]
    fn test_rejects_zero_max_marks() {
        let (_, subjects, keys) = setup();
        let subject = subjects.create("化学", None, "#f97316").unwrap();
        assert!(keys.add_question(&subject.id, draft("1", 0)).is_err());
        assert!(keys.find_for_subject(&subject.id).is_none());
    }
}
