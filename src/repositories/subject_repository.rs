/// 科目仓库
///
/// 负责科目的创建、查询与删除。删除采取级联策略：科目的答案要点与
/// 全部答卷随科目一并删除，保证不留孤儿记录。
use crate::error::{AppError, AppResult};
use crate::models::{AnswerKey, Subject, Submission};
use crate::storage::{load_collection, save_collection, Collection, CollectionStore};
use std::sync::Arc;
use tracing::info;

/// 科目仓库
#[derive(Clone)]
pub struct SubjectRepository {
    store: Arc<dyn CollectionStore>,
}

impl SubjectRepository {
    /// 创建新的科目仓库
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// 创建科目
    ///
    /// # 参数
    /// - `name`: 科目名称（必填）
    /// - `description`: 可选描述
    /// - `color`: 主题色
    ///
    /// # 返回
    /// 返回新创建的科目记录（计数器为 0）
    pub fn create(
        &self,
        name: &str,
        description: Option<String>,
        color: &str,
    ) -> AppResult<Subject> {
        if name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }

        let description = description.filter(|d| !d.trim().is_empty());
        let subject = Subject::new(name.trim(), description, color);

        let _write = self.store.write_lock();
        let mut subjects: Vec<Subject> = load_collection(self.store.as_ref(), Collection::Subjects);
        subjects.push(subject.clone());
        save_collection(self.store.as_ref(), Collection::Subjects, &subjects)?;

        info!("✓ 创建科目: {} ({})", subject.name, subject.id);
        Ok(subject)
    }

    /// 列出全部科目
    pub fn list(&self) -> Vec<Subject> {
        load_collection(self.store.as_ref(), Collection::Subjects)
    }

    /// 按 ID 查找科目
    pub fn get(&self, id: &str) -> Option<Subject> {
        self.list().into_iter().find(|s| s.id == id)
    }

    /// 删除科目（级联删除答案要点与答卷）
    ///
    /// 未知 ID 视为静默 no-op：调用方的视图可能已过期。
    pub fn delete(&self, id: &str) -> AppResult<()> {
        let _write = self.store.write_lock();
        let mut subjects: Vec<Subject> = load_collection(self.store.as_ref(), Collection::Subjects);
        let before = subjects.len();
        subjects.retain(|s| s.id != id);

        if subjects.len() == before {
            return Ok(());
        }

        // 级联：先删从属记录，再删科目本身
        let mut answer_keys: Vec<AnswerKey> =
            load_collection(self.store.as_ref(), Collection::AnswerKeys);
        answer_keys.retain(|ak| ak.subject_id != id);
        save_collection(self.store.as_ref(), Collection::AnswerKeys, &answer_keys)?;

        let mut submissions: Vec<Submission> =
            load_collection(self.store.as_ref(), Collection::Submissions);
        submissions.retain(|sub| sub.subject_id != id);
        save_collection(self.store.as_ref(), Collection::Submissions, &submissions)?;

        save_collection(self.store.as_ref(), Collection::Subjects, &subjects)?;

        info!("🗑️ 删除科目 {} 及其答案要点与答卷", id);
        Ok(())
    }
}

/// 重新统计科目的派生计数器（纯函数）
///
/// # 返回
/// 返回 (题目数量, 答卷数量)
pub fn recount(
    subject_id: &str,
    answer_keys: &[AnswerKey],
    submissions: &[Submission],
) -> (usize, usize) {
    let question_count = answer_keys
        .iter()
        .find(|ak| ak.subject_id == subject_id)
        .map(|ak| ak.questions.len())
        .unwrap_or(0);
    let student_count = submissions
        .iter()
        .filter(|sub| sub.subject_id == subject_id)
        .count();
    (question_count, student_count)
}

/// 重算并持久化科目的派生计数器
///
/// 在答案要点或答卷集合的每次写入之后调用（依赖集合后写原则）。
/// 调用方必须已持有存储写锁，本函数不再加锁。
pub(crate) fn recompute_counters(store: &dyn CollectionStore, subject_id: &str) -> AppResult<()> {
    let mut subjects: Vec<Subject> = load_collection(store, Collection::Subjects);
    let Some(subject) = subjects.iter_mut().find(|s| s.id == subject_id) else {
        // 科目已被删除，计数器无处可写
        return Ok(());
    };

    let answer_keys: Vec<AnswerKey> = load_collection(store, Collection::AnswerKeys);
    let submissions: Vec<Submission> = load_collection(store, Collection::Submissions);
    let (question_count, student_count) = recount(subject_id, &answer_keys, &submissions);

    subject.question_count = question_count;
    subject.student_count = student_count;
    save_collection(store, Collection::Subjects, &subjects)
}
