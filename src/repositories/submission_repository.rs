/// 答卷仓库
///
/// 管理全局答卷集合的追加与状态迁移，以及批量评分结果的合并。
/// 合并是 (当前答卷集合, 结果列表) 上的纯函数，可脱离评分服务独立测试。
use crate::clients::SubmissionGradeResult;
use crate::error::AppResult;
use crate::models::{Submission, SubmissionDraft, SubmissionStatus};
use crate::repositories::subject_repository::recompute_counters;
use crate::storage::{load_collection, save_collection, Collection, CollectionStore};
use std::sync::Arc;
use tracing::{debug, info};

/// 合并统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// 成功写入评分字段的答卷数
    pub applied: usize,
    /// 被跳过的结果数（未知 ID、已评分、或标记为失败）
    pub skipped: usize,
}

/// 答卷仓库
#[derive(Clone)]
pub struct SubmissionRepository {
    store: Arc<dyn CollectionStore>,
}

impl SubmissionRepository {
    /// 创建新的答卷仓库
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self { store }
    }

    /// 批量追加答卷
    ///
    /// # 参数
    /// - `subject_id`: 所属科目 ID（必须存在）
    /// - `drafts`: 已编码的答卷草稿
    ///
    /// # 返回
    /// 返回新落库的答卷记录（状态均为 `Uploaded`）
    pub fn append_many(
        &self,
        subject_id: &str,
        drafts: Vec<SubmissionDraft>,
    ) -> AppResult<Vec<Submission>> {
        let _write = self.store.write_lock();
        let subjects: Vec<crate::models::Subject> =
            load_collection(self.store.as_ref(), Collection::Subjects);
        if !subjects.iter().any(|s| s.id == subject_id) {
            return Err(crate::error::AppError::subject_not_found(subject_id));
        }

        let new_records: Vec<Submission> = drafts
            .into_iter()
            .map(|d| Submission::from_draft(subject_id, d))
            .collect();

        let mut submissions: Vec<Submission> =
            load_collection(self.store.as_ref(), Collection::Submissions);
        submissions.extend(new_records.iter().cloned());
        save_collection(self.store.as_ref(), Collection::Submissions, &submissions)?;
        recompute_counters(self.store.as_ref(), subject_id)?;

        info!("✓ 科目 {} 新增 {} 份答卷", subject_id, new_records.len());
        Ok(new_records)
    }

    /// 列出科目的全部答卷
    pub fn list_for_subject(&self, subject_id: &str) -> Vec<Submission> {
        let submissions: Vec<Submission> =
            load_collection(self.store.as_ref(), Collection::Submissions);
        submissions
            .into_iter()
            .filter(|s| s.subject_id == subject_id)
            .collect()
    }

    /// 列出科目中待评分（状态为 `Uploaded`）的答卷
    pub fn ungraded_for_subject(&self, subject_id: &str) -> Vec<Submission> {
        self.list_for_subject(subject_id)
            .into_iter()
            .filter(|s| s.is_ungraded())
            .collect()
    }

    /// 将指定答卷标记为 `Processing`（仅限当前为 `Uploaded` 的）
    pub fn mark_processing(&self, ids: &[String]) -> AppResult<()> {
        self.transition(ids, SubmissionStatus::Uploaded, SubmissionStatus::Processing)
    }

    /// 将指定答卷从 `Processing` 恢复为 `Uploaded`（失败回滚 / 未评分兜底）
    pub fn revert_processing(&self, ids: &[String]) -> AppResult<()> {
        self.transition(ids, SubmissionStatus::Processing, SubmissionStatus::Uploaded)
    }

    fn transition(
        &self,
        ids: &[String],
        from: SubmissionStatus,
        to: SubmissionStatus,
    ) -> AppResult<()> {
        let _write = self.store.write_lock();
        let mut submissions: Vec<Submission> =
            load_collection(self.store.as_ref(), Collection::Submissions);
        let mut changed = 0usize;
        for sub in submissions.iter_mut() {
            if sub.status == from && ids.contains(&sub.id) {
                sub.status = to;
                changed += 1;
            }
        }
        if changed == 0 {
            return Ok(());
        }
        debug!("状态迁移 {:?} → {:?}: {} 份答卷", from, to, changed);
        save_collection(self.store.as_ref(), Collection::Submissions, &submissions)
    }

    /// 合并批量评分结果并持久化
    ///
    /// 评分服务返回的分数与百分比原样写入，不做重算或校验。
    pub fn apply_grade_results(&self, results: &[SubmissionGradeResult]) -> AppResult<MergeStats> {
        let _write = self.store.write_lock();
        let mut submissions: Vec<Submission> =
            load_collection(self.store.as_ref(), Collection::Submissions);
        let stats = merge_grade_results(&mut submissions, results);
        save_collection(self.store.as_ref(), Collection::Submissions, &submissions)?;
        Ok(stats)
    }
}

/// 将评分结果合并到答卷集合（纯函数）
///
/// 规则：
/// - 未知的答卷 ID 静默跳过（答卷可能在评分期间已被删除）
/// - 已是 `Graded` 的答卷绝不覆盖（不会二次评分）
/// - 标记为成功且字段完整的结果整体写入评分字段并置为 `Graded`
/// - 标记为失败或字段残缺的结果不写入任何字段，答卷留待重试
pub fn merge_grade_results(
    submissions: &mut [Submission],
    results: &[SubmissionGradeResult],
) -> MergeStats {
    let mut stats = MergeStats::default();

    for result in results {
        let Some(sub) = submissions
            .iter_mut()
            .find(|s| s.id == result.submission_id)
        else {
            stats.skipped += 1;
            continue;
        };

        if sub.status == SubmissionStatus::Graded {
            stats.skipped += 1;
            continue;
        }

        // 评分字段整体写入：任何一个缺失都视为该答卷评分失败
        let (Some(total_marks), Some(total_max_marks), Some(percentage)) =
            (result.total_marks, result.total_max_marks, result.percentage)
        else {
            stats.skipped += 1;
            continue;
        };
        if !result.is_success() {
            stats.skipped += 1;
            continue;
        }

        sub.status = SubmissionStatus::Graded;
        sub.total_marks = Some(total_marks);
        sub.max_marks = Some(total_max_marks);
        sub.percentage = Some(percentage);
        sub.question_results = result.question_results.clone();
        stats.applied += 1;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionResult;

    fn submission(id: &str) -> Submission {
        Submission {
            id: id.to_string(),
            subject_id: "s1".to_string(),
            student_name: "张三".to_string(),
            file_name: "zhang_san.png".to_string(),
            file_data: "data:image/png;base64,AAAA".to_string(),
            uploaded_at: crate::models::now_iso(),
            status: SubmissionStatus::Uploaded,
            total_marks: None,
            max_marks: None,
            percentage: None,
            question_results: None,
        }
    }

    fn success_result(id: &str, marks: f64) -> SubmissionGradeResult {
        SubmissionGradeResult {
            submission_id: id.to_string(),
            status: "success".to_string(),
            total_marks: Some(marks),
            total_max_marks: Some(5),
            percentage: Some(marks / 5.0 * 100.0),
            question_results: Some(vec![QuestionResult {
                question_number: "1".to_string(),
                marks,
                max_marks: 5,
                similarity: Some(0.9),
                extracted_text: Some("线粒体".to_string()),
                feedback: Some("Excellent!".to_string()),
            }]),
        }
    }

    fn failed_result(id: &str) -> SubmissionGradeResult {
        SubmissionGradeResult {
            submission_id: id.to_string(),
            status: "failed".to_string(),
            total_marks: None,
            total_max_marks: None,
            percentage: None,
            question_results: None,
        }
    }

    #[test]
    fn test_merge_partial_failure() {
        let mut subs = vec![submission("a"), submission("b")];
        let results = vec![success_result("a", 4.0), failed_result("b")];

        let stats = merge_grade_results(&mut subs, &results);
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.skipped, 1);

        // A：评分字段整体写入
        assert_eq!(subs[0].status, SubmissionStatus::Graded);
        assert_eq!(subs[0].total_marks, Some(4.0));
        assert_eq!(subs[0].max_marks, Some(5));
        assert!(subs[0].question_results.is_some());

        // B：保持未评分，且不允许出现半填充的评分字段
        assert_eq!(subs[1].status, SubmissionStatus::Uploaded);
        assert!(subs[1].total_marks.is_none());
        assert!(subs[1].percentage.is_none());
        assert!(subs[1].question_results.is_none());
    }

    #[test]
    fn test_merge_skips_unknown_submission() {
        let mut subs = vec![submission("a")];
        let results = vec![success_result("已删除的答卷", 5.0)];

        let stats = merge_grade_results(&mut subs, &results);
        assert_eq!(stats.applied, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(subs[0].status, SubmissionStatus::Uploaded);
    }

    #[test]
    fn test_merge_never_overwrites_graded() {
        let mut subs = vec![submission("a")];
        merge_grade_results(&mut subs, &[success_result("a", 3.0)]);
        assert_eq!(subs[0].total_marks, Some(3.0));

        // 再次合并同一答卷的结果不应覆盖
        let stats = merge_grade_results(&mut subs, &[success_result("a", 5.0)]);
        assert_eq!(stats.applied, 0);
        assert_eq!(subs[0].total_marks, Some(3.0));
    }

    #[test]
    fn test_concurrent_appends_do_not_lose_updates() {
        use crate::repositories::SubjectRepository;
        use crate::storage::MemoryStore;

        let store = Arc::new(MemoryStore::new());
        let subjects = SubjectRepository::new(store.clone());
        let submissions = SubmissionRepository::new(store.clone());
        let biology = subjects.create("生物", None, "#10b981").unwrap();
        let physics = subjects.create("物理", None, "#3b82f6").unwrap();

        // 两个科目各 4 个线程并发追加，读-改-写不得互相覆盖
        let mut handles = Vec::new();
        for subject_id in [&biology.id, &physics.id] {
            for _ in 0..4 {
                let repo = submissions.clone();
                let subject_id = subject_id.clone();
                handles.push(std::thread::spawn(move || {
                    for i in 0..10 {
                        repo.append_many(
                            &subject_id,
                            vec![SubmissionDraft {
                                student_name: format!("学生{}", i),
                                file_name: format!("{}.png", i),
                                file_data: "data:image/png;base64,AAAA".to_string(),
                            }],
                        )
                        .unwrap();
                    }
                }));
            }
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(submissions.list_for_subject(&biology.id).len(), 40);
        assert_eq!(submissions.list_for_subject(&physics.id).len(), 40);
        assert_eq!(subjects.get(&biology.id).unwrap().student_count, 40);
        assert_eq!(subjects.get(&physics.id).unwrap().student_count, 40);
    }

    #[test]
    fn test_merge_rejects_incomplete_success() {
        // 标记为成功但缺字段的结果视为失败，不得部分写入
        let mut subs = vec![submission("a")];
        let mut result = success_result("a", 4.0);
        result.percentage = None;

        let stats = merge_grade_results(&mut subs, &[result]);
        assert_eq!(stats.applied, 0);
        assert_eq!(subs[0].status, SubmissionStatus::Uploaded);
        assert!(subs[0].total_marks.is_none());
    }
}
