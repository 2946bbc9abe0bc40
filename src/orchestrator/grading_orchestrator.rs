//! 批量评分编排器 - 编排层
//!
//! ## 职责
//!
//! 本模块协调一个科目的批量评分：从仓库读出答案要点与待评分答卷，
//! 调用外部评分服务，再把逐份结果合并回本地存储。
//!
//! ## 核心保证
//!
//! 1. **前置条件**：科目存在、答案要点非空、存在待评分答卷，否则直接报错且无副作用
//! 2. **批次互斥**：同一科目同时只允许一个在途批次，第二次调用立即失败；
//!    不同科目的批次互不影响
//! 3. **失败回滚**：传输层失败或响应异常时整批中止，所有答卷恢复为待评分
//! 4. **部分成功**：服务端标记失败或缺失结果的答卷留待重试，其余正常落库
//! 5. **幂等**：状态过滤保证已评分的答卷不会进入下一个批次，绝不二次评分

use crate::clients::{AnswerKeyPayload, BatchGradeRequest, GradingBackend, SubmissionPayload};
use crate::error::{AppError, AppResult, GradingError, GradingPrecondition};
use crate::repositories::{AnswerKeyRepository, SubjectRepository, SubmissionRepository};
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{info, warn};

/// 一个批次的最终结果
///
/// 部分成功不是错误：`failed` 份答卷保持待评分状态，可重新发起批次。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// 本批次提交的答卷数量
    pub requested: usize,
    /// 成功评分的答卷数量
    pub graded: usize,
    /// 未评分（留待重试）的答卷数量
    pub failed: usize,
}

/// 批量评分编排器
pub struct GradingOrchestrator<G: GradingBackend> {
    backend: G,
    subjects: SubjectRepository,
    answer_keys: AnswerKeyRepository,
    submissions: SubmissionRepository,
    /// 在途批次的科目 ID 集合（每科目互斥锁）
    in_flight: Mutex<HashSet<String>>,
}

impl<G: GradingBackend> GradingOrchestrator<G> {
    /// 创建新的编排器
    pub fn new(
        backend: G,
        subjects: SubjectRepository,
        answer_keys: AnswerKeyRepository,
        submissions: SubmissionRepository,
    ) -> Self {
        Self {
            backend,
            subjects,
            answer_keys,
            submissions,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// 对一个科目的全部待评分答卷发起批量评分
    ///
    /// # 参数
    /// - `subject_id`: 科目 ID
    ///
    /// # 返回
    /// 返回批次结果；前置条件不满足、批次冲突或服务失败时报错且不留下
    /// 任何 `Processing` 状态的答卷
    pub async fn grade_subject(&self, subject_id: &str) -> AppResult<BatchOutcome> {
        // ========== 前置条件检查（无副作用） ==========
        let subject = self
            .subjects
            .get(subject_id)
            .ok_or_else(|| AppError::subject_not_found(subject_id))?;

        let Some(answer_key) = self.answer_keys.find_for_subject(subject_id) else {
            return Err(AppError::grading_precondition(
                subject_id,
                GradingPrecondition::NoAnswerKey,
            ));
        };
        if answer_key.questions.is_empty() {
            return Err(AppError::grading_precondition(
                subject_id,
                GradingPrecondition::NoQuestions,
            ));
        }

        // 先取批次锁再筛选答卷，避免并发批次各自筛到同一批答卷
        let _guard = self.try_acquire(subject_id)?;

        let ungraded = self.submissions.ungraded_for_subject(subject_id);
        if ungraded.is_empty() {
            return Err(AppError::grading_precondition(
                subject_id,
                GradingPrecondition::NoUngradedSubmissions,
            ));
        }

        let batch_ids: Vec<String> = ungraded.iter().map(|s| s.id.clone()).collect();

        info!(
            "🚀 科目 {} 开始批量评分: {} 份答卷, {} 道题",
            subject.name,
            ungraded.len(),
            answer_key.questions.len()
        );

        // ========== 标记在途并构建请求 ==========
        self.submissions.mark_processing(&batch_ids)?;

        let request = BatchGradeRequest {
            submissions: ungraded
                .iter()
                .map(|s| SubmissionPayload {
                    id: s.id.clone(),
                    student_name: s.student_name.clone(),
                    file_data: s.file_data.clone(),
                })
                .collect(),
            answer_keys: self
                .answer_keys
                .questions_sorted(subject_id)
                .into_iter()
                .map(|q| AnswerKeyPayload {
                    question_number: q.question_number,
                    reference_answer: q.reference_answer,
                    max_marks: q.max_marks,
                })
                .collect(),
        };

        // ========== 调用评分服务 ==========
        let response = match self.backend.grade_batch(&request).await {
            Ok(response) => response,
            Err(e) => {
                // 传输层失败：整批中止，所有答卷恢复为待评分
                warn!("❌ 评分服务调用失败，批次中止: {}", e);
                self.submissions.revert_processing(&batch_ids)?;
                return Err(AppError::grading_service_failed(e));
            }
        };

        if !response.is_success() {
            warn!("❌ 评分服务返回异常状态: {}", response.status);
            self.submissions.revert_processing(&batch_ids)?;
            return Err(AppError::Grading(GradingError::BadResponse {
                message: format!("status = {}", response.status),
            }));
        }

        // ========== 合并结果 ==========
        let stats = self.submissions.apply_grade_results(&response.results)?;

        // 结果缺失或标记失败的答卷恢复为待评分（可重试）
        self.submissions.revert_processing(&batch_ids)?;

        let outcome = BatchOutcome {
            requested: batch_ids.len(),
            graded: stats.applied,
            failed: batch_ids.len() - stats.applied,
        };
        log_batch_complete(&subject.name, &outcome);

        Ok(outcome)
    }

    /// 获取科目的批次互斥锁
    fn try_acquire(&self, subject_id: &str) -> AppResult<InFlightGuard<'_>> {
        let mut slots = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !slots.insert(subject_id.to_string()) {
            return Err(AppError::Grading(GradingError::BatchInProgress {
                subject_id: subject_id.to_string(),
            }));
        }
        Ok(InFlightGuard {
            slots: &self.in_flight,
            subject_id: subject_id.to_string(),
        })
    }
}

/// 在途批次的互斥凭证，释放时解除该科目的占用
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<String>>,
    subject_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.subject_id);
    }
}

// ========== 日志辅助函数 ==========

fn log_batch_complete(subject_name: &str, outcome: &BatchOutcome) {
    info!("{}", "─".repeat(60));
    info!(
        "✓ 科目 {} 批次完成: 成功 {}/{}, 留待重试 {}",
        subject_name, outcome.graded, outcome.requested, outcome.failed
    );
    info!("{}", "─".repeat(60));
}
