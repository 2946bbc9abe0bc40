/// 上传暂存区
///
/// 答卷上传分两步：先把文件加入暂存区生成草稿（可删除、可修改学生姓名），
/// 再一次性提交。提交时逐个编码为 base64 data URL，编码失败只标记对应
/// 草稿为失败，成功的草稿照常落库。
use crate::error::{AppError, AppResult};
use crate::models::{Submission, SubmissionDraft};
use crate::repositories::SubmissionRepository;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use tracing::{info, warn};

/// 已知答卷文件扩展名对应的 MIME 类型
static MIME_TYPES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "pdf" => "application/pdf",
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
};

/// 草稿状态（仅存在于暂存区，从不持久化）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStatus {
    /// 待提交
    Pending,
    /// 本次提交已成功落库
    Uploaded,
    /// 编码失败，留在暂存区等待处理
    Error,
}

/// 暂存区中的答卷草稿
#[derive(Debug, Clone)]
pub struct UploadDraft {
    pub id: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub student_name: String,
    pub status: DraftStatus,
}

/// 一次提交的结果
#[derive(Debug)]
pub struct CommitOutcome {
    /// 成功落库的答卷记录
    pub committed: Vec<Submission>,
    /// 编码失败的草稿数量
    pub failed: usize,
}

/// 上传暂存区
pub struct UploadStage {
    drafts: Vec<UploadDraft>,
    ext_pattern: Regex,
}

impl UploadStage {
    /// 创建空的暂存区
    pub fn new() -> Self {
        Self {
            drafts: Vec::new(),
            // 模式为静态字符串，编译不会失败
            ext_pattern: Regex::new(r"(?i)\.(pdf|png|jpg|jpeg)$")
                .unwrap_or_else(|e| panic!("扩展名正则编译失败: {}", e)),
        }
    }

    /// 当前暂存的草稿
    pub fn drafts(&self) -> &[UploadDraft] {
        &self.drafts
    }

    /// 加入一批文件，自动推导学生姓名
    ///
    /// # 参数
    /// - `files`: (文件名, 文件内容) 列表
    pub fn add_files(&mut self, files: Vec<(String, Vec<u8>)>) {
        for (file_name, bytes) in files {
            let student_name = self.derive_student_name(&file_name);
            self.drafts.push(UploadDraft {
                id: crate::models::new_record_id(),
                file_name,
                bytes,
                student_name,
                status: DraftStatus::Pending,
            });
        }
    }

    /// 从暂存区移除草稿（未知 ID 为 no-op）
    pub fn remove(&mut self, draft_id: &str) {
        self.drafts.retain(|d| d.id != draft_id);
    }

    /// 修改草稿的学生姓名（提交前可随时编辑，不会被重新推导）
    pub fn rename(&mut self, draft_id: &str, student_name: impl Into<String>) {
        if let Some(draft) = self.drafts.iter_mut().find(|d| d.id == draft_id) {
            draft.student_name = student_name.into();
        }
    }

    /// 提交暂存区中的全部待提交草稿
    ///
    /// 编码失败的草稿标记为失败并留在暂存区；成功的草稿编码后
    /// 一次性调用 `append_many` 落库，然后移出暂存区。
    /// 落库本身失败时草稿保持待提交状态，整批可原样重试。
    ///
    /// # 返回
    /// 返回落库的答卷记录与失败数量
    pub fn commit(
        &mut self,
        subject_id: &str,
        repository: &SubmissionRepository,
    ) -> AppResult<CommitOutcome> {
        if !self.drafts.iter().any(|d| d.status == DraftStatus::Pending) {
            return Err(AppError::missing_field("files"));
        }

        let mut encoded = Vec::new();
        let mut encoded_ids = Vec::new();
        let mut failed = 0usize;

        for draft in self.drafts.iter_mut() {
            if draft.status != DraftStatus::Pending {
                continue;
            }
            match encode_data_url(&draft.file_name, &draft.bytes) {
                Some(file_data) => {
                    encoded.push(SubmissionDraft {
                        student_name: draft.student_name.clone(),
                        file_name: draft.file_name.clone(),
                        file_data,
                    });
                    encoded_ids.push(draft.id.clone());
                }
                None => {
                    warn!("⚠️ 答卷文件编码失败: {}", draft.file_name);
                    draft.status = DraftStatus::Error;
                    failed += 1;
                }
            }
        }

        // 先落库再改草稿状态：落库失败时全部草稿仍为待提交
        let committed = if encoded.is_empty() {
            Vec::new()
        } else {
            repository.append_many(subject_id, encoded)?
        };

        // 成功的草稿离开暂存区，失败的留下
        for draft in self.drafts.iter_mut() {
            if encoded_ids.contains(&draft.id) {
                draft.status = DraftStatus::Uploaded;
            }
        }
        self.drafts.retain(|d| d.status != DraftStatus::Uploaded);

        info!(
            "📤 提交完成: 成功 {} 份, 失败 {} 份",
            committed.len(),
            failed
        );
        Ok(CommitOutcome { committed, failed })
    }

    /// 从文件名推导学生姓名：去掉已知扩展名，下划线替换为空格
    fn derive_student_name(&self, file_name: &str) -> String {
        let without_ext = self.ext_pattern.replace(file_name, "");
        without_ext.replace('_', " ")
    }
}

impl Default for UploadStage {
    fn default() -> Self {
        Self::new()
    }
}

/// 将文件内容编码为 base64 data URL
///
/// 未知扩展名或空内容视为编码失败
fn encode_data_url(file_name: &str, bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() {
        return None;
    }
    let extension = file_name.rsplit_once('.')?.1.to_lowercase();
    let mime = MIME_TYPES.get(extension.as_str())?;
    Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{SubjectRepository, SubmissionRepository};
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_derive_student_name() {
        let stage = UploadStage::new();
        assert_eq!(stage.derive_student_name("zhang_san.pdf"), "zhang san");
        assert_eq!(stage.derive_student_name("Li_Si.JPEG"), "Li Si");
        assert_eq!(stage.derive_student_name("wang wu.png"), "wang wu");
        // 未知扩展名不剥离
        assert_eq!(stage.derive_student_name("note.txt"), "note.txt");
    }

    #[test]
    fn test_rename_is_not_rederived() {
        let mut stage = UploadStage::new();
        stage.add_files(vec![("zhang_san.png".to_string(), vec![1, 2, 3])]);
        let id = stage.drafts()[0].id.clone();

        stage.rename(&id, "张三");
        assert_eq!(stage.drafts()[0].student_name, "张三");
    }

    #[test]
    fn test_encode_data_url() {
        let url = encode_data_url("a.png", &[1, 2, 3]).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        assert!(encode_data_url("a.unknown", &[1]).is_none());
        assert!(encode_data_url("a.png", &[]).is_none());
        assert!(encode_data_url("没有扩展名", &[1]).is_none());
    }

    #[test]
    fn test_partial_encode_failure_commits_successes() {
        let store = Arc::new(MemoryStore::new());
        let subjects = SubjectRepository::new(store.clone());
        let submissions = SubmissionRepository::new(store.clone());
        let subject = subjects.create("生物", None, "#10b981").unwrap();

        let mut stage = UploadStage::new();
        stage.add_files(vec![
            ("zhang_san.png".to_string(), vec![1, 2, 3]),
            ("li_si.exe".to_string(), vec![4, 5, 6]), // 未知扩展名
        ]);

        let outcome = stage.commit(&subject.id, &submissions).unwrap();
        assert_eq!(outcome.committed.len(), 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.committed[0].student_name, "zhang san");

        // 成功的草稿离开暂存区，失败的留下并标记为失败
        assert_eq!(stage.drafts().len(), 1);
        assert_eq!(stage.drafts()[0].status, DraftStatus::Error);

        // 落库后科目答卷计数器同步更新
        assert_eq!(subjects.get(&subject.id).unwrap().student_count, 1);
    }

    #[test]
    fn test_failed_commit_keeps_drafts_for_retry() {
        let store = Arc::new(MemoryStore::new());
        let subjects = SubjectRepository::new(store.clone());
        let submissions = SubmissionRepository::new(store.clone());

        let mut stage = UploadStage::new();
        stage.add_files(vec![("zhang_san.png".to_string(), vec![1, 2, 3])]);

        // 科目不存在，落库失败：草稿必须保持待提交，不得丢失
        assert!(stage.commit("已删除的科目", &submissions).is_err());
        assert_eq!(stage.drafts().len(), 1);
        assert_eq!(stage.drafts()[0].status, DraftStatus::Pending);

        // 修正科目后原样重试成功
        let subject = subjects.create("生物", None, "#10b981").unwrap();
        let outcome = stage.commit(&subject.id, &submissions).unwrap();
        assert_eq!(outcome.committed.len(), 1);
        assert!(stage.drafts().is_empty());
    }

    #[test]
    fn test_commit_empty_stage_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let subjects = SubjectRepository::new(store.clone());
        let submissions = SubmissionRepository::new(store.clone());
        let subject = subjects.create("生物", None, "#10b981").unwrap();

        let mut stage = UploadStage::new();
        assert!(stage.commit(&subject.id, &submissions).is_err());
    }
}
