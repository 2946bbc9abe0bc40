/// 评分服务 API 客户端
///
/// 封装所有与评分服务相关的调用逻辑：批量评分（/grade-batch）
/// 与单份答卷评分（/grade）。
use crate::config::Config;
use crate::models::QuestionResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

// ========== 批量评分协议 ==========

/// 批量评分请求中的单份答卷
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub id: String,
    pub student_name: String,
    pub file_data: String,
}

/// 批量评分请求中的单个题目要点
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKeyPayload {
    pub question_number: String,
    pub reference_answer: String,
    pub max_marks: u32,
}

/// 批量评分请求
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGradeRequest {
    pub submissions: Vec<SubmissionPayload>,
    pub answer_keys: Vec<AnswerKeyPayload>,
}

/// 单份答卷的评分结果
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionGradeResult {
    pub submission_id: String,
    pub status: String,
    #[serde(default)]
    pub total_marks: Option<f64>,
    #[serde(default)]
    pub total_max_marks: Option<u32>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub question_results: Option<Vec<QuestionResult>>,
}

impl SubmissionGradeResult {
    /// 该答卷是否评分成功
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// 批量评分响应
#[derive(Debug, Clone, Deserialize)]
pub struct BatchGradeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<SubmissionGradeResult>,
}

impl BatchGradeResponse {
    /// 顶层状态是否成功
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ========== 单份评分协议 ==========

/// 单份评分的分数明细（服务端为 snake_case 字段）
#[derive(Debug, Clone, Deserialize)]
pub struct GradeDetail {
    pub marks: f64,
    pub max_marks: u32,
    pub similarity: f64,
}

/// 单份评分响应
#[derive(Debug, Clone, Deserialize)]
pub struct SingleGradeResponse {
    pub status: String,
    #[serde(default)]
    pub extracted_text: Option<String>,
    #[serde(default)]
    pub grade: Option<GradeDetail>,
    #[serde(default)]
    pub feedback: Option<String>,
}

// ========== 服务接口 ==========

/// 评分服务能力接口
///
/// 编排层只依赖该接口，测试中注入假实现即可脱离真实服务验证协调逻辑。
#[async_trait]
pub trait GradingBackend: Send + Sync {
    /// 提交一个批次并等待全部结果
    async fn grade_batch(&self, request: &BatchGradeRequest) -> Result<BatchGradeResponse>;
}

#[async_trait]
impl<T: GradingBackend + ?Sized> GradingBackend for std::sync::Arc<T> {
    async fn grade_batch(&self, request: &BatchGradeRequest) -> Result<BatchGradeResponse> {
        (**self).grade_batch(request).await
    }
}

// ========== HTTP 实现 ==========

/// 评分服务 HTTP 客户端
pub struct HttpGradingClient {
    http: reqwest::Client,
    base_url: String,
    verbose_logging: bool,
}

impl HttpGradingClient {
    /// 创建新的评分服务客户端
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("无法创建 HTTP 客户端")?;

        Ok(Self {
            http,
            base_url: config.grading_api_base_url.clone(),
            verbose_logging: config.verbose_logging,
        })
    }

    /// 单份答卷评分
    ///
    /// # 参数
    /// - `file_name`: 原始文件名
    /// - `file_bytes`: 文件原始内容（multipart 上传，不做 base64 编码）
    /// - `reference_answer`: 参考答案
    /// - `max_marks`: 满分
    ///
    /// # 返回
    /// 返回服务端的评分结果，本地不产生任何持久化副作用
    pub async fn grade_single(
        &self,
        file_name: &str,
        file_bytes: Vec<u8>,
        reference_answer: &str,
        max_marks: u32,
    ) -> Result<SingleGradeResponse> {
        let endpoint = format!("{}/grade", self.base_url);

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(file_bytes).file_name(file_name.to_string()),
            )
            .text("reference_answer", reference_answer.to_string())
            .text("max_marks", max_marks.to_string());

        debug!("单份评分请求: {} ({})", endpoint, file_name);

        let response = self
            .http
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .with_context(|| format!("请求评分服务失败: {}", endpoint))?
            .error_for_status()
            .context("评分服务返回错误状态码")?;

        let result = response
            .json::<SingleGradeResponse>()
            .await
            .context("无法解析单份评分响应")?;

        Ok(result)
    }
}

#[async_trait]
impl GradingBackend for HttpGradingClient {
    async fn grade_batch(&self, request: &BatchGradeRequest) -> Result<BatchGradeResponse> {
        let endpoint = format!("{}/grade-batch", self.base_url);

        debug!(
            "批量评分请求: {} ({} 份答卷, {} 道题)",
            endpoint,
            request.submissions.len(),
            request.answer_keys.len()
        );
        if self.verbose_logging {
            for submission in &request.submissions {
                info!(
                    "  📄 {} ({} 字符)",
                    submission.student_name,
                    submission.file_data.len()
                );
            }
        }

        let response = self
            .http
            .post(&endpoint)
            .json(request)
            .send()
            .await
            .with_context(|| format!("请求评分服务失败: {}", endpoint))?
            .error_for_status()
            .context("评分服务返回错误状态码")?;

        let result = response
            .json::<BatchGradeResponse>()
            .await
            .context("无法解析批量评分响应")?;

        Ok(result)
    }
}
