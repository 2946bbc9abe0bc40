use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 输入校验错误（不改变任何状态）
    Validation(ValidationError),
    /// 目标记录不存在
    NotFound(NotFoundError),
    /// 批量评分相关错误
    Grading(GradingError),
    /// 持久化存储错误
    Storage(StorageError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "校验错误: {}", e),
            AppError::NotFound(e) => write!(f, "记录不存在: {}", e),
            AppError::Grading(e) => write!(f, "评分错误: {}", e),
            AppError::Storage(e) => write!(f, "存储错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Validation(e) => Some(e),
            AppError::NotFound(e) => Some(e),
            AppError::Grading(e) => Some(e),
            AppError::Storage(e) => Some(e),
        }
    }
}

/// 输入校验错误
#[derive(Debug)]
pub enum ValidationError {
    /// 必填字段缺失
    MissingField { field: &'static str },
    /// 满分必须为正整数
    InvalidMaxMarks { value: u32 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField { field } => {
                write!(f, "必填字段不能为空: {}", field)
            }
            ValidationError::InvalidMaxMarks { value } => {
                write!(f, "满分必须为正整数, 当前值: {}", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// 目标记录不存在错误
#[derive(Debug)]
pub enum NotFoundError {
    /// 科目不存在
    Subject { id: String },
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundError::Subject { id } => write!(f, "科目不存在: {}", id),
        }
    }
}

impl std::error::Error for NotFoundError {}

/// 批量评分缺失的前置条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingPrecondition {
    /// 科目尚未创建答案要点
    NoAnswerKey,
    /// 答案要点存在但没有任何题目
    NoQuestions,
    /// 没有待评分的答卷
    NoUngradedSubmissions,
}

impl fmt::Display for GradingPrecondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingPrecondition::NoAnswerKey => write!(f, "该科目尚未创建答案要点"),
            GradingPrecondition::NoQuestions => write!(f, "答案要点中没有任何题目"),
            GradingPrecondition::NoUngradedSubmissions => write!(f, "没有待评分的答卷"),
        }
    }
}

/// 批量评分相关错误
#[derive(Debug)]
pub enum GradingError {
    /// 前置条件不满足，批次未启动
    Precondition {
        subject_id: String,
        missing: GradingPrecondition,
    },
    /// 同一科目已有批次在进行中
    BatchInProgress { subject_id: String },
    /// 评分服务调用失败（传输层），整个批次中止
    ServiceFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 评分服务返回了无法使用的响应
    BadResponse { message: String },
}

impl fmt::Display for GradingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingError::Precondition {
                subject_id,
                missing,
            } => {
                write!(f, "无法启动批量评分 (科目: {}): {}", subject_id, missing)
            }
            GradingError::BatchInProgress { subject_id } => {
                write!(f, "科目 {} 已有评分批次在进行中", subject_id)
            }
            GradingError::ServiceFailed { source } => {
                write!(f, "评分服务调用失败: {}", source)
            }
            GradingError::BadResponse { message } => {
                write!(f, "评分服务返回异常响应: {}", message)
            }
        }
    }
}

impl std::error::Error for GradingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GradingError::ServiceFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 持久化存储错误
#[derive(Debug)]
pub enum StorageError {
    /// 写入集合失败
    WriteFailed {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 序列化集合失败
    SerializeFailed {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::WriteFailed { key, source } => {
                write!(f, "写入集合失败 ({}): {}", key, source)
            }
            StorageError::SerializeFailed { key, source } => {
                write!(f, "序列化集合失败 ({}): {}", key, source)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::WriteFailed { source, .. }
            | StorageError::SerializeFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建必填字段缺失错误
    pub fn missing_field(field: &'static str) -> Self {
        AppError::Validation(ValidationError::MissingField { field })
    }

    /// 创建科目不存在错误
    pub fn subject_not_found(id: impl Into<String>) -> Self {
        AppError::NotFound(NotFoundError::Subject { id: id.into() })
    }

    /// 创建前置条件错误
    pub fn grading_precondition(
        subject_id: impl Into<String>,
        missing: GradingPrecondition,
    ) -> Self {
        AppError::Grading(GradingError::Precondition {
            subject_id: subject_id.into(),
            missing,
        })
    }

    /// 创建评分服务调用失败错误
    pub fn grading_service_failed(
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Grading(GradingError::ServiceFailed {
            source: source.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
