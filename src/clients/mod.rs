//! 外部服务客户端
//!
//! 评分服务是外部协作方：本层只封装请求构建与响应解析，
//! OCR 与相似度算法完全由服务端负责，客户端不做任何重算。

pub mod grading_client;

pub use grading_client::{
    AnswerKeyPayload, BatchGradeRequest, BatchGradeResponse, GradeDetail, GradingBackend,
    HttpGradingClient, SingleGradeResponse, SubmissionGradeResult, SubmissionPayload,
};
