/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 本地数据目录（各集合以 JSON 文件形式存放）
    pub data_dir: String,
    /// 评分服务的基础 URL
    pub grading_api_base_url: String,
    /// 评分请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "grader_data".to_string(),
            grading_api_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 300,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            data_dir: std::env::var("GRADER_DATA_DIR").unwrap_or(default.data_dir),
            grading_api_base_url: std::env::var("GRADING_API_BASE_URL")
                .unwrap_or(default.grading_api_base_url),
            request_timeout_secs: std::env::var("GRADING_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.verbose_logging),
        }
    }
}
