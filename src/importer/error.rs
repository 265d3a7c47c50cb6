// ==========================================
// CSV 导入向导 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分层: 预览错误（格式页内联展示） / 导入错误（其余一切）
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("文件被拒绝 ({file}): {reason}")]
    FileRejected { file: String, reason: String },

    // ===== 解析错误 =====
    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    // ===== 列分配错误 =====
    #[error("未知字段: {0}")]
    UnknownField(String),

    #[error("列索引越界: {index}（共 {count} 列）")]
    ColumnOutOfRange { index: usize, count: usize },

    // ===== 向导状态错误 =====
    #[error("当前步骤 {step} 不支持操作: {action}")]
    InvalidTransition { step: String, action: String },

    #[error("操作不可用: {0}")]
    ActionDisabled(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    /// 宿主分块回调返回的错误
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(err.to_string()),
            _ => ImportError::FileReadError(err.to_string()),
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<csv_async::Error> for ImportError {
    fn from(err: csv_async::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::ConfigReadError {
            key: "json".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// 预览阶段的致命错误
// ==========================================

/// 格式预览页的致命错误（阻断继续，只能返回）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("文件为空")]
    EmptyFile,

    #[error("引号未闭合 (第 {row} 行)")]
    MissingQuotes { row: usize },

    #[error("文件读取失败: {0}")]
    Read(String),
}

// ==========================================
// 预览阶段的可恢复警告
// ==========================================

/// 警告类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseWarningKind {
    /// 字段数少于首行
    TooFewFields,
    /// 字段数多于首行
    TooManyFields,
}

impl ParseWarningKind {
    pub fn as_str(&self) -> &str {
        match self {
            ParseWarningKind::TooFewFields => "TooFewFields",
            ParseWarningKind::TooManyFields => "TooManyFields",
        }
    }
}

/// 结构性不一致（如列数不一致），预览行仍尽力给出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub kind: ParseWarningKind,
    /// 出现问题的行（从 0 开始，按预览行计）
    pub row: usize,
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
