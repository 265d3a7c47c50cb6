// ==========================================
// 日志系统初始化
// ==========================================
// 输出: stderr（stdout 留给分块 JSON 输出）
// 格式: 文本 / JSON 行（供宿主日志采集）
// 级别: RUST_LOG，缺省 DEFAULT_DIRECTIVE
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// RUST_LOG 未设置或无法解析时的过滤指令
pub const DEFAULT_DIRECTIVE: &str = "info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// 命令行 --json-logs 开关
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// 初始化日志系统（进程内只调用一次）
///
/// # 示例
/// ```no_run
/// use csv_import_wizard::logging::{self, LogFormat};
/// logging::init(LogFormat::Text);
/// ```
pub fn init(format: LogFormat) {
    let builder = fmt().with_env_filter(env_filter()).with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(true).with_line_number(true).init(),
        LogFormat::Json => builder.json().with_current_span(true).init(),
    }
}

/// 初始化测试环境的日志系统，重复调用无副作用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flag() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Text);
        assert_eq!(LogFormat::default().as_str(), "text");
    }

    #[test]
    fn test_init_test_is_idempotent() {
        init_test();
        init_test();
        tracing::debug!("日志已初始化");
    }
}
