// ==========================================
// CSV 导入向导 - 配置层
// ==========================================
// 职责: 向导配置加载、键值覆写、校验
// 来源: JSON 文件 / 字符串 + 键值覆写（命令行、宿主）
// ==========================================

pub mod importer_config;

// 重导出核心配置类型
pub use importer_config::{config_keys, FilePickerOptions, ImporterConfig};
