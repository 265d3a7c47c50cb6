// ==========================================
// CSV 导入向导 - 核心库
// ==========================================
// 流程: 选择文件 → 格式预览（表头检测）→ 列分配 → 分块导入
// 形态: 无界面向导，宿主负责渲染与文件来源
// 扩展点: ChunkProcessor（每块行数据交给宿主上传/落库）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 文件抽象与数据类型
pub mod domain;

// 导入层 - 预览解析、列分配、分块处理、进度估算
pub mod importer;

// 向导层 - 状态机与页面视图模型
pub mod wizard;

// 配置层 - 向导配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BaseRow, ChunkInfo, Column, FieldDescriptor, FieldList, ImportFile, ImportInfo, LocalFile,
    MemoryFile, PreviewInfo,
};

// 导入层
pub use importer::{
    chunk_fn, ChunkProcessor, FieldAssignmentMap, ImportError, ImportResult, ParseWarning,
    PreviewError,
};

// 向导
pub use wizard::{ImportCallbacks, Importer, ImporterBuilder, WizardStep, WizardView};

// 配置
pub use config::{FilePickerOptions, ImporterConfig};

// ==========================================
// 常量定义
// ==========================================

// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 名称
pub const APP_NAME: &str = "CSV 导入向导";
