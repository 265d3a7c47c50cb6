// ==========================================
// CSV 导入向导 - 导入层
// ==========================================
// 职责: 预览解析、列分配、分块处理、进度估算
// 约束: 同一时刻最多一个分块在宿主回调中
// ==========================================

// 模块声明
pub mod chunk_processor;
pub mod column_assignment;
pub mod error;
pub mod file_processor;
pub mod oplock;
pub mod preview_parser;
pub mod progress;

// 重导出核心类型
pub use chunk_processor::{chunk_fn, ChunkProcessor, FnChunkProcessor};
pub use column_assignment::FieldAssignmentMap;
pub use error::{ImportError, ImportResult, ParseWarning, ParseWarningKind, PreviewError};
pub use file_processor::{
    process_file, process_file_with_delimiter, resolve_chunk_size, DEFAULT_CHUNK_SIZE,
};
pub use oplock::{OpLock, OpTicket};
pub use preview_parser::{detect_delimiter, parse_preview, parse_sample, PreviewSample};
pub use progress::{estimate_row_count, progress_percentage, ProgressEstimator};
