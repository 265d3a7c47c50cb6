// ==========================================
// CSV 导入向导 - 领域层
// ==========================================
// 职责: 文件抽象与向导共享的数据类型
// ==========================================

pub mod file;
pub mod types;

pub use file::{FileReader, ImportFile, LocalFile, MemoryFile};
pub use types::{
    column_code, derive_columns, BaseRow, ChunkInfo, Column, FieldDescriptor, FieldList,
    ImportInfo, PreviewInfo,
};
