// ==========================================
// CSV 导入向导 - 分块处理回调接口
// ==========================================
// 用途: 宿主在此执行上传/落库等副作用
// 约束: 处理器返回之前不会收到下一块
// ==========================================

use crate::domain::types::{BaseRow, ChunkInfo};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

// ==========================================
// ChunkProcessor Trait
// ==========================================
// 实现者: 宿主应用；闭包可用 chunk_fn 包装
#[async_trait]
pub trait ChunkProcessor: Send + Sync {
    /// 处理一块已映射的行
    ///
    /// # 参数
    /// - rows: 字段名 → 单元格文本
    /// - info: 本块起始行序号
    ///
    /// # 返回
    /// - Err: 整个导入以该错误失败，不再请求后续块
    async fn process_chunk(&self, rows: Vec<BaseRow>, info: ChunkInfo) -> anyhow::Result<()>;
}

#[async_trait]
impl<T> ChunkProcessor for Arc<T>
where
    T: ChunkProcessor + ?Sized,
{
    async fn process_chunk(&self, rows: Vec<BaseRow>, info: ChunkInfo) -> anyhow::Result<()> {
        (**self).process_chunk(rows, info).await
    }
}

/// 闭包适配器
pub struct FnChunkProcessor<F> {
    f: F,
}

/// 用异步闭包实现 ChunkProcessor
///
/// ```no_run
/// use csv_import_wizard::importer::chunk_fn;
/// let processor = chunk_fn(|rows, info| async move {
///     println!("{} rows from {}", rows.len(), info.start_index);
///     Ok(())
/// });
/// ```
pub fn chunk_fn<F, Fut>(f: F) -> FnChunkProcessor<F>
where
    F: Fn(Vec<BaseRow>, ChunkInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    FnChunkProcessor { f }
}

#[async_trait]
impl<F, Fut> ChunkProcessor for FnChunkProcessor<F>
where
    F: Fn(Vec<BaseRow>, ChunkInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn process_chunk(&self, rows: Vec<BaseRow>, info: ChunkInfo) -> anyhow::Result<()> {
        (self.f)(rows, info).await
    }
}
