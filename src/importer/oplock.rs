// ==========================================
// CSV 导入向导 - 异步操作锁（代数计数器）
// ==========================================
// 职责: 发现并丢弃过期的异步结果
// 语义: 协作式、建议性；不会中断底层流，只忽略其结果
// ==========================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// 单调递增的代数计数器
///
/// 每个异步操作开始时取一张票据；屏幕卸载或输入变化时调用 `invalidate`，
/// 之后旧票据的 `is_current` 返回 false。
#[derive(Debug, Clone, Default)]
pub struct OpLock {
    generation: Arc<AtomicU64>,
}

impl OpLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 捕获当前代数
    pub fn ticket(&self) -> OpTicket {
        OpTicket {
            generation: self.generation.load(Ordering::SeqCst),
            current: Arc::clone(&self.generation),
        }
    }

    /// 作废所有已发出的票据
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

/// 异步操作持有的票据
#[derive(Debug, Clone)]
pub struct OpTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl OpTicket {
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
