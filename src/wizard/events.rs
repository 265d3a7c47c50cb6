// ==========================================
// CSV 导入向导 - 生命周期事件
// ==========================================
// 回调总在状态锁之外触发，回调中可以再次调用向导
// ==========================================

use crate::domain::types::ImportInfo;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// 生命周期回调
pub type LifecycleCallback = Arc<dyn Fn(&ImportInfo) + Send + Sync>;

#[derive(Clone, Default)]
pub struct ImportCallbacks {
    /// 进度页挂载时（每次挂载一次）
    pub on_start: Option<LifecycleCallback>,
    /// 处理成功结束时（每次挂载至多一次）
    pub on_complete: Option<LifecycleCallback>,
    /// 成功后用户关闭时（至多一次）
    pub on_close: Option<LifecycleCallback>,
}

impl ImportCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_start<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImportInfo) + Send + Sync + 'static,
    {
        self.on_start = Some(Arc::new(f));
        self
    }

    pub fn with_on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImportInfo) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(f));
        self
    }

    pub fn with_on_close<F>(mut self, f: F) -> Self
    where
        F: Fn(&ImportInfo) + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(f));
        self
    }

    /// 宿主是否提供了关闭回调（决定进度页按钮布局）
    pub fn has_close(&self) -> bool {
        self.on_close.is_some()
    }

    pub fn dispatch(&self, event: &ImportEvent) {
        let info = event.info();
        info!(
            event = event.as_str(),
            file = %info.file.name(),
            fields = ?info.fields,
            "触发生命周期事件"
        );

        let callback = match event {
            ImportEvent::Started(_) => &self.on_start,
            ImportEvent::Completed(_) => &self.on_complete,
            ImportEvent::Closed(_) => &self.on_close,
        };
        if let Some(callback) = callback {
            callback(info);
        }
    }
}

impl fmt::Debug for ImportCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportCallbacks")
            .field("on_start", &self.on_start.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum ImportEvent {
    Started(ImportInfo),
    Completed(ImportInfo),
    Closed(ImportInfo),
}

impl ImportEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportEvent::Started(_) => "start",
            ImportEvent::Completed(_) => "complete",
            ImportEvent::Closed(_) => "close",
        }
    }

    pub fn info(&self) -> &ImportInfo {
        match self {
            ImportEvent::Started(info) | ImportEvent::Completed(info) | ImportEvent::Closed(info) => {
                info
            }
        }
    }
}
