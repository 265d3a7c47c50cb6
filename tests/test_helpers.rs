// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的文件、分块处理器、事件记录、向导构建
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv_import_wizard::domain::FileReader;
use csv_import_wizard::wizard::{ImportCallbacks, WizardView};
use csv_import_wizard::{
    BaseRow, ChunkInfo, ChunkProcessor, FieldDescriptor, FieldList, ImportFile, ImportResult,
    Importer, ImporterConfig, MemoryFile,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::Notify;

/// 构建字段列表: (名称, 是否必填)
pub fn fields(defs: &[(&str, bool)]) -> FieldList {
    defs.iter()
        .map(|(name, required)| {
            if *required {
                FieldDescriptor::required(*name, name.to_uppercase())
            } else {
                FieldDescriptor::optional(*name, name.to_uppercase())
            }
        })
        .collect()
}

pub fn memory_file(name: &str, text: &str) -> Arc<dyn ImportFile> {
    Arc::new(MemoryFile::from_text(name, text))
}

/// 写入临时 CSV 文件（需要保持存活）
pub fn write_csv(text: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    std::fs::write(file.path(), text).unwrap();
    file
}

/// 生成 rows 行数据（含表头 id,name,score）
pub fn generate_csv(rows: usize) -> String {
    let mut text = String::from("id,name,score\n");
    for i in 0..rows {
        text.push_str(&format!("{},name-{},{}\n", i, i, i * 7 % 100));
    }
    text
}

// ==========================================
// 分块处理器
// ==========================================

/// 记录收到的每一块；可配置在第 N 次调用时失败
#[derive(Default)]
pub struct RecordingProcessor {
    chunks: Mutex<Vec<(Vec<BaseRow>, ChunkInfo)>>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    gate: Option<Arc<Notify>>,
}

impl RecordingProcessor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 第 call 次调用（从 1 开始）返回错误
    pub fn failing_on(call: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_on_call: Some(call),
            ..Self::default()
        })
    }

    /// 每块等待 gate 放行
    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    pub fn chunks(&self) -> Vec<(Vec<BaseRow>, ChunkInfo)> {
        self.chunks.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChunkProcessor for RecordingProcessor {
    async fn process_chunk(&self, rows: Vec<BaseRow>, info: ChunkInfo) -> anyhow::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if Some(call) == self.fail_on_call {
            anyhow::bail!("upload rejected at chunk {}", call);
        }
        self.chunks.lock().unwrap().push((rows, info));
        Ok(())
    }
}

// ==========================================
// 文件
// ==========================================

/// 统计 open 次数；可选地在打开前等待放行
#[derive(Debug)]
pub struct CountingFile {
    inner: MemoryFile,
    opens: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl CountingFile {
    pub fn new(name: &str, text: &str) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryFile::from_text(name, text),
            opens: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub fn gated(name: &str, text: &str, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryFile::from_text(name, text),
            opens: AtomicUsize::new(0),
            gate: Some(gate),
        })
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImportFile for CountingFile {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.inner.last_modified()
    }

    async fn open(&self) -> ImportResult<FileReader> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open().await
    }
}

// ==========================================
// 生命周期事件记录
// ==========================================

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn callbacks(&self, with_close: bool) -> ImportCallbacks {
        let start = self.clone();
        let complete = self.clone();
        let close = self.clone();
        let callbacks = ImportCallbacks::new()
            .with_on_start(move |info| start.push(format!("start:{}", info.fields.join("+"))))
            .with_on_complete(move |info| {
                complete.push(format!("complete:{}", info.fields.join("+")))
            });
        if with_close {
            callbacks.with_on_close(move |info| close.push(format!("close:{}", info.file.name())))
        } else {
            callbacks
        }
    }

    fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ==========================================
// 向导
// ==========================================

pub fn build_importer(
    config: ImporterConfig,
    fields: FieldList,
    processor: Arc<RecordingProcessor>,
    callbacks: ImportCallbacks,
) -> Importer {
    csv_import_wizard::logging::init_test();
    Importer::builder()
        .config(config)
        .fields(fields)
        .processor(processor)
        .callbacks(callbacks)
        .build()
        .expect("Failed to build importer")
}

/// 等待满足条件的快照（5 秒超时）
pub async fn wait_view<P>(importer: &Importer, predicate: P) -> WizardView
where
    P: FnMut(&WizardView) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), importer.wait_for(predicate))
        .await
        .expect("wizard did not reach expected state in time")
        .expect("wizard state channel closed")
}

pub fn cell<'a>(row: &'a BaseRow, field: &str) -> &'a str {
    row.get(field).map(String::as_str).unwrap_or("<missing>")
}
