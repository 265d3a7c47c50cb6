// ==========================================
// CSV 导入向导 - 文件抽象
// ==========================================
// 职责: 对宿主提供的二进制文件做能力抽象
// 能力: 名称 / 大小 / 修改时间 / 流式读取 / 全文读取
// 约束: 文件只被引用（Arc），向导从不复制内容
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};

/// 流式读取句柄
pub type FileReader = Box<dyn AsyncRead + Unpin + Send>;

// ==========================================
// ImportFile Trait
// ==========================================
// 实现者: LocalFile, MemoryFile, 以及宿主自定义的 Blob 适配
#[async_trait]
pub trait ImportFile: Send + Sync + fmt::Debug {
    /// 文件名（含扩展名）
    fn name(&self) -> &str;

    /// 文件字节数
    fn size(&self) -> u64;

    /// 最后修改时间（宿主未提供时为 None）
    fn last_modified(&self) -> Option<DateTime<Utc>>;

    /// 媒体类型，如 "text/csv"
    fn content_type(&self) -> Option<&str> {
        None
    }

    /// 打开一个新的读取流，每次调用都从头开始
    async fn open(&self) -> ImportResult<FileReader>;

    /// 读取前 max_bytes 个字节
    async fn read_prefix(&self, max_bytes: usize) -> ImportResult<Vec<u8>> {
        let reader = self.open().await?;
        let capacity = max_bytes.min(self.size() as usize);
        let mut buf = Vec::with_capacity(capacity);
        reader.take(max_bytes as u64).read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// 读取全文（UTF-8）
    async fn text(&self) -> ImportResult<String> {
        let mut reader = self.open().await?;
        let mut buf = String::new();
        reader.read_to_string(&mut buf).await?;
        Ok(buf)
    }
}

// ==========================================
// LocalFile - 本地磁盘文件
// ==========================================
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
    last_modified: Option<DateTime<Utc>>,
}

impl LocalFile {
    /// 读取元数据并创建句柄
    ///
    /// # 返回
    /// - Err(FileNotFound): 路径不存在
    /// - Err(FileReadError): 路径不是普通文件或元数据不可读
    pub async fn from_path(path: impl AsRef<Path>) -> ImportResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ImportError::FileNotFound(path.display().to_string()),
            _ => ImportError::FileReadError(format!("{}: {}", path.display(), e)),
        })?;

        if !metadata.is_file() {
            return Err(ImportError::FileReadError(format!(
                "不是普通文件: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size: metadata.len(),
            last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImportFile for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    async fn open(&self) -> ImportResult<FileReader> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(Box::new(file))
    }
}

// ==========================================
// MemoryFile - 内存中的文件（宿主已持有 Blob / 测试）
// ==========================================
#[derive(Clone)]
pub struct MemoryFile {
    name: String,
    bytes: Arc<[u8]>,
    last_modified: Option<DateTime<Utc>>,
    content_type: Option<String>,
}

impl MemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::from(bytes.into()),
            last_modified: None,
            content_type: None,
        }
    }

    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, text.as_bytes().to_vec())
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for MemoryFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .field("last_modified", &self.last_modified)
            .field("content_type", &self.content_type)
            .finish()
    }
}

#[async_trait]
impl ImportFile for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn open(&self) -> ImportResult<FileReader> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.bytes))))
    }
}
