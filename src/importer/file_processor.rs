// ==========================================
// CSV 导入向导 - 分块文件处理器
// ==========================================
// 流程: 流式解析 → 跳过表头 → 列映射 → 分块回调 → 进度增量
// 背压: 当前块的回调完成之前不读取下一块（严格单块在途）
// ==========================================

use crate::domain::file::ImportFile;
use crate::domain::types::{BaseRow, ChunkInfo};
use crate::importer::chunk_processor::ChunkProcessor;
use crate::importer::column_assignment::FieldAssignmentMap;
use crate::importer::error::{ImportError, ImportResult};
use crate::domain::file::FileReader;
use crate::importer::preview_parser::{detect_delimiter, QuoteScanner, PREVIEW_CHUNK_BYTES};
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tracing::{debug, info, instrument, warn};

/// 默认每块行数
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// 处理整个文件（分隔符从文件前缀重新探测）
///
/// # 参数
/// - file: 待导入文件
/// - has_headers: 首行是否为表头（为 true 时不输出首行）
/// - field_assignments: 字段 → 列
/// - on_progress: 每块回调完成后以本块行数调用（非累计，空块也调用）
/// - processor: 宿主分块处理器
/// - chunk_size: 每块行数，None 使用 DEFAULT_CHUNK_SIZE
///
/// # 返回
/// - Ok(()): 读到文件末尾且最后一块回调成功
/// - Err: 流中途解析失败，或处理器返回错误（之后不再请求任何块）
pub async fn process_file<F>(
    file: Arc<dyn ImportFile>,
    has_headers: bool,
    field_assignments: &FieldAssignmentMap,
    on_progress: F,
    processor: &dyn ChunkProcessor,
    chunk_size: Option<usize>,
) -> ImportResult<()>
where
    F: FnMut(usize),
{
    let prefix = file.read_prefix(PREVIEW_CHUNK_BYTES).await?;
    let truncated = (prefix.len() as u64) < file.size();
    let text = String::from_utf8_lossy(&prefix);
    let sample = match (truncated, text.rfind('\n')) {
        (true, Some(pos)) => &text[..=pos],
        _ => &text[..],
    };
    let delimiter = detect_delimiter(sample);

    process_file_with_delimiter(
        file,
        has_headers,
        field_assignments,
        on_progress,
        processor,
        chunk_size,
        delimiter,
    )
    .await
}

/// 处理整个文件（使用预览阶段探测到的分隔符）
#[instrument(skip_all, fields(file = %file.name(), has_headers = has_headers))]
pub async fn process_file_with_delimiter<F>(
    file: Arc<dyn ImportFile>,
    has_headers: bool,
    field_assignments: &FieldAssignmentMap,
    mut on_progress: F,
    processor: &dyn ChunkProcessor,
    chunk_size: Option<usize>,
    delimiter: u8,
) -> ImportResult<()>
where
    F: FnMut(usize),
{
    let chunk_size = resolve_chunk_size(chunk_size)?;
    let columns: Vec<(String, usize)> = field_assignments
        .iter()
        .map(|(name, idx)| (name.to_string(), idx))
        .collect();

    let mut stream = RowStream::new(file.open().await?, delimiter, has_headers, columns);
    let mut processed = 0usize;
    let mut chunk_count = 0usize;

    // 预读一行: 块内最后一行之后的内容确认无误后才交给处理器
    let mut pending = stream.next_row().await?;
    while pending.is_some() {
        let mut rows: Vec<BaseRow> = Vec::with_capacity(chunk_size.min(1024));
        while rows.len() < chunk_size {
            match pending.take() {
                Some(row) => rows.push(row),
                None => break,
            }
            pending = stream.next_row().await?;
        }

        let delta = rows.len();
        let info = ChunkInfo {
            start_index: processed,
        };
        processed += delta;

        processor.process_chunk(rows, info).await.map_err(|e| {
            warn!(chunk = chunk_count, start_index = info.start_index, error = %e, "分块回调失败");
            ImportError::Other(e)
        })?;

        chunk_count += 1;
        debug!(chunk = chunk_count, rows = delta, start_index = info.start_index, "分块处理完成");
        on_progress(delta);
    }

    info!(rows = processed, chunks = chunk_count, "文件处理完成");
    Ok(())
}

/// 校验每块行数
pub fn resolve_chunk_size(chunk_size: Option<usize>) -> ImportResult<usize> {
    match chunk_size {
        None => Ok(DEFAULT_CHUNK_SIZE),
        Some(0) => Err(ImportError::ConfigValueError {
            key: "chunk_size".to_string(),
            value: "0".to_string(),
            message: "每块行数必须为正整数".to_string(),
        }),
        Some(n) => Ok(n),
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 0 || (record.len() == 1 && record.get(0).map_or(true, str::is_empty))
}

/// 逐行读取并映射数据行
struct RowStream {
    csv: AsyncReader<QuoteTrackingReader>,
    quote_open: Arc<AtomicBool>,
    record: StringRecord,
    skip_header: bool,
    columns: Vec<(String, usize)>,
    rows_read: usize,
}

impl RowStream {
    fn new(
        reader: FileReader,
        delimiter: u8,
        has_headers: bool,
        columns: Vec<(String, usize)>,
    ) -> Self {
        let reader = QuoteTrackingReader::new(reader, delimiter);
        let quote_open = reader.open_flag();
        let csv = AsyncReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .create_reader(reader);

        Self {
            csv,
            quote_open,
            record: StringRecord::new(),
            skip_header: has_headers,
            columns,
            rows_read: 0,
        }
    }

    /// 下一条数据行；文件结束返回 None
    ///
    /// 宽松模式下未闭合的引号会吞掉剩余内容，结束时据此改判为解析失败。
    async fn next_row(&mut self) -> ImportResult<Option<BaseRow>> {
        loop {
            if !self.csv.read_record(&mut self.record).await? {
                if self.quote_open.load(Ordering::Acquire) {
                    warn!(row = self.rows_read, "文件结束时引号字段未闭合");
                    return Err(ImportError::CsvParseError(format!(
                        "引号未闭合: 第 {} 行数据的引号字段直到文件末尾仍未结束",
                        self.rows_read
                    )));
                }
                return Ok(None);
            }
            if is_blank(&self.record) {
                continue;
            }
            if self.skip_header {
                self.skip_header = false;
                continue;
            }
            self.rows_read += 1;
            return Ok(Some(map_row(&self.record, &self.columns)));
        }
    }
}

/// 读取时同步跟踪引号状态的包装器
struct QuoteTrackingReader {
    inner: FileReader,
    scanner: QuoteScanner,
    open: Arc<AtomicBool>,
}

impl QuoteTrackingReader {
    fn new(inner: FileReader, delimiter: u8) -> Self {
        Self {
            inner,
            scanner: QuoteScanner::new(delimiter),
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    fn open_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.open)
    }
}

impl AsyncRead for QuoteTrackingReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            this.scanner.feed(&buf.filled()[before..]);
            this.open.store(this.scanner.is_open(), Ordering::Release);
        }
        poll
    }
}

fn map_row(record: &StringRecord, columns: &[(String, usize)]) -> BaseRow {
    columns
        .iter()
        .map(|(name, idx)| (name.clone(), record.get(*idx).unwrap_or("").to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::file::MemoryFile;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        chunks: Mutex<Vec<(Vec<BaseRow>, ChunkInfo)>>,
        fail_on_chunk: Option<usize>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChunkProcessor for Recorder {
        async fn process_chunk(&self, rows: Vec<BaseRow>, info: ChunkInfo) -> anyhow::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_chunk == Some(call) {
                anyhow::bail!("upload rejected");
            }
            self.chunks.lock().unwrap().push((rows, info));
            Ok(())
        }
    }

    fn file(text: &str) -> Arc<dyn ImportFile> {
        Arc::new(MemoryFile::from_text("data.csv", text))
    }

    fn numbered_rows(count: usize) -> String {
        let mut text = String::from("id,name\n");
        for i in 0..count {
            text.push_str(&format!("{},n{}\n", i, i));
        }
        text
    }

    fn row(pairs: &[(&str, &str)]) -> BaseRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_header_skipped_and_fields_mapped() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("f1", 0);

        let recorder = Recorder::default();
        let mut deltas = Vec::new();
        process_file(
            file("a,b,c\n1,2,3\n4,5,6\n"),
            true,
            &assignments,
            |d| deltas.push(d),
            &recorder,
            Some(10),
        )
        .await
        .unwrap();

        let chunks = recorder.chunks.lock().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0, vec![row(&[("f1", "1")]), row(&[("f1", "4")])]);
        assert_eq!(chunks[0].1, ChunkInfo { start_index: 0 });
        assert_eq!(deltas, vec![2]);
    }

    #[tokio::test]
    async fn test_chunk_count_and_deltas() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("id", 0);

        for (total, size, expected_chunks) in [(25usize, 10usize, 3usize), (20, 10, 2), (3, 1, 3), (0, 5, 0)] {
            let recorder = Recorder::default();
            let mut deltas = Vec::new();
            process_file(
                file(&numbered_rows(total)),
                true,
                &assignments,
                |d| deltas.push(d),
                &recorder,
                Some(size),
            )
            .await
            .unwrap();

            let chunks = recorder.chunks.lock().unwrap();
            assert_eq!(chunks.len(), expected_chunks);
            assert_eq!(deltas.iter().sum::<usize>(), total);
            for (n, (rows, info)) in chunks.iter().enumerate() {
                assert_eq!(info.start_index, n * size);
                assert!(rows.len() <= size);
            }
        }
    }

    #[tokio::test]
    async fn test_without_headers_first_row_is_data() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("x", 1);

        let recorder = Recorder::default();
        process_file(file("a,b\n1,2\n"), false, &assignments, |_| {}, &recorder, None)
            .await
            .unwrap();

        let chunks = recorder.chunks.lock().unwrap();
        assert_eq!(chunks[0].0, vec![row(&[("x", "b")]), row(&[("x", "2")])]);
    }

    #[tokio::test]
    async fn test_missing_cell_maps_to_empty() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("far", 5);

        let recorder = Recorder::default();
        process_file(file("a,b\n1,2\n"), true, &assignments, |_| {}, &recorder, None)
            .await
            .unwrap();

        let chunks = recorder.chunks.lock().unwrap();
        assert_eq!(chunks[0].0, vec![row(&[("far", "")])]);
    }

    #[tokio::test]
    async fn test_semicolon_file_is_detected() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("b", 1);

        let recorder = Recorder::default();
        process_file(file("a;b\n1;2\n"), true, &assignments, |_| {}, &recorder, None)
            .await
            .unwrap();

        let chunks = recorder.chunks.lock().unwrap();
        assert_eq!(chunks[0].0, vec![row(&[("b", "2")])]);
    }

    #[tokio::test]
    async fn test_processor_error_stops_processing() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("id", 0);

        let recorder = Recorder {
            fail_on_chunk: Some(1),
            ..Default::default()
        };
        let mut deltas = Vec::new();
        let result = process_file(
            file(&numbered_rows(30)),
            true,
            &assignments,
            |d| deltas.push(d),
            &recorder,
            Some(10),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "upload rejected");
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(deltas, vec![10]);
    }

    #[tokio::test]
    async fn test_unterminated_quote_mid_stream_fails() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("a", 0);

        let recorder = Recorder::default();
        let result = process_file(
            file("a,b\n1,2\n\"3,4\n5,6\n"),
            true,
            &assignments,
            |_| {},
            &recorder,
            None,
        )
        .await;

        assert!(matches!(result, Err(ImportError::CsvParseError(_))));
        // 含错误行的块不交给处理器
        assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chunks_before_broken_quote_are_delivered() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("a", 0);

        let recorder = Recorder::default();
        let mut deltas = Vec::new();
        let result = process_file(
            file("a,b\n1,2\n3,4\n\"5,6\n7,8\n"),
            true,
            &assignments,
            |d| deltas.push(d),
            &recorder,
            Some(1),
        )
        .await;

        assert!(matches!(result, Err(ImportError::CsvParseError(_))));
        assert_eq!(deltas, vec![1, 1]);
        assert_eq!(recorder.chunks.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_escaped_quotes_are_not_errors() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("a", 0);

        let recorder = Recorder::default();
        process_file(
            file("a,b\n\"say \"\"hi\"\"\",2\n\"multi\nline\",3\n"),
            true,
            &assignments,
            |_| {},
            &recorder,
            None,
        )
        .await
        .unwrap();

        let chunks = recorder.chunks.lock().unwrap();
        assert_eq!(
            chunks[0].0,
            vec![row(&[("a", "say \"hi\"")]), row(&[("a", "multi\nline")])]
        );
    }

    #[tokio::test]
    async fn test_zero_chunk_size_rejected() {
        let assignments = FieldAssignmentMap::new();
        let recorder = Recorder::default();
        let result = process_file(file("a\n1\n"), true, &assignments, |_| {}, &recorder, Some(0)).await;
        assert!(matches!(result, Err(ImportError::ConfigValueError { .. })));
    }

    struct SlowProcessor {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        order: Mutex<Vec<(usize, &'static str)>>,
    }

    #[async_trait]
    impl ChunkProcessor for SlowProcessor {
        async fn process_chunk(&self, _rows: Vec<BaseRow>, info: ChunkInfo) -> anyhow::Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.order.lock().unwrap().push((info.start_index, "start"));
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.order.lock().unwrap().push((info.start_index, "end"));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_one_chunk_in_flight() {
        let mut assignments = FieldAssignmentMap::new();
        assignments.assign("id", 0);

        let processor = SlowProcessor {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            order: Mutex::new(Vec::new()),
        };
        process_file(
            file(&numbered_rows(12)),
            true,
            &assignments,
            |_| {},
            &processor,
            Some(3),
        )
        .await
        .unwrap();

        assert_eq!(processor.max_in_flight.load(Ordering::SeqCst), 1);
        let order = processor.order.lock().unwrap();
        assert_eq!(order.len(), 8);
        for pair in order.chunks(2) {
            assert_eq!(pair[0].0, pair[1].0);
            assert_eq!((pair[0].1, pair[1].1), ("start", "end"));
        }
    }
}
