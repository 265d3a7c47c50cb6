// ==========================================
// CSV 导入向导 - 预览解析器
// ==========================================
// 职责: 读取文件前缀样本，探测分隔符，解析前几行
// 分类: 致命错误 / 可恢复警告 / 成功（三者取一）
// 约束: 只读有限前缀，预览延迟与文件大小无关
// ==========================================

use crate::domain::file::ImportFile;
use crate::domain::types::PreviewInfo;
use crate::importer::error::{ParseWarning, ParseWarningKind, PreviewError};
use csv::{ReaderBuilder, StringRecord};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 预览读取的字节上限
pub const PREVIEW_CHUNK_BYTES: usize = 20_000;

/// 预览行数上限
pub const PREVIEW_ROW_COUNT: usize = 5;

/// 候选分隔符（按优先级）
pub const DELIMITER_CANDIDATES: [u8; 6] = [b',', b'\t', b'|', b';', 0x1E, 0x1F];

/// 分隔符探测时采样的行数
const DETECT_ROW_LIMIT: usize = 10;

/// 解析文件前缀
///
/// # 返回
/// - Ok(PreviewInfo): 成功，可能附带 parse_warning；has_headers 为占位值 true，由调用方预置
/// - Err(PreviewError): 空文件 / 引号未闭合 / 读取失败
#[instrument(skip(file), fields(file = %file.name(), size = file.size()))]
pub async fn parse_preview(file: Arc<dyn ImportFile>) -> Result<PreviewInfo, PreviewError> {
    let prefix = file
        .read_prefix(PREVIEW_CHUNK_BYTES)
        .await
        .map_err(|e| PreviewError::Read(e.to_string()))?;

    let truncated = (prefix.len() as u64) < file.size();
    debug!(bytes = prefix.len(), truncated, "预览样本读取完成");

    let sample = parse_sample(prefix, truncated)?;

    info!(
        rows = sample.rows.len(),
        delimiter = %(sample.delimiter as char).escape_debug(),
        warning = sample.warning.is_some(),
        "预览解析完成"
    );

    Ok(PreviewInfo {
        file,
        has_headers: true,
        first_chunk: sample.text,
        is_single_line: sample.rows.len() == 1,
        first_rows: sample.rows,
        parse_warning: sample.warning,
        delimiter: sample.delimiter,
    })
}

/// 样本解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSample {
    pub text: String,
    pub rows: Vec<Vec<String>>,
    pub warning: Option<ParseWarning>,
    pub delimiter: u8,
}

/// 解析已读取的前缀字节
///
/// truncated 表示文件比样本更长，此时丢弃末尾不完整的行。
pub fn parse_sample(bytes: Vec<u8>, truncated: bool) -> Result<PreviewSample, PreviewError> {
    let text = decode_sample(bytes, truncated)?;

    let body = if truncated {
        match text.rfind('\n') {
            Some(pos) => &text[..=pos],
            None => &text[..],
        }
    } else {
        &text[..]
    };

    let delimiter = detect_delimiter(body);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(body.as_bytes());

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut record = StringRecord::new();
    while rows.len() < PREVIEW_ROW_COUNT {
        match reader.read_record(&mut record) {
            Ok(true) => {
                if is_blank_record(&record) {
                    continue;
                }
                rows.push(record.iter().map(String::from).collect());
            }
            Ok(false) => break,
            Err(e) => return Err(PreviewError::Read(e.to_string())),
        }
    }

    if rows.is_empty() {
        return Err(PreviewError::EmptyFile);
    }

    // 读到样本末尾时检查引号是否闭合
    // 截断的样本同样适用: 引号字段在预览行内开启并一直延续到样本末尾
    let consumed = reader.position().byte() as usize;
    if consumed >= body.len() && ends_inside_quotes(body, delimiter) {
        warn!(row = rows.len(), "引号未闭合");
        return Err(PreviewError::MissingQuotes { row: rows.len() });
    }

    let warning = detect_field_count_warning(&rows);

    Ok(PreviewSample {
        text,
        rows,
        warning,
        delimiter,
    })
}

/// 探测分隔符: 字段数最一致且平均字段数 > 1.99 的候选，默认逗号
pub fn detect_delimiter(sample: &str) -> u8 {
    let mut best: Option<(u8, usize, f64)> = None;

    for &delimiter in DELIMITER_CANDIDATES.iter() {
        let counts = field_counts(sample, delimiter);
        if counts.is_empty() {
            continue;
        }

        let avg = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
        if avg <= 1.99 {
            continue;
        }

        let delta: usize = counts.windows(2).map(|w| w[0].abs_diff(w[1])).sum();

        let better = match best {
            None => true,
            Some((_, best_delta, best_avg)) => {
                delta < best_delta || (delta == best_delta && avg > best_avg)
            }
        };
        if better {
            best = Some((delimiter, delta, avg));
        }
    }

    best.map(|(delimiter, _, _)| delimiter).unwrap_or(b',')
}

fn field_counts(sample: &str, delimiter: u8) -> Vec<usize> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(sample.as_bytes());

    reader
        .records()
        .filter_map(Result::ok)
        .filter(|r| !is_blank_record(r))
        .take(DETECT_ROW_LIMIT)
        .map(|r| r.len())
        .collect()
}

/// 空行: 仅含一个空字段
pub(crate) fn is_blank_record(record: &StringRecord) -> bool {
    record.len() == 0 || (record.len() == 1 && record[0].is_empty())
}

fn decode_sample(bytes: Vec<u8>, truncated: bool) -> Result<String, PreviewError> {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let utf8_error = err.utf8_error();
            // 前缀截断在多字节字符中间: 丢弃残缺尾部
            if truncated && utf8_error.error_len().is_none() {
                let mut bytes = err.into_bytes();
                bytes.truncate(utf8_error.valid_up_to());
                String::from_utf8(bytes).map_err(|e| PreviewError::Read(e.to_string()))?
            } else {
                return Err(PreviewError::Read(format!(
                    "文件不是有效的 UTF-8 文本: {}",
                    utf8_error
                )));
            }
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

/// 按 RFC 4180 引号规则扫描，判断文本结束时是否仍在引号内
fn ends_inside_quotes(text: &str, delimiter: u8) -> bool {
    let mut scanner = QuoteScanner::new(delimiter);
    scanner.feed(text.as_bytes());
    scanner.is_open()
}

/// 增量引号状态扫描器
///
/// 可分段喂入字节（转义的 "" 可以跨段），用于判断输入结束时是否有未闭合的引号字段。
#[derive(Debug, Clone)]
pub(crate) struct QuoteScanner {
    delimiter: u8,
    in_quotes: bool,
    at_field_start: bool,
    /// 引号内遇到 '"'，尚不确定是转义还是结束
    pending_quote: bool,
}

impl QuoteScanner {
    pub(crate) fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            in_quotes: false,
            at_field_start: true,
            pending_quote: false,
        }
    }

    pub(crate) fn feed(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.pending_quote {
                self.pending_quote = false;
                if b == b'"' {
                    continue;
                }
                self.in_quotes = false;
            }

            if self.in_quotes {
                if b == b'"' {
                    self.pending_quote = true;
                }
                continue;
            }

            if b == b'"' && self.at_field_start {
                self.in_quotes = true;
                self.at_field_start = false;
                continue;
            }
            self.at_field_start = b == self.delimiter || b == b'\n' || b == b'\r';
        }
    }

    /// 输入在此结束时引号字段是否未闭合
    pub(crate) fn is_open(&self) -> bool {
        self.in_quotes && !self.pending_quote
    }
}

fn detect_field_count_warning(rows: &[Vec<String>]) -> Option<ParseWarning> {
    let expected = rows.first()?.len();

    rows.iter().enumerate().skip(1).find_map(|(row, cells)| {
        let actual = cells.len();
        if actual == expected {
            return None;
        }

        let kind = if actual < expected {
            ParseWarningKind::TooFewFields
        } else {
            ParseWarningKind::TooManyFields
        };
        let message = match kind {
            ParseWarningKind::TooFewFields => format!(
                "字段过少: 第 {} 行期望 {} 个字段，实际 {} 个",
                row + 1,
                expected,
                actual
            ),
            ParseWarningKind::TooManyFields => format!(
                "字段过多: 第 {} 行期望 {} 个字段，实际 {} 个",
                row + 1,
                expected,
                actual
            ),
        };

        Some(ParseWarning { kind, row, message })
    })
}
