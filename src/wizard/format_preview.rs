// ==========================================
// CSV 导入向导 - 格式预览页
// ==========================================
// 三种结果互斥: 致命错误 / 警告 / 成功
// 错误与警告都阻止进入下一步，只能返回
// 编辑路径直接复用已确认的预览，不重新读取文件
// ==========================================

use crate::domain::file::ImportFile;
use crate::domain::types::PreviewInfo;
use crate::i18n::{Translation, TranslationKey};
use crate::importer::error::{ImportError, ImportResult, PreviewError};
use crate::importer::oplock::{OpLock, OpTicket};
use crate::wizard::frame::{FrameView, ImporterFrame};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 原始内容预览的最大字符数
pub const RAW_PREVIEW_SIZE: usize = 500;

#[derive(Debug, Clone)]
enum PreviewState {
    Loading,
    Failed(PreviewError),
    Ready(PreviewInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawPreview {
    pub text: String,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatPreviewView {
    pub loading: bool,
    /// 加载中提示
    pub pending_text: Option<String>,
    /// "Import error: <原因>"
    pub error: Option<String>,
    /// "<原因>: please check data formatting"
    pub warning: Option<String>,
    pub go_back_label: String,
    pub raw_title: String,
    pub raw_preview: Option<RawPreview>,
    pub preview_title: String,
    pub has_headers: bool,
    pub header_toggle_label: String,
    /// 单行文件或有警告时隐藏
    pub header_toggle_visible: bool,
    pub header_row: Option<Vec<String>>,
    pub data_rows: Vec<Vec<String>>,
}

#[derive(Debug)]
pub struct FormatPreview {
    file: Arc<dyn ImportFile>,
    state: PreviewState,
    oplock: OpLock,
    assume_no_headers: bool,
}

impl FormatPreview {
    /// 新文件: 进入加载状态，由调用方启动预览任务
    pub fn loading(file: Arc<dyn ImportFile>, assume_no_headers: bool) -> Self {
        Self {
            file,
            state: PreviewState::Loading,
            oplock: OpLock::new(),
            assume_no_headers,
        }
    }

    /// 编辑路径: 使用已确认的预览
    pub fn with_current(preview: PreviewInfo) -> Self {
        Self {
            file: preview.file.clone(),
            assume_no_headers: false,
            oplock: OpLock::new(),
            state: PreviewState::Ready(preview),
        }
    }

    pub fn file(&self) -> &Arc<dyn ImportFile> {
        &self.file
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PreviewState::Loading)
    }

    pub fn ticket(&self) -> OpTicket {
        self.oplock.ticket()
    }

    /// 页面卸载: 之后到达的预览结果一律丢弃
    pub fn unmount(&self) {
        self.oplock.invalidate();
    }

    /// 提交预览结果
    ///
    /// # 返回
    /// - true: 已应用
    /// - false: 票据过期或已非加载状态，结果被丢弃
    pub fn commit(&mut self, ticket: &OpTicket, result: Result<PreviewInfo, PreviewError>) -> bool {
        if !ticket.is_current() || !self.is_loading() {
            debug!(file = %self.file.name(), "丢弃过期的预览结果");
            return false;
        }

        self.state = match result {
            Ok(mut preview) => {
                preview.seed_has_headers(self.assume_no_headers);
                info!(
                    file = %self.file.name(),
                    has_headers = preview.has_headers,
                    single_line = preview.is_single_line,
                    warning = preview.parse_warning.is_some(),
                    "预览就绪"
                );
                PreviewState::Ready(preview)
            }
            Err(e) => {
                warn!(file = %self.file.name(), error = %e, "预览失败");
                PreviewState::Failed(e)
            }
        };
        true
    }

    fn ready(&self) -> Option<&PreviewInfo> {
        match &self.state {
            PreviewState::Ready(preview) => Some(preview),
            _ => None,
        }
    }

    fn toggle_visible(&self) -> bool {
        self.ready()
            .map(|p| !p.is_single_line && p.parse_warning.is_none())
            .unwrap_or(false)
    }

    pub fn next_enabled(&self) -> bool {
        self.ready()
            .map(|p| p.parse_warning.is_none())
            .unwrap_or(false)
    }

    /// 切换表头标志，返回新值
    pub fn toggle_has_headers(&mut self) -> ImportResult<bool> {
        if !self.toggle_visible() {
            return Err(ImportError::ActionDisabled("当前预览不支持切换表头".to_string()));
        }
        match &mut self.state {
            PreviewState::Ready(preview) => {
                preview.has_headers = !preview.has_headers;
                debug!(has_headers = preview.has_headers, "切换表头标志");
                Ok(preview.has_headers)
            }
            _ => Err(ImportError::InternalError("预览未就绪".to_string())),
        }
    }

    /// 确认预览，返回带表头标志的预览信息
    pub fn accept(&self) -> ImportResult<PreviewInfo> {
        match &self.state {
            PreviewState::Ready(preview) if preview.parse_warning.is_none() => Ok(preview.clone()),
            PreviewState::Ready(_) => Err(ImportError::ActionDisabled(
                "预览存在格式警告，无法继续".to_string(),
            )),
            PreviewState::Failed(e) => Err(ImportError::ActionDisabled(format!(
                "预览失败，无法继续: {}",
                e
            ))),
            PreviewState::Loading => {
                Err(ImportError::ActionDisabled("预览加载中".to_string()))
            }
        }
    }

    pub fn view(&self, translation: &Translation) -> FormatPreviewView {
        let mut view = FormatPreviewView {
            loading: self.is_loading(),
            pending_text: None,
            error: None,
            warning: None,
            go_back_label: translation.get(TranslationKey::GoBack),
            raw_title: translation.get(TranslationKey::RawFileContent),
            raw_preview: None,
            preview_title: translation.get(TranslationKey::PreviewImport),
            has_headers: false,
            header_toggle_label: translation.get(TranslationKey::DataHasHeaders),
            header_toggle_visible: self.toggle_visible(),
            header_row: None,
            data_rows: Vec::new(),
        };

        match &self.state {
            PreviewState::Loading => {
                view.pending_text =
                    Some(format!("{}...", translation.get(TranslationKey::LoadingPreview)));
            }
            PreviewState::Failed(e) => {
                view.error = Some(format!(
                    "{}: {}",
                    translation.get(TranslationKey::ImportError),
                    e
                ));
            }
            PreviewState::Ready(preview) => {
                view.raw_preview = Some(raw_preview(&preview.first_chunk));
                view.has_headers = preview.has_headers;
                match &preview.parse_warning {
                    Some(warning) => {
                        view.warning = Some(format!(
                            "{}: {}",
                            warning.message,
                            translation.get(TranslationKey::CheckDataFormatting)
                        ));
                    }
                    None => {
                        view.header_row = preview.header_row().map(|row| row.to_vec());
                        view.data_rows = preview.data_rows().to_vec();
                    }
                }
            }
        }
        view
    }

    pub fn frame(&self, translation: &Translation) -> FrameView {
        ImporterFrame::new(self.file.name(), translation)
            .back(true)
            .next(self.next_enabled())
            .build()
    }
}

/// 截取原始内容的前 RAW_PREVIEW_SIZE 个字符
fn raw_preview(chunk: &str) -> RawPreview {
    match chunk.char_indices().nth(RAW_PREVIEW_SIZE) {
        Some((cut, _)) => RawPreview {
            text: chunk[..cut].to_string(),
            has_more: true,
        },
        None => RawPreview {
            text: chunk.to_string(),
            has_more: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::file::MemoryFile;
    use crate::importer::error::{ParseWarning, ParseWarningKind};

    fn preview_of(text: &str, rows: Vec<Vec<&str>>) -> PreviewInfo {
        PreviewInfo {
            file: Arc::new(MemoryFile::from_text("data.csv", text)),
            has_headers: true,
            first_chunk: text.to_string(),
            is_single_line: rows.len() == 1,
            first_rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
            parse_warning: None,
            delimiter: b',',
        }
    }

    fn loading_screen(assume_no_headers: bool) -> FormatPreview {
        FormatPreview::loading(
            Arc::new(MemoryFile::from_text("data.csv", "a,b\n1,2\n")),
            assume_no_headers,
        )
    }

    #[test]
    fn test_loading_blocks_next() {
        let screen = loading_screen(false);
        assert!(screen.is_loading());
        assert!(!screen.next_enabled());
        assert!(screen.accept().is_err());

        let view = screen.view(&Translation::new());
        assert!(view.loading);
        assert!(view.pending_text.is_some());
        assert!(!screen.frame(&Translation::new()).next_enabled);
    }

    #[test]
    fn test_commit_seeds_has_headers() {
        let mut screen = loading_screen(false);
        let ticket = screen.ticket();
        assert!(screen.commit(&ticket, Ok(preview_of("a,b\n1,2\n", vec![vec!["a", "b"], vec!["1", "2"]]))));

        let accepted = screen.accept().unwrap();
        assert!(accepted.has_headers);

        let view = screen.view(&Translation::new());
        assert_eq!(view.header_row, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(view.data_rows, vec![vec!["1".to_string(), "2".to_string()]]);
        assert!(view.header_toggle_visible);
    }

    #[test]
    fn test_assume_no_headers_and_single_line() {
        let mut screen = loading_screen(true);
        let ticket = screen.ticket();
        screen.commit(&ticket, Ok(preview_of("a,b\n1,2\n", vec![vec!["a", "b"], vec!["1", "2"]])));
        assert!(!screen.accept().unwrap().has_headers);

        let mut single = loading_screen(false);
        let ticket = single.ticket();
        single.commit(&ticket, Ok(preview_of("a,b", vec![vec!["a", "b"]])));
        assert!(!single.accept().unwrap().has_headers);
        assert!(single.toggle_has_headers().is_err());
        assert!(!single.view(&Translation::new()).header_toggle_visible);
    }

    #[test]
    fn test_stale_commit_discarded() {
        let mut screen = loading_screen(false);
        let ticket = screen.ticket();
        screen.unmount();
        assert!(!screen.commit(&ticket, Err(PreviewError::EmptyFile)));
        assert!(screen.is_loading());
    }

    #[test]
    fn test_error_blocks_next() {
        let mut screen = loading_screen(false);
        let ticket = screen.ticket();
        screen.commit(&ticket, Err(PreviewError::MissingQuotes { row: 2 }));

        assert!(!screen.next_enabled());
        assert!(screen.accept().is_err());
        let view = screen.view(&Translation::new());
        assert!(view.error.is_some());
        assert!(view.raw_preview.is_none());
        // 返回仍然可用
        assert!(screen.frame(&Translation::new()).back_enabled);
    }

    #[test]
    fn test_warning_blocks_next_and_hides_rows() {
        let mut preview = preview_of("a,b\n1\n", vec![vec!["a", "b"], vec!["1"]]);
        preview.parse_warning = Some(ParseWarning {
            kind: ParseWarningKind::TooFewFields,
            row: 2,
            message: "Too few fields".to_string(),
        });

        let mut screen = loading_screen(false);
        let ticket = screen.ticket();
        screen.commit(&ticket, Ok(preview));

        assert!(!screen.next_enabled());
        assert!(screen.accept().is_err());
        assert!(screen.toggle_has_headers().is_err());

        let mut translation = Translation::new();
        translation.set(TranslationKey::CheckDataFormatting, "check it");
        let view = screen.view(&translation);
        assert_eq!(view.warning.as_deref(), Some("Too few fields: check it"));
        assert!(view.raw_preview.is_some());
        assert!(view.data_rows.is_empty());
    }

    #[test]
    fn test_toggle_and_edit_path() {
        let screen_preview = preview_of("a,b\n1,2\n", vec![vec!["a", "b"], vec!["1", "2"]]);
        let mut screen = FormatPreview::with_current(screen_preview);
        assert!(!screen.is_loading());

        assert!(!screen.toggle_has_headers().unwrap());
        let view = screen.view(&Translation::new());
        assert!(view.header_row.is_none());
        assert_eq!(view.data_rows.len(), 2);
        assert!(!screen.accept().unwrap().has_headers);

        // 编辑路径不接受迟到的加载结果
        let ticket = screen.ticket();
        assert!(!screen.commit(&ticket, Err(PreviewError::EmptyFile)));
    }

    #[test]
    fn test_raw_preview_truncates_by_chars() {
        let short = raw_preview("a,b\n");
        assert!(!short.has_more);

        let long: String = "é".repeat(RAW_PREVIEW_SIZE + 3);
        let cut = raw_preview(&long);
        assert!(cut.has_more);
        assert_eq!(cut.text.chars().count(), RAW_PREVIEW_SIZE);

        let exact: String = "x".repeat(RAW_PREVIEW_SIZE);
        assert!(!raw_preview(&exact).has_more);
    }
}
