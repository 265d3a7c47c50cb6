// ==========================================
// CSV 导入向导 - 渲染快照
// ==========================================
// 宿主界面只依赖本快照渲染，不直接读取向导内部状态
// ==========================================

use crate::wizard::column_picker::ColumnPickerView;
use crate::wizard::file_selector::FileSelectorView;
use crate::wizard::format_preview::FormatPreviewView;
use crate::wizard::frame::FrameView;
use crate::wizard::progress_display::{ProgressOutcome, ProgressView};
use crate::wizard::state::WizardStep;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenView {
    FileSelector(FileSelectorView),
    FormatPreview(FormatPreviewView),
    ColumnPicker(ColumnPickerView),
    Progress(ProgressView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WizardView {
    pub step: WizardStep,
    /// 状态版本号，每次状态变化递增
    pub revision: u64,
    /// 文件选择页没有框架
    pub frame: Option<FrameView>,
    pub screen: ScreenView,
}

impl WizardView {
    pub fn file_selector(&self) -> Option<&FileSelectorView> {
        match &self.screen {
            ScreenView::FileSelector(view) => Some(view),
            _ => None,
        }
    }

    pub fn format_preview(&self) -> Option<&FormatPreviewView> {
        match &self.screen {
            ScreenView::FormatPreview(view) => Some(view),
            _ => None,
        }
    }

    pub fn column_picker(&self) -> Option<&ColumnPickerView> {
        match &self.screen {
            ScreenView::ColumnPicker(view) => Some(view),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<&ProgressView> {
        match &self.screen {
            ScreenView::Progress(view) => Some(view),
            _ => None,
        }
    }

    /// 格式页已结束加载（成功、警告或错误）
    pub fn is_preview_settled(&self) -> bool {
        self.format_preview().map(|v| !v.loading).unwrap_or(false)
    }

    /// 进度页已结束（成功或失败）
    pub fn is_processing_finished(&self) -> bool {
        self.progress()
            .map(|v| v.outcome != ProgressOutcome::Running)
            .unwrap_or(false)
    }
}
