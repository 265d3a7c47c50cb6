// ==========================================
// CSV 导入向导 - 页面框架
// ==========================================
// 除文件选择页外，每个步骤都包在同一框架中:
// 标题（文件名）、副标题、返回、下一步、次要按钮、错误提示
// ==========================================

use crate::i18n::{Translation, TranslationKey};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameView {
    pub title: String,
    pub subtitle: Option<String>,
    pub back_label: String,
    pub back_enabled: bool,
    pub next_label: String,
    pub next_enabled: bool,
    /// None 时不显示次要按钮
    pub secondary_label: Option<String>,
    pub secondary_enabled: bool,
    pub error: Option<String>,
}

/// FrameView 构建器
pub struct ImporterFrame {
    view: FrameView,
}

impl ImporterFrame {
    pub fn new(title: impl Into<String>, translation: &Translation) -> Self {
        Self {
            view: FrameView {
                title: title.into(),
                subtitle: None,
                back_label: translation.get(TranslationKey::GoToPreviousStep),
                back_enabled: false,
                next_label: translation.get(TranslationKey::Next),
                next_enabled: false,
                secondary_label: None,
                secondary_enabled: false,
                error: None,
            },
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.view.subtitle = Some(subtitle.into());
        self
    }

    pub fn back(mut self, enabled: bool) -> Self {
        self.view.back_enabled = enabled;
        self
    }

    pub fn next(mut self, enabled: bool) -> Self {
        self.view.next_enabled = enabled;
        self
    }

    pub fn next_label(mut self, label: impl Into<String>) -> Self {
        self.view.next_label = label.into();
        self
    }

    pub fn secondary(mut self, label: impl Into<String>, enabled: bool) -> Self {
        self.view.secondary_label = Some(label.into());
        self.view.secondary_enabled = enabled;
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.view.error = error;
        self
    }

    pub fn build(self) -> FrameView {
        self.view
    }
}
