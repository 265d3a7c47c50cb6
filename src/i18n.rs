// ==========================================
// 国际化 (i18n) 模块 - 界面文案表
// ==========================================
// 使用 rust-i18n 库，进程级默认文案
// 支持英文（默认）和中文
// 每个向导实例可覆盖任意文案
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    rust_i18n::set_locale(locale);
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use csv_import_wizard::i18n::t_with_args;
/// let msg = t_with_args("importer.fileRejected", &[("name", "data.xlsx")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// ==========================================
// 文案键
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TranslationKey {
    GoBack,
    Next,
    ImportError,
    RawFileContent,
    PreviewImport,
    DataHasHeaders,
    LoadingPreview,
    CheckDataFormatting,
    GoToPreviousStep,
    Import,
    UploadMore,
    Finish,
    CouldNotImport,
    Complete,
    Importing,
    ProcessedRows,
    DropCsvFilesHere,
    DropCsvFilesHereOrClick,
    SelectColumns,
    AssignAllRequiredFields,
    DragColumnHere,
    AssignColumn,
    ClearColumnAssignment,
    UnselectColumn,
    SelectColumnForAssignment,
    ShowPreviousColumns,
    AssigningColumns,
    Page,
    Of,
    ShowNextColumns,
    UnassignedFields,
    Column,
}

impl TranslationKey {
    pub const ALL: [TranslationKey; 32] = [
        TranslationKey::GoBack,
        TranslationKey::Next,
        TranslationKey::ImportError,
        TranslationKey::RawFileContent,
        TranslationKey::PreviewImport,
        TranslationKey::DataHasHeaders,
        TranslationKey::LoadingPreview,
        TranslationKey::CheckDataFormatting,
        TranslationKey::GoToPreviousStep,
        TranslationKey::Import,
        TranslationKey::UploadMore,
        TranslationKey::Finish,
        TranslationKey::CouldNotImport,
        TranslationKey::Complete,
        TranslationKey::Importing,
        TranslationKey::ProcessedRows,
        TranslationKey::DropCsvFilesHere,
        TranslationKey::DropCsvFilesHereOrClick,
        TranslationKey::SelectColumns,
        TranslationKey::AssignAllRequiredFields,
        TranslationKey::DragColumnHere,
        TranslationKey::AssignColumn,
        TranslationKey::ClearColumnAssignment,
        TranslationKey::UnselectColumn,
        TranslationKey::SelectColumnForAssignment,
        TranslationKey::ShowPreviousColumns,
        TranslationKey::AssigningColumns,
        TranslationKey::Page,
        TranslationKey::Of,
        TranslationKey::ShowNextColumns,
        TranslationKey::UnassignedFields,
        TranslationKey::Column,
    ];

    /// 覆盖表使用的键名
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationKey::GoBack => "goBack",
            TranslationKey::Next => "next",
            TranslationKey::ImportError => "importError",
            TranslationKey::RawFileContent => "rawFileContent",
            TranslationKey::PreviewImport => "previewImport",
            TranslationKey::DataHasHeaders => "dataHasHeaders",
            TranslationKey::LoadingPreview => "loadingPreview",
            TranslationKey::CheckDataFormatting => "checkDataFormatting",
            TranslationKey::GoToPreviousStep => "goToPreviousStep",
            TranslationKey::Import => "import",
            TranslationKey::UploadMore => "uploadMore",
            TranslationKey::Finish => "finish",
            TranslationKey::CouldNotImport => "couldNotImport",
            TranslationKey::Complete => "complete",
            TranslationKey::Importing => "importing",
            TranslationKey::ProcessedRows => "processedRows",
            TranslationKey::DropCsvFilesHere => "dropCsvFilesHere",
            TranslationKey::DropCsvFilesHereOrClick => "dropCsvFilesHereOrClick",
            TranslationKey::SelectColumns => "selectColumns",
            TranslationKey::AssignAllRequiredFields => "assignAllRequiredFields",
            TranslationKey::DragColumnHere => "dragColumnHere",
            TranslationKey::AssignColumn => "assignColumn",
            TranslationKey::ClearColumnAssignment => "clearColumnAssignment",
            TranslationKey::UnselectColumn => "unselectColumn",
            TranslationKey::SelectColumnForAssignment => "selectColumnForAssignment",
            TranslationKey::ShowPreviousColumns => "showPreviousColumns",
            TranslationKey::AssigningColumns => "assigningColumns",
            TranslationKey::Page => "page",
            TranslationKey::Of => "of",
            TranslationKey::ShowNextColumns => "showNextColumns",
            TranslationKey::UnassignedFields => "unassignedFields",
            TranslationKey::Column => "column",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.as_str() == s)
    }

    /// rust-i18n 中的完整键
    pub fn i18n_key(&self) -> String {
        format!("importer.{}", self.as_str())
    }
}

// ==========================================
// 实例级文案表
// ==========================================

/// 覆盖项优先，其余回落到进程级文案
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translation {
    overrides: HashMap<TranslationKey, String>,
}

impl Translation {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由配置中的覆盖表构建
    ///
    /// # 返回
    /// - Err(ConfigValueError): 存在未知文案键
    pub fn with_overrides(overrides: &HashMap<String, String>) -> ImportResult<Self> {
        let mut translation = Self::new();
        for (key, text) in overrides {
            let parsed = TranslationKey::from_str(key).ok_or_else(|| {
                ImportError::ConfigValueError {
                    key: format!("translations.{}", key),
                    value: text.clone(),
                    message: "未知文案键".to_string(),
                }
            })?;
            translation.set(parsed, text.clone());
        }
        Ok(translation)
    }

    pub fn set(&mut self, key: TranslationKey, text: impl Into<String>) {
        self.overrides.insert(key, text.into());
    }

    pub fn get(&self, key: TranslationKey) -> String {
        match self.overrides.get(&key) {
            Some(text) => text.clone(),
            None => t(&key.i18n_key()),
        }
    }
}
